//! Stateless session tokens (HS256 JWT).
//!
//! Tokens carry the account kind so admin routes can be gated without a
//! second lookup. There is no revocation list; logout is a client-side
//! discard and the 7 day expiry bounds exposure.

use axum::http::{HeaderMap, StatusCode};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::utils::extract_bearer_token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Session has expired")]
    Expired,
    #[error("Invalid session token")]
    Invalid,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    User,
    Admin,
}

/// Claims carried by every session token.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct SessionClaims {
    pub sub: String,
    pub kind: TokenKind,
    pub email: String,
    pub user_id: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &SecretString, issuer: String, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            issuer,
            ttl_seconds,
        }
    }

    /// Issue a token for a regular account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_user(
        &self,
        subject: Uuid,
        email: &str,
        user_id: &str,
        name: &str,
    ) -> anyhow::Result<String> {
        self.issue(subject.to_string(), TokenKind::User, email, user_id, name)
    }

    /// Issue a token for an admin account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_admin(&self, admin_id: i32, email: &str, name: &str) -> anyhow::Result<String> {
        self.issue(
            admin_id.to_string(),
            TokenKind::Admin,
            email,
            &format!("ADMIN_{admin_id}"),
            name,
        )
    }

    fn issue(
        &self,
        sub: String,
        kind: TokenKind,
        email: &str,
        user_id: &str,
        name: &str,
    ) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub,
            kind,
            email: email.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            exp: now.timestamp() + self.ttl_seconds,
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// Returns `Expired` for a past `exp`, `Invalid` for anything else.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Authenticate any account kind from the Authorization header.
///
/// # Errors
/// Returns a ready-to-send 401 response tuple.
pub fn require_session(
    headers: &HeaderMap,
    tokens: &TokenIssuer,
) -> Result<SessionClaims, (StatusCode, String)> {
    let token = extract_bearer_token(headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Missing token".to_string()))?;
    tokens
        .verify(token)
        .map_err(|err| (StatusCode::UNAUTHORIZED, err.to_string()))
}

/// Authenticate and require an admin token.
///
/// # Errors
/// Returns 401 for a bad token and 403 for a non-admin one.
pub fn require_admin(
    headers: &HeaderMap,
    tokens: &TokenIssuer,
) -> Result<SessionClaims, (StatusCode, String)> {
    let claims = require_session(headers, tokens)?;
    if claims.kind != TokenKind::Admin {
        return Err((StatusCode::FORBIDDEN, "Admin access required".to_string()));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};

    const WEEK: i64 = 7 * 24 * 60 * 60;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("test-secret".to_string()),
            "yatra".to_string(),
            WEEK,
        )
    }

    #[test]
    fn user_token_round_trips() {
        let tokens = issuer();
        let subject = Uuid::new_v4();
        let token = tokens
            .issue_user(subject, "asha@example.com", "ASH_K2M7Q_0042", "Asha")
            .expect("token");

        let claims = tokens.verify(&token).expect("claims");
        assert_eq!(claims.sub, subject.to_string());
        assert_eq!(claims.kind, TokenKind::User);
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.user_id, "ASH_K2M7Q_0042");
        assert_eq!(claims.iss, "yatra");
        assert_eq!(claims.exp - claims.iat, WEEK);
    }

    #[test]
    fn admin_token_carries_kind() {
        let tokens = issuer();
        let token = tokens
            .issue_admin(1, "admin@example.com", "Admin")
            .expect("token");
        let claims = tokens.verify(&token).expect("claims");
        assert_eq!(claims.kind, TokenKind::Admin);
        assert_eq!(claims.sub, "1");
    }

    #[test]
    fn wrong_secret_rejected() {
        let tokens = issuer();
        let other = TokenIssuer::new(
            &SecretString::from("other-secret".to_string()),
            "yatra".to_string(),
            WEEK,
        );
        let token = tokens
            .issue_user(Uuid::new_v4(), "a@example.com", "AAA_AAAAA_0001", "A")
            .expect("token");
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_issuer_rejected() {
        let tokens = issuer();
        let other = TokenIssuer::new(
            &SecretString::from("test-secret".to_string()),
            "someone-else".to_string(),
            WEEK,
        );
        let token = other
            .issue_user(Uuid::new_v4(), "a@example.com", "AAA_AAAAA_0001", "A")
            .expect("token");
        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_rejected() {
        // Negative TTL puts exp in the past immediately.
        let tokens = TokenIssuer::new(
            &SecretString::from("test-secret".to_string()),
            "yatra".to_string(),
            -120,
        );
        let token = tokens
            .issue_user(Uuid::new_v4(), "a@example.com", "AAA_AAAAA_0001", "A")
            .expect("token");
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_token_rejected() {
        assert_eq!(issuer().verify("not.a.token"), Err(TokenError::Invalid));
    }

    #[test]
    fn require_admin_rejects_user_tokens() {
        let tokens = issuer();
        let token = tokens
            .issue_user(Uuid::new_v4(), "a@example.com", "AAA_AAAAA_0001", "A")
            .expect("token");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );
        let result = require_admin(&headers, &tokens);
        assert_eq!(result.map(|_| ()), Err((StatusCode::FORBIDDEN, "Admin access required".to_string())));
    }

    #[test]
    fn require_session_without_header_is_401() {
        let tokens = issuer();
        let result = require_session(&HeaderMap::new(), &tokens);
        assert_eq!(
            result.map(|_| ()),
            Err((StatusCode::UNAUTHORIZED, "Missing token".to_string()))
        );
    }
}
