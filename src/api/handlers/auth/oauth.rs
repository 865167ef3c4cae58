//! Social login (Google, Facebook, LinkedIn).
//!
//! The callback never hands the session token to the browser directly.
//! It stores the token against a hashed one-time code, redirects to the
//! frontend with the raw code, and the frontend swaps it for the token via
//! `POST /v1/auth/oauth/exchange` within 60 seconds.

use anyhow::{Context, Result};
use axum::{
    Extension, Json,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};
use url::Url;
use uuid::Uuid;

use super::identity;
use super::state::AuthState;
use super::storage::{self, NewUser, SignupOutcome};
use super::types::{MessageResponse, OauthExchangeRequest, TokenResponse, UserProfile};
use super::utils::{generate_handoff_code, hash_handoff_code, normalize_email};
use super::{error_response, missing_payload};
use crate::api::email::{self, template};

const BCRYPT_COST: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Google,
    Facebook,
    Linkedin,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Linkedin => "linkedin",
        }
    }

    fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "google" => Some(Self::Google),
            "facebook" => Some(Self::Facebook),
            "linkedin" => Some(Self::Linkedin),
            _ => None,
        }
    }
}

pub struct ProviderSettings {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    authorize_url: &'static str,
    token_url: &'static str,
    userinfo_url: &'static str,
    scope: &'static str,
}

impl ProviderSettings {
    #[must_use]
    pub fn google(client_id: String, client_secret: SecretString, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
            scope: "openid email profile",
        }
    }

    #[must_use]
    pub fn facebook(client_id: String, client_secret: SecretString, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            authorize_url: "https://www.facebook.com/v18.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v18.0/oauth/access_token",
            userinfo_url: "https://graph.facebook.com/me?fields=id,name,email",
            scope: "email public_profile",
        }
    }

    #[must_use]
    pub fn linkedin(client_id: String, client_secret: SecretString, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            authorize_url: "https://www.linkedin.com/oauth/v2/authorization",
            token_url: "https://www.linkedin.com/oauth/v2/accessToken",
            userinfo_url: "https://api.linkedin.com/v2/userinfo",
            scope: "openid profile email",
        }
    }

    fn authorize_redirect(&self, state: &str) -> Result<Url> {
        Url::parse_with_params(
            self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.scope),
                ("state", state),
            ],
        )
        .context("Failed to build authorize URL")
    }
}

#[derive(Default)]
pub struct OauthProviders {
    google: Option<ProviderSettings>,
    facebook: Option<ProviderSettings>,
    linkedin: Option<ProviderSettings>,
    client: reqwest::Client,
}

impl OauthProviders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Provider, settings: ProviderSettings) -> Self {
        match provider {
            Provider::Google => self.google = Some(settings),
            Provider::Facebook => self.facebook = Some(settings),
            Provider::Linkedin => self.linkedin = Some(settings),
        }
        self
    }

    fn get(&self, provider: Provider) -> Option<&ProviderSettings> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Facebook => self.facebook.as_ref(),
            Provider::Linkedin => self.linkedin.as_ref(),
        }
    }

    /// Exchange an authorization code and fetch the provider profile.
    async fn fetch_profile(
        &self,
        settings: &ProviderSettings,
        code: &str,
    ) -> Result<OauthProfile> {
        #[derive(Deserialize)]
        struct TokenExchange {
            access_token: String,
        }

        let exchange: TokenExchange = self
            .client
            .post(settings.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.expose_secret()),
                ("redirect_uri", settings.redirect_uri.as_str()),
            ])
            .send()
            .await
            .context("Token exchange request failed")?
            .error_for_status()
            .context("Token exchange rejected")?
            .json()
            .await
            .context("Malformed token exchange response")?;

        self.client
            .get(settings.userinfo_url)
            .bearer_auth(exchange.access_token)
            .send()
            .await
            .context("Userinfo request failed")?
            .error_for_status()
            .context("Userinfo rejected")?
            .json()
            .await
            .context("Malformed userinfo response")
    }
}

#[derive(Debug, Default, Deserialize)]
struct OauthProfile {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl OauthProfile {
    /// Split a display name into first/last, preferring the OIDC fields.
    fn split_name(&self) -> (String, String) {
        if let Some(given) = &self.given_name {
            return (
                given.clone(),
                self.family_name.clone().unwrap_or_default(),
            );
        }
        let full = self.name.clone().unwrap_or_default();
        match full.split_once(' ') {
            Some((first, rest)) => (first.to_string(), rest.to_string()),
            None => (full, String::new()),
        }
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/auth/{provider}",
    params(("provider" = String, Path, description = "google, facebook, or linkedin")),
    responses(
        (status = 307, description = "Redirect to the provider's consent screen"),
        (status = 404, description = "Unknown or unconfigured provider"),
    ),
    tag = "auth"
)]
pub async fn oauth_redirect(
    Extension(state): Extension<Arc<AuthState>>,
    Path(provider): Path<String>,
) -> impl IntoResponse {
    let Some(provider) = Provider::from_path(&provider) else {
        return error_response(StatusCode::NOT_FOUND, "Unknown provider");
    };
    let Some(settings) = state.oauth.get(provider) else {
        return error_response(StatusCode::NOT_FOUND, "Provider not configured");
    };

    let csrf_state = Uuid::new_v4().to_string();
    let url = match settings.authorize_redirect(&csrf_state) {
        Ok(url) => url,
        Err(err) => {
            error!("Failed to build authorize URL: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "OAuth unavailable");
        }
    };

    state.oauth_states.insert(csrf_state, provider).await;
    Redirect::temporary(url.as_str()).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/auth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "google, facebook, or linkedin"),
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "CSRF state from the redirect"),
    ),
    responses(
        (status = 303, description = "Redirect to the frontend with a one-time code"),
        (status = 400, description = "Missing code or unknown state", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn oauth_callback(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let Some(provider) = Provider::from_path(&provider) else {
        return error_response(StatusCode::NOT_FOUND, "Unknown provider");
    };
    let Some(settings) = state.oauth.get(provider) else {
        return error_response(StatusCode::NOT_FOUND, "Provider not configured");
    };

    let (Some(code), Some(csrf_state)) = (query.code, query.state) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing code or state");
    };
    if state.oauth_states.take(&csrf_state).await != Some(provider) {
        return error_response(StatusCode::BAD_REQUEST, "Unknown or expired state");
    }

    let profile = match state.oauth.fetch_profile(settings, &code).await {
        Ok(profile) => profile,
        Err(err) => {
            error!("OAuth exchange with {} failed: {err}", provider.as_str());
            return error_response(StatusCode::BAD_GATEWAY, "OAuth provider error");
        }
    };

    let Some(email) = profile.email.as_deref().map(normalize_email) else {
        return error_response(StatusCode::BAD_REQUEST, "Provider returned no email");
    };

    let user = match find_or_provision(&pool, &email, &profile).await {
        Ok(user) => user,
        Err(err) => {
            error!("OAuth provisioning failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    let token = match state
        .tokens
        .issue_user(user.id, &user.email, &user.user_id, &user.first_name)
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    let handoff_code = match generate_handoff_code() {
        Ok(code) => code,
        Err(err) => {
            error!("Failed to generate handoff code: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };
    state
        .handoff
        .insert(hash_handoff_code(&handoff_code), token)
        .await;

    let destination = format!(
        "{}/oauth/callback?code={handoff_code}",
        state.config.frontend_base_url().trim_end_matches('/')
    );
    Redirect::to(&destination).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/oauth/exchange",
    request_body = OauthExchangeRequest,
    responses(
        (status = 200, description = "Session token for a valid one-time code", body = TokenResponse),
        (status = 400, description = "Invalid or expired code", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn oauth_exchange(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<OauthExchangeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match state.handoff.take(&hash_handoff_code(&request.code)).await {
        Some(token) => (
            StatusCode::OK,
            Json(TokenResponse {
                message: "Login successful".to_string(),
                token,
            }),
        )
            .into_response(),
        None => error_response(StatusCode::BAD_REQUEST, "Invalid or expired code"),
    }
}

/// Look up the account for a provider email, creating it on first login.
///
/// New accounts get a generated user id and temporary password, a verified
/// email, and no phone on record. A concurrent first login resolves through
/// the unique index; the loser re-reads the winner's row.
async fn find_or_provision(
    pool: &PgPool,
    email: &str,
    profile: &OauthProfile,
) -> Result<UserProfile> {
    if let Some(existing) = storage::find_by_email(pool, email).await? {
        return Ok(existing);
    }

    let (first_name, last_name) = profile.split_name();
    let user_id = identity::generate_user_id(pool, &first_name)
        .await
        .context("Failed to allocate user id")?;
    let temp_password = identity::generate_temp_password();
    let password_hash =
        bcrypt::hash(&temp_password, BCRYPT_COST).context("Failed to hash password")?;

    let new_user = NewUser {
        user_id,
        email: email.to_string(),
        phone: None,
        password_hash,
        first_name,
        last_name,
        dob: None,
        bio: None,
        email_verified: true,
        phone_verified: false,
    };

    match storage::create_user(pool, &new_user).await? {
        SignupOutcome::Created(profile) => {
            if let Err(err) = email::enqueue(
                pool,
                &profile.email,
                template::CREDENTIALS,
                &json!({
                    "user_id": profile.user_id,
                    "temp_password": temp_password,
                }),
            )
            .await
            {
                warn!("Failed to enqueue credentials email: {err}");
            }
            Ok(profile)
        }
        SignupOutcome::Conflict => storage::find_by_email(pool, email)
            .await?
            .context("Account vanished after conflicting signup"),
    }
}
