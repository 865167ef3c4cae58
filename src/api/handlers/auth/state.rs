//! Shared auth state injected into handlers via `Extension<Arc<AuthState>>`.

use secrecy::SecretString;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::admin::AdminDirectory;
use super::ledger::OtpLedger;
use super::oauth::{OauthProviders, Provider};
use super::token::TokenIssuer;
use crate::api::sms::SmsChannel;

const TOKEN_ISSUER: &str = "yatra";
const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_OTP_TTL_SECONDS: u64 = 300;
const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);
const HANDOFF_TTL: Duration = Duration::from_secs(60);

pub struct AuthConfig {
    frontend_base_url: String,
    jwt_secret: SecretString,
    session_ttl_seconds: i64,
    otp_ttl_seconds: u64,
    contact_email: String,
    demo_otp: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, jwt_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            jwt_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            contact_email: String::new(),
            demo_otp: true,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: u64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_contact_email(mut self, email: String) -> Self {
        self.contact_email = email;
        self
    }

    #[must_use]
    pub fn with_demo_otp(mut self, demo_otp: bool) -> Self {
        self.demo_otp = demo_otp;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    /// Echo OTP codes in API responses when no real SMS transport exists.
    #[must_use]
    pub fn demo_otp(&self) -> bool {
        self.demo_otp
    }
}

/// One-shot TTL store for OAuth `state` values (CSRF protection).
pub(crate) struct OauthStateStore {
    entries: Mutex<HashMap<String, (Provider, Instant)>>,
}

impl OauthStateStore {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn insert(&self, state: String, provider: Provider) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, created)| created.elapsed() < OAUTH_STATE_TTL);
        entries.insert(state, (provider, Instant::now()));
    }

    /// Remove and return the provider for a state value, if still live.
    pub(crate) async fn take(&self, state: &str) -> Option<Provider> {
        let mut entries = self.entries.lock().await;
        let (provider, created) = entries.remove(state)?;
        (created.elapsed() < OAUTH_STATE_TTL).then_some(provider)
    }
}

/// One-shot TTL store mapping hashed handoff codes to issued session tokens.
///
/// The raw code travels in the browser redirect; only its hash is kept here
/// until the frontend exchanges it.
pub(crate) struct HandoffStore {
    entries: Mutex<HashMap<Vec<u8>, (String, Instant)>>,
}

impl HandoffStore {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn insert(&self, code_hash: Vec<u8>, token: String) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, created)| created.elapsed() < HANDOFF_TTL);
        entries.insert(code_hash, (token, Instant::now()));
    }

    /// Remove and return the token for a hashed code, if still live.
    pub(crate) async fn take(&self, code_hash: &[u8]) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let (token, created) = entries.remove(code_hash)?;
        (created.elapsed() < HANDOFF_TTL).then_some(token)
    }
}

pub struct AuthState {
    pub(crate) config: AuthConfig,
    pub(crate) ledger: OtpLedger,
    pub(crate) tokens: TokenIssuer,
    pub(crate) admins: AdminDirectory,
    pub(crate) sms: SmsChannel,
    pub(crate) oauth: OauthProviders,
    pub(crate) oauth_states: OauthStateStore,
    pub(crate) handoff: HandoffStore,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        admins: AdminDirectory,
        sms: SmsChannel,
        oauth: OauthProviders,
    ) -> Self {
        let ledger = OtpLedger::new(Duration::from_secs(config.otp_ttl_seconds));
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            TOKEN_ISSUER.to_string(),
            config.session_ttl_seconds,
        );

        Self {
            config,
            ledger,
            tokens,
            admins,
            sms,
            oauth,
            oauth_states: OauthStateStore::new(),
            handoff: HandoffStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AuthConfig::new(
            "https://yatra.dev".to_string(),
            SecretString::from("secret".to_string()),
        );
        assert_eq!(config.session_ttl_seconds, DEFAULT_SESSION_TTL_SECONDS);
        assert_eq!(config.otp_ttl_seconds, DEFAULT_OTP_TTL_SECONDS);
        assert!(config.demo_otp());
        assert_eq!(config.frontend_base_url(), "https://yatra.dev");
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = AuthConfig::new(
            "https://yatra.dev".to_string(),
            SecretString::from("secret".to_string()),
        )
        .with_session_ttl_seconds(3600)
        .with_otp_ttl_seconds(120)
        .with_contact_email("ops@yatra.dev".to_string())
        .with_demo_otp(false);

        assert_eq!(config.session_ttl_seconds, 3600);
        assert_eq!(config.otp_ttl_seconds, 120);
        assert_eq!(config.contact_email(), "ops@yatra.dev");
        assert!(!config.demo_otp());
    }

    #[tokio::test]
    async fn oauth_state_is_single_use() {
        let store = OauthStateStore::new();
        store.insert("abc".to_string(), Provider::Google).await;
        assert_eq!(store.take("abc").await, Some(Provider::Google));
        assert_eq!(store.take("abc").await, None);
    }

    #[tokio::test]
    async fn unknown_oauth_state_is_rejected() {
        let store = OauthStateStore::new();
        assert_eq!(store.take("missing").await, None);
    }

    #[tokio::test]
    async fn handoff_code_is_single_use() {
        let store = HandoffStore::new();
        store.insert(vec![1, 2, 3], "token".to_string()).await;
        assert_eq!(store.take(&[1, 2, 3]).await, Some("token".to_string()));
        assert_eq!(store.take(&[1, 2, 3]).await, None);
    }
}
