use crate::{
    api,
    api::{
        handlers::auth::{AdminDirectory, AuthConfig, OauthProviders, Provider, ProviderSettings},
        sms::SmsChannel,
    },
    cli::commands::{channels::TwilioOptions, oauth::ProviderOptions},
};
use anyhow::{Context, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub otp_ttl_seconds: u64,
    pub frontend_base_url: String,
    pub contact_email: String,
    pub admin_accounts_json: Option<String>,
    pub demo_otp: bool,
    pub email_outbox_poll_seconds: u64,
    pub email_outbox_batch_size: usize,
    pub email_outbox_max_attempts: u32,
    pub email_outbox_backoff_base_seconds: u64,
    pub email_outbox_backoff_max_seconds: u64,
    pub twilio: Option<TwilioOptions>,
    pub google: Option<ProviderOptions>,
    pub facebook: Option<ProviderOptions>,
    pub linkedin: Option<ProviderOptions>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(
        args.frontend_base_url,
        SecretString::from(args.jwt_secret),
    )
    .with_session_ttl_seconds(args.session_ttl_seconds)
    .with_otp_ttl_seconds(args.otp_ttl_seconds)
    .with_contact_email(args.contact_email)
    .with_demo_otp(args.demo_otp);

    // Admin accounts are hashed at load time; plaintext never survives startup.
    let admins = match args.admin_accounts_json.as_deref() {
        Some(json) => AdminDirectory::from_json(json).context("invalid --admin-accounts JSON")?,
        None => AdminDirectory::builtin().context("failed to hash builtin admin accounts")?,
    };

    let sms = match args.twilio {
        Some(twilio) => SmsChannel::twilio(
            twilio.account_sid,
            SecretString::from(twilio.auth_token),
            twilio.from,
        ),
        None => SmsChannel::log(),
    };

    let mut oauth = OauthProviders::new();
    if let Some(google) = args.google {
        oauth = oauth.with_provider(
            Provider::Google,
            ProviderSettings::google(
                google.client_id,
                SecretString::from(google.client_secret),
                google.redirect_uri,
            ),
        );
    }
    if let Some(facebook) = args.facebook {
        oauth = oauth.with_provider(
            Provider::Facebook,
            ProviderSettings::facebook(
                facebook.client_id,
                SecretString::from(facebook.client_secret),
                facebook.redirect_uri,
            ),
        );
    }
    if let Some(linkedin) = args.linkedin {
        oauth = oauth.with_provider(
            Provider::Linkedin,
            ProviderSettings::linkedin(
                linkedin.client_id,
                SecretString::from(linkedin.client_secret),
                linkedin.redirect_uri,
            ),
        );
    }

    let email_config = api::email::EmailWorkerConfig::new()
        .with_poll_interval_seconds(args.email_outbox_poll_seconds)
        .with_batch_size(args.email_outbox_batch_size)
        .with_max_attempts(args.email_outbox_max_attempts)
        .with_backoff_base_seconds(args.email_outbox_backoff_base_seconds)
        .with_backoff_max_seconds(args.email_outbox_backoff_max_seconds);

    api::new(
        args.port,
        args.dsn,
        auth_config,
        admins,
        sms,
        oauth,
        email_config,
    )
    .await
}
