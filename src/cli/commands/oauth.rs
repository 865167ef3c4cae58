use anyhow::Result;
use clap::{Arg, Command};

const PROVIDERS: [&str; 3] = ["google", "facebook", "linkedin"];

pub fn with_args(mut command: Command) -> Command {
    for provider in PROVIDERS {
        let env_prefix = provider.to_uppercase();
        command = command
            .arg(
                Arg::new(format!("{provider}-client-id"))
                    .long(format!("{provider}-client-id"))
                    .help(format!("OAuth client id for {provider}"))
                    .env(format!("YATRA_{env_prefix}_CLIENT_ID")),
            )
            .arg(
                Arg::new(format!("{provider}-client-secret"))
                    .long(format!("{provider}-client-secret"))
                    .help(format!("OAuth client secret for {provider}"))
                    .env(format!("YATRA_{env_prefix}_CLIENT_SECRET")),
            )
            .arg(
                Arg::new(format!("{provider}-redirect-uri"))
                    .long(format!("{provider}-redirect-uri"))
                    .help(format!("OAuth redirect URI registered for {provider}"))
                    .env(format!("YATRA_{env_prefix}_REDIRECT_URI")),
            );
    }
    command
}

#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Default)]
pub struct Options {
    pub google: Option<ProviderOptions>,
    pub facebook: Option<ProviderOptions>,
    pub linkedin: Option<ProviderOptions>,
}

impl Options {
    /// # Errors
    /// Returns an error if a provider's credentials are only partially provided.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            google: parse_provider(matches, "google")?,
            facebook: parse_provider(matches, "facebook")?,
            linkedin: parse_provider(matches, "linkedin")?,
        })
    }
}

fn parse_provider(matches: &clap::ArgMatches, provider: &str) -> Result<Option<ProviderOptions>> {
    let client_id = matches
        .get_one::<String>(&format!("{provider}-client-id"))
        .cloned();
    let client_secret = matches
        .get_one::<String>(&format!("{provider}-client-secret"))
        .cloned();
    let redirect_uri = matches
        .get_one::<String>(&format!("{provider}-redirect-uri"))
        .cloned();

    match (client_id, client_secret, redirect_uri) {
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(Some(ProviderOptions {
            client_id,
            client_secret,
            redirect_uri,
        })),
        (None, None, None) => Ok(None),
        _ => anyhow::bail!(
            "OAuth provider {provider} requires client-id, client-secret and redirect-uri"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_provider_args_yield_none() {
        temp_env::with_vars(
            [
                ("YATRA_DSN", Some("postgres://localhost/yatra")),
                ("YATRA_JWT_SECRET", Some("sekret")),
                ("YATRA_GOOGLE_CLIENT_ID", None::<&str>),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["yatra"]);
                let options = Options::parse(&matches);
                assert!(options.is_ok_and(|options| options.google.is_none()));
            },
        );
    }

    #[test]
    fn full_provider_args_parse() {
        temp_env::with_vars(
            [
                ("YATRA_DSN", Some("postgres://localhost/yatra")),
                ("YATRA_JWT_SECRET", Some("sekret")),
                ("YATRA_GOOGLE_CLIENT_ID", Some("client")),
                ("YATRA_GOOGLE_CLIENT_SECRET", Some("secret")),
                (
                    "YATRA_GOOGLE_REDIRECT_URI",
                    Some("https://api.yatra.dev/v1/auth/oauth/google/callback"),
                ),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["yatra"]);
                let options = Options::parse(&matches);
                assert!(options.is_ok_and(|options| options.google.is_some()));
            },
        );
    }

    #[test]
    fn partial_provider_args_rejected() {
        temp_env::with_vars(
            [
                ("YATRA_DSN", Some("postgres://localhost/yatra")),
                ("YATRA_JWT_SECRET", Some("sekret")),
                ("YATRA_LINKEDIN_CLIENT_ID", Some("client")),
                ("YATRA_LINKEDIN_CLIENT_SECRET", None::<&str>),
                ("YATRA_LINKEDIN_REDIRECT_URI", None::<&str>),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["yatra"]);
                assert!(Options::parse(&matches).is_err());
            },
        );
    }
}
