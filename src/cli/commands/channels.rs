use anyhow::Result;
use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_outbox_args(command);
    with_twilio_args(command)
}

fn with_outbox_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("email-outbox-poll-seconds")
                .long("email-outbox-poll-seconds")
                .help("Email outbox poll interval in seconds")
                .env("YATRA_EMAIL_OUTBOX_POLL_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("email-outbox-batch-size")
                .long("email-outbox-batch-size")
                .help("Email outbox batch size per poll")
                .env("YATRA_EMAIL_OUTBOX_BATCH_SIZE")
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("email-outbox-max-attempts")
                .long("email-outbox-max-attempts")
                .help("Max attempts before marking an email as failed")
                .env("YATRA_EMAIL_OUTBOX_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("email-outbox-backoff-base-seconds")
                .long("email-outbox-backoff-base-seconds")
                .help("Base delay for email outbox retry backoff")
                .env("YATRA_EMAIL_OUTBOX_BACKOFF_BASE_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("email-outbox-backoff-max-seconds")
                .long("email-outbox-backoff-max-seconds")
                .help("Max delay for email outbox retry backoff")
                .env("YATRA_EMAIL_OUTBOX_BACKOFF_MAX_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_twilio_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("twilio-account-sid")
                .long("twilio-account-sid")
                .help("Twilio account SID for SMS delivery")
                .env("YATRA_TWILIO_ACCOUNT_SID"),
        )
        .arg(
            Arg::new("twilio-auth-token")
                .long("twilio-auth-token")
                .help("Twilio auth token")
                .env("YATRA_TWILIO_AUTH_TOKEN"),
        )
        .arg(
            Arg::new("twilio-from")
                .long("twilio-from")
                .help("Twilio sender phone number")
                .env("YATRA_TWILIO_FROM"),
        )
}

#[derive(Debug)]
pub struct OutboxOptions {
    pub poll_seconds: u64,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub backoff_base_seconds: u64,
    pub backoff_max_seconds: u64,
}

#[derive(Debug)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
}

#[derive(Debug)]
pub struct Options {
    pub outbox: OutboxOptions,
    pub twilio: Option<TwilioOptions>,
}

impl Options {
    /// # Errors
    /// Returns an error if the Twilio arguments are only partially provided.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let outbox = OutboxOptions {
            poll_seconds: matches
                .get_one::<u64>("email-outbox-poll-seconds")
                .copied()
                .unwrap_or(5),
            batch_size: matches
                .get_one::<usize>("email-outbox-batch-size")
                .copied()
                .unwrap_or(10),
            max_attempts: matches
                .get_one::<u32>("email-outbox-max-attempts")
                .copied()
                .unwrap_or(5),
            backoff_base_seconds: matches
                .get_one::<u64>("email-outbox-backoff-base-seconds")
                .copied()
                .unwrap_or(5),
            backoff_max_seconds: matches
                .get_one::<u64>("email-outbox-backoff-max-seconds")
                .copied()
                .unwrap_or(300),
        };

        let account_sid = matches.get_one::<String>("twilio-account-sid").cloned();
        let auth_token = matches.get_one::<String>("twilio-auth-token").cloned();
        let from = matches.get_one::<String>("twilio-from").cloned();

        let twilio = match (account_sid, auth_token, from) {
            (Some(account_sid), Some(auth_token), Some(from)) => Some(TwilioOptions {
                account_sid,
                auth_token,
                from,
            }),
            (None, None, None) => None,
            _ => anyhow::bail!(
                "Twilio requires --twilio-account-sid, --twilio-auth-token and --twilio-from"
            ),
        };

        Ok(Self { outbox, twilio })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_twilio_args_rejected() {
        temp_env::with_vars(
            [
                ("YATRA_TWILIO_ACCOUNT_SID", Some("AC123")),
                ("YATRA_TWILIO_AUTH_TOKEN", None::<&str>),
                ("YATRA_TWILIO_FROM", None::<&str>),
                ("YATRA_DSN", Some("postgres://localhost/yatra")),
                ("YATRA_JWT_SECRET", Some("sekret")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["yatra"]);
                assert!(Options::parse(&matches).is_err());
            },
        );
    }

    #[test]
    fn full_twilio_args_accepted() {
        temp_env::with_vars(
            [
                ("YATRA_TWILIO_ACCOUNT_SID", Some("AC123")),
                ("YATRA_TWILIO_AUTH_TOKEN", Some("token")),
                ("YATRA_TWILIO_FROM", Some("+15555550100")),
                ("YATRA_DSN", Some("postgres://localhost/yatra")),
                ("YATRA_JWT_SECRET", Some("sekret")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["yatra"]);
                let options = Options::parse(&matches);
                assert!(options.is_ok_and(|options| options.twilio.is_some()));
            },
        );
    }
}
