use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_JWT_SECRET: &str = "jwt-secret";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long("jwt-secret")
                .help("Secret used to sign session tokens")
                .env("YATRA_JWT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("YATRA_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("otp-ttl-seconds")
                .long("otp-ttl-seconds")
                .help("OTP code TTL in seconds")
                .env("YATRA_OTP_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used for CORS and OAuth redirects")
                .env("YATRA_FRONTEND_BASE_URL")
                .default_value("https://yatra.dev"),
        )
        .arg(
            Arg::new("contact-email")
                .long("contact-email")
                .help("Address that receives contact form notifications")
                .env("YATRA_CONTACT_EMAIL")
                .default_value("admin@yatra.dev"),
        )
        .arg(
            Arg::new("admin-accounts")
                .long("admin-accounts")
                .help("JSON list of admin accounts [{id, email, name, password}]")
                .env("YATRA_ADMIN_ACCOUNTS"),
        )
        .arg(
            Arg::new("demo-otp")
                .long("demo-otp")
                .help("Echo OTP codes in responses when no real delivery channel is configured")
                .env("YATRA_DEMO_OTP")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub otp_ttl_seconds: u64,
    pub frontend_base_url: String,
    pub contact_email: String,
    pub admin_accounts_json: Option<String>,
    pub demo_otp: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if required arguments are missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            jwt_secret: matches
                .get_one::<String>(ARG_JWT_SECRET)
                .cloned()
                .context("missing required argument: --jwt-secret")?,
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
            otp_ttl_seconds: matches
                .get_one::<u64>("otp-ttl-seconds")
                .copied()
                .unwrap_or(300),
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .unwrap_or_else(|| "https://yatra.dev".to_string()),
            contact_email: matches
                .get_one::<String>("contact-email")
                .cloned()
                .unwrap_or_else(|| "admin@yatra.dev".to_string()),
            admin_accounts_json: matches.get_one::<String>("admin-accounts").cloned(),
            demo_otp: matches.get_one::<bool>("demo-otp").copied().unwrap_or(true),
        })
    }
}
