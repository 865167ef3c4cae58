//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, channels, oauth};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let channel_opts = channels::Options::parse(matches)?;
    let oauth_opts = oauth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        frontend_base_url: auth_opts.frontend_base_url,
        contact_email: auth_opts.contact_email,
        admin_accounts_json: auth_opts.admin_accounts_json,
        demo_otp: auth_opts.demo_otp,
        email_outbox_poll_seconds: channel_opts.outbox.poll_seconds,
        email_outbox_batch_size: channel_opts.outbox.batch_size,
        email_outbox_max_attempts: channel_opts.outbox.max_attempts,
        email_outbox_backoff_base_seconds: channel_opts.outbox.backoff_base_seconds,
        email_outbox_backoff_max_seconds: channel_opts.outbox.backoff_max_seconds,
        twilio: channel_opts.twilio,
        google: oauth_opts.google,
        facebook: oauth_opts.facebook,
        linkedin: oauth_opts.linkedin,
    }))
}
