//! # Yatra (Travel Blogging Platform API)
//!
//! `yatra` is the backend API for a travel blogging platform. It handles
//! OTP-verified signup, password and OAuth login, posts with likes and
//! comments, user profiles and analytics, and an admin dashboard.
//!
//! ## Identity Model
//!
//! - **User IDs:** Every account gets a human-readable identifier of the form
//!   `ABC_X7K2M_1234` derived from the first name, a random code, and a
//!   numeric suffix. Database rows use opaque UUIDs.
//! - **Verification:** Signup requires both an email and a phone OTP to be
//!   verified server-side before any account row is written.
//! - **Sessions:** Stateless HS256 JWTs with a 7 day lifetime. Logout is a
//!   client-side token discard.
//!
//! ## Delivery
//!
//! Outbound email goes through a transactional outbox table polled by a
//! background worker. SMS delivery uses Twilio when configured and falls back
//! to a logging stub otherwise; in that demo mode the OTP endpoints echo the
//! code back so flows remain testable without providers.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
