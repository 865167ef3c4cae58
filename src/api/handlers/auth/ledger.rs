//! In-process OTP ledger keyed by contact target.
//!
//! At most one live code exists per normalized email or phone number.
//! Expiry is checked lazily when the entry is touched; stale entries are
//! swept on insert so the map cannot grow past the set of recent targets.

use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("No OTP was requested for this target")]
    NotFound,
    #[error("OTP has expired")]
    Expired,
    #[error("Invalid OTP")]
    Mismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpPurpose {
    Email,
    Phone,
}

struct OtpEntry {
    code: String,
    purpose: OtpPurpose,
    verified: bool,
    expires_at: Instant,
}

impl OtpEntry {
    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct OtpLedger {
    ttl: Duration,
    entries: Mutex<HashMap<String, OtpEntry>>,
}

impl OtpLedger {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh six digit code for the target, replacing any prior entry.
    pub async fn issue(&self, target: &str, purpose: OtpPurpose) -> String {
        let code = generate_code();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.is_live());
        entries.insert(
            target.to_string(),
            OtpEntry {
                code: code.clone(),
                purpose,
                verified: false,
                expires_at: Instant::now() + self.ttl,
            },
        );
        code
    }

    /// Reuse the unexpired code for the target, or mint a new one.
    ///
    /// Either way the TTL window restarts, matching what a user expects
    /// from a "resend" button.
    pub async fn resend(&self, target: &str, purpose: OtpPurpose) -> String {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(target) {
            if entry.is_live() && entry.purpose == purpose {
                entry.expires_at = Instant::now() + self.ttl;
                return entry.code.clone();
            }
        }
        let code = generate_code();
        entries.insert(
            target.to_string(),
            OtpEntry {
                code: code.clone(),
                purpose,
                verified: false,
                expires_at: Instant::now() + self.ttl,
            },
        );
        code
    }

    /// Check a supplied code and mark the entry verified on match.
    ///
    /// Verification is idempotent while the entry is live: repeating the
    /// call with the same code keeps returning `Ok`.
    ///
    /// # Errors
    /// Returns `NotFound`, `Expired`, or `Mismatch`; a mismatch never
    /// flips the verified flag.
    pub async fn verify(&self, target: &str, supplied: &str) -> Result<(), OtpError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(target).ok_or(OtpError::NotFound)?;
        if !entry.is_live() {
            entries.remove(target);
            return Err(OtpError::Expired);
        }
        if entry.code != supplied.trim() {
            return Err(OtpError::Mismatch);
        }
        entry.verified = true;
        Ok(())
    }

    /// True when the target holds a live, verified entry.
    pub async fn is_verified(&self, target: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(target)
            .is_some_and(|entry| entry.verified && entry.is_live())
    }

    /// Drop the entry once signup completes so the code cannot be replayed.
    pub async fn consume(&self, target: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(target);
    }

    #[cfg(test)]
    async fn expire(&self, target: &str) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(target) {
            entry.expires_at = Instant::now();
        }
    }
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> OtpLedger {
        OtpLedger::new(Duration::from_secs(300))
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn issue_then_verify_succeeds() {
        let ledger = ledger();
        let code = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        assert!(ledger.verify("asha@example.com", &code).await.is_ok());
        assert!(ledger.is_verified("asha@example.com").await);
    }

    #[tokio::test]
    async fn verify_is_idempotent_while_live() {
        let ledger = ledger();
        let code = ledger.issue("5551230000", OtpPurpose::Phone).await;
        assert!(ledger.verify("5551230000", &code).await.is_ok());
        assert!(ledger.verify("5551230000", &code).await.is_ok());
        assert!(ledger.is_verified("5551230000").await);
    }

    #[tokio::test]
    async fn mismatch_does_not_mark_verified() {
        let ledger = ledger();
        let code = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert_eq!(
            ledger.verify("asha@example.com", wrong).await,
            Err(OtpError::Mismatch)
        );
        assert!(!ledger.is_verified("asha@example.com").await);
        // The right code still works afterwards.
        assert!(ledger.verify("asha@example.com", &code).await.is_ok());
    }

    #[tokio::test]
    async fn verify_unknown_target_is_not_found() {
        let ledger = ledger();
        assert_eq!(
            ledger.verify("nobody@example.com", "123456").await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn expired_entry_is_rejected_and_removed() {
        let ledger = ledger();
        let code = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        ledger.expire("asha@example.com").await;
        assert_eq!(
            ledger.verify("asha@example.com", &code).await,
            Err(OtpError::Expired)
        );
        // Second attempt sees no entry at all.
        assert_eq!(
            ledger.verify("asha@example.com", &code).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn expired_verified_entry_is_not_verified() {
        let ledger = ledger();
        let code = ledger.issue("5551230000", OtpPurpose::Phone).await;
        assert!(ledger.verify("5551230000", &code).await.is_ok());
        ledger.expire("5551230000").await;
        assert!(!ledger.is_verified("5551230000").await);
    }

    #[tokio::test]
    async fn resend_reuses_live_code() {
        let ledger = ledger();
        let code = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        let resent = ledger.resend("asha@example.com", OtpPurpose::Email).await;
        assert_eq!(code, resent);
        assert!(ledger.verify("asha@example.com", &resent).await.is_ok());
    }

    #[tokio::test]
    async fn resend_mints_new_code_when_expired() {
        let ledger = ledger();
        let _ = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        ledger.expire("asha@example.com").await;
        let resent = ledger.resend("asha@example.com", OtpPurpose::Email).await;
        // The fresh entry is live and unverified until checked.
        assert!(!ledger.is_verified("asha@example.com").await);
        assert!(ledger.verify("asha@example.com", &resent).await.is_ok());
    }

    #[tokio::test]
    async fn resend_for_missing_target_issues() {
        let ledger = ledger();
        let code = ledger.resend("new@example.com", OtpPurpose::Email).await;
        assert!(ledger.verify("new@example.com", &code).await.is_ok());
    }

    #[tokio::test]
    async fn consume_removes_entry() {
        let ledger = ledger();
        let code = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        assert!(ledger.verify("asha@example.com", &code).await.is_ok());
        ledger.consume("asha@example.com").await;
        assert!(!ledger.is_verified("asha@example.com").await);
        assert_eq!(
            ledger.verify("asha@example.com", &code).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn reissue_replaces_code_and_clears_verified() {
        let ledger = ledger();
        let first = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        assert!(ledger.verify("asha@example.com", &first).await.is_ok());
        let second = ledger.issue("asha@example.com", OtpPurpose::Email).await;
        assert!(!ledger.is_verified("asha@example.com").await);
        if first != second {
            assert_eq!(
                ledger.verify("asha@example.com", &first).await,
                Err(OtpError::Mismatch)
            );
        }
    }
}
