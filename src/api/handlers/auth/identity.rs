//! Human-readable user id and temporary password generation.

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};
use sqlx::PgPool;
use thiserror::Error;

use super::storage;

const USER_ID_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const USER_ID_CODE_LEN: usize = 5;
const USER_ID_MAX_ATTEMPTS: usize = 100;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*";
const TEMP_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("exhausted user id candidates after {USER_ID_MAX_ATTEMPTS} attempts")]
    Exhausted,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Allocate a unique identifier of the form `ABC_X7K2M_1234`.
///
/// The prefix comes from the first name (padded with `X` when short), the
/// middle is a random code, and the suffix is derived from the clock. Each
/// candidate is checked against existing accounts; the unique index on
/// `users.user_id` remains the final arbiter under concurrency.
///
/// # Errors
/// Returns `Exhausted` after too many collisions, or a storage error.
pub async fn generate_user_id(pool: &PgPool, first_name: &str) -> Result<String, IdentityError> {
    let prefix = name_prefix(first_name);

    for _ in 0..USER_ID_MAX_ATTEMPTS {
        let candidate = format!("{prefix}_{}_{}", random_code(), clock_suffix());
        if !storage::user_id_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }

    Err(IdentityError::Exhausted)
}

/// First three letters of the name, uppercased and `X`-padded.
fn name_prefix(first_name: &str) -> String {
    let mut prefix: String = first_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    prefix
}

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..USER_ID_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..USER_ID_CODE_ALPHABET.len());
            char::from(USER_ID_CODE_ALPHABET[idx])
        })
        .collect()
}

fn clock_suffix() -> String {
    let millis = Utc::now().timestamp_millis();
    format!("{:04}", millis.rem_euclid(10_000))
}

/// Generate an eight character temporary password containing at least one
/// uppercase letter, lowercase letter, digit, and symbol.
#[must_use]
pub fn generate_temp_password() -> String {
    let mut rng = rand::thread_rng();
    let mut chars: Vec<u8> = vec![
        UPPER[rng.gen_range(0..UPPER.len())],
        LOWER[rng.gen_range(0..LOWER.len())],
        DIGITS[rng.gen_range(0..DIGITS.len())],
        SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
    ];

    let pool: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();
    while chars.len() < TEMP_PASSWORD_LEN {
        chars.push(pool[rng.gen_range(0..pool.len())]);
    }

    // Shuffle so the class of each position is unpredictable.
    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn name_prefix_uppercases_and_pads() {
        assert_eq!(name_prefix("Asha"), "ASH");
        assert_eq!(name_prefix("bo"), "BOX");
        assert_eq!(name_prefix(""), "XXX");
        assert_eq!(name_prefix("a1b2c3"), "ABC");
    }

    #[test]
    fn random_code_shape() {
        for _ in 0..50 {
            let code = random_code();
            assert_eq!(code.len(), USER_ID_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn clock_suffix_is_four_digits() {
        let suffix = clock_suffix();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn candidate_matches_public_pattern() {
        let pattern = Regex::new(r"^[A-Z]{3}_[A-Z0-9]{5}_[0-9]+$").expect("valid regex");
        for name in ["Asha", "bo", "", "رحل"] {
            let candidate = format!("{}_{}_{}", name_prefix(name), random_code(), clock_suffix());
            assert!(pattern.is_match(&candidate), "bad candidate: {candidate}");
        }
    }

    #[test]
    fn temp_password_covers_all_classes() {
        for _ in 0..100 {
            let password = generate_temp_password();
            assert_eq!(password.len(), TEMP_PASSWORD_LEN);
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.chars().any(|c| SYMBOLS.contains(&(c as u8))));
        }
    }

    #[test]
    fn temp_passwords_vary() {
        let first = generate_temp_password();
        let any_different = (0..10).any(|_| generate_temp_password() != first);
        assert!(any_different);
    }
}
