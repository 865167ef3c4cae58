//! Admin account directory.
//!
//! Admin accounts are a small fixed set loaded at startup, either from the
//! built-in seeds or from `YATRA_ADMIN_ACCOUNTS`. Plaintext passwords are
//! bcrypt-hashed during load and dropped, so only hashes live in memory.

use anyhow::{Context, Result};
use serde::Deserialize;

const BCRYPT_COST: u32 = 10;

#[derive(Deserialize)]
struct AdminSeed {
    id: i32,
    email: String,
    name: String,
    password: String,
}

#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub id: i32,
    pub email: String,
    pub name: String,
    password_hash: String,
}

pub struct AdminDirectory {
    accounts: Vec<AdminAccount>,
}

impl AdminDirectory {
    /// The default admin accounts used when no override is configured.
    ///
    /// # Errors
    /// Returns an error if hashing fails.
    pub fn builtin() -> Result<Self> {
        Self::from_seeds(vec![
            AdminSeed {
                id: 1,
                email: "gupta.rahul.hru@gmail.com".to_string(),
                name: "Rahul Gupta".to_string(),
                password: "Admin1-9525.com".to_string(),
            },
            AdminSeed {
                id: 2,
                email: "kumarravi69600@gmail.com".to_string(),
                name: "Ravi Kumar".to_string(),
                password: "Chudail@143".to_string(),
            },
        ])
    }

    /// Load admin accounts from a JSON array of `{id, email, name, password}`.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or a hashing failure.
    pub fn from_json(json: &str) -> Result<Self> {
        let seeds: Vec<AdminSeed> =
            serde_json::from_str(json).context("invalid admin accounts JSON")?;
        Self::from_seeds(seeds)
    }

    fn from_seeds(seeds: Vec<AdminSeed>) -> Result<Self> {
        let accounts = seeds
            .into_iter()
            .map(|seed| {
                let password_hash = bcrypt::hash(&seed.password, BCRYPT_COST)
                    .context("failed to hash admin password")?;
                Ok(AdminAccount {
                    id: seed.id,
                    email: seed.email.trim().to_lowercase(),
                    name: seed.name,
                    password_hash,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { accounts })
    }

    /// Check credentials against the directory.
    ///
    /// Returns the matching account, or `None` for an unknown email or a
    /// password that does not verify.
    #[must_use]
    pub fn verify(&self, email: &str, password: &str) -> Option<&AdminAccount> {
        let email = email.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|account| account.email == email)
            .filter(|account| bcrypt::verify(password, &account.password_hash).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_admin_verifies_with_seed_password() {
        let directory = AdminDirectory::builtin().expect("directory");
        let account = directory
            .verify("gupta.rahul.hru@gmail.com", "Admin1-9525.com")
            .expect("account");
        assert_eq!(account.id, 1);
        assert_eq!(account.name, "Rahul Gupta");
    }

    #[test]
    fn builtin_admin_rejects_other_passwords() {
        let directory = AdminDirectory::builtin().expect("directory");
        assert!(directory
            .verify("gupta.rahul.hru@gmail.com", "Admin1-9525")
            .is_none());
        assert!(directory
            .verify("gupta.rahul.hru@gmail.com", "Chudail@143")
            .is_none());
        assert!(directory.verify("gupta.rahul.hru@gmail.com", "").is_none());
    }

    #[test]
    fn unknown_email_is_rejected() {
        let directory = AdminDirectory::builtin().expect("directory");
        assert!(directory.verify("nobody@example.com", "Admin1-9525.com").is_none());
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let directory = AdminDirectory::builtin().expect("directory");
        assert!(directory
            .verify("  Gupta.Rahul.HRU@Gmail.com ", "Admin1-9525.com")
            .is_some());
    }

    #[test]
    fn from_json_loads_custom_accounts() {
        let directory = AdminDirectory::from_json(
            r#"[{"id": 7, "email": "ops@example.com", "name": "Ops", "password": "s3cret!"}]"#,
        )
        .expect("directory");
        let account = directory.verify("ops@example.com", "s3cret!").expect("account");
        assert_eq!(account.id, 7);
        assert!(directory.verify("ops@example.com", "wrong").is_none());
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        assert!(AdminDirectory::from_json("not json").is_err());
        assert!(AdminDirectory::from_json(r#"{"id": 1}"#).is_err());
    }
}
