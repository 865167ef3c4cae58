//! Postgres access for account rows and activity logs.
//!
//! Uniqueness of `user_id`, `email`, and `phone` is enforced by unique
//! indexes; `create_user` maps SQLSTATE 23505 to a conflict outcome so
//! concurrent duplicate signups resolve to exactly one created row.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::types::UserProfile;
use super::utils::is_unique_violation;

pub(crate) struct NewUser {
    pub user_id: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,
    pub bio: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
}

pub(crate) enum SignupOutcome {
    Created(UserProfile),
    Conflict,
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserWithSecret {
    #[sqlx(flatten)]
    pub profile: UserProfile,
    pub password_hash: String,
}

/// Check whether a candidate user id is already taken.
pub(crate) async fn user_id_exists(pool: &PgPool, user_id: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );

    sqlx::query_scalar::<_, bool>(query)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("Failed to check user id")
}

/// Check whether an email, normalized phone, or chosen user id already
/// belongs to an account.
pub(crate) async fn contact_taken(
    pool: &PgPool,
    email: &str,
    phone: Option<&str>,
    user_id: Option<&str>,
) -> Result<bool> {
    let query =
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR phone = $2 OR user_id = $3)";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );

    sqlx::query_scalar::<_, bool>(query)
        .bind(email)
        .bind(phone)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("Failed to check contact uniqueness")
}

/// Insert a user together with its SIGNUP activity row.
///
/// The insert and the activity log commit atomically; a unique violation on
/// any of the identity columns rolls the transaction back and reports
/// `Conflict`.
pub(crate) async fn create_user(pool: &PgPool, user: &NewUser) -> Result<SignupOutcome> {
    let insert = "INSERT INTO users \
         (user_id, email, phone, password_hash, first_name, last_name, dob, bio, \
          email_verified, phone_verified) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id, user_id, email, phone, first_name, last_name, dob, bio, \
          email_verified, phone_verified, created_at";

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = insert
    );

    let created = sqlx::query_as::<_, UserProfile>(insert)
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.dob)
        .bind(&user.bio)
        .bind(user.email_verified)
        .bind(user.phone_verified)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let profile = match created {
        Ok(profile) => profile,
        Err(err) if is_unique_violation(&err) => return Ok(SignupOutcome::Conflict),
        Err(err) => return Err(err).context("Failed to insert user"),
    };

    let activity = "INSERT INTO activity_logs (user_id, activity_type, activity_description) \
         VALUES ($1, $2, $3)";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = activity
    );

    sqlx::query(activity)
        .bind(profile.id)
        .bind("SIGNUP")
        .bind(format!("Account created for {}", profile.email))
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("Failed to record signup activity")?;

    tx.commit().await.context("Failed to commit signup")?;

    Ok(SignupOutcome::Created(profile))
}

/// Find an active account by email or assigned user id, with its hash.
pub(crate) async fn lookup_for_login(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<UserWithSecret>> {
    let query = "SELECT id, user_id, email, phone, first_name, last_name, dob, bio, \
          email_verified, phone_verified, created_at, password_hash \
         FROM users WHERE is_active AND (email = $1 OR user_id = $2)";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );

    sqlx::query_as::<_, UserWithSecret>(query)
        .bind(identifier.trim().to_lowercase())
        .bind(identifier.trim())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("Failed to look up user")
}

/// Find an active account by normalized email.
pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserProfile>> {
    let query = "SELECT id, user_id, email, phone, first_name, last_name, dob, bio, \
          email_verified, phone_verified, created_at \
         FROM users WHERE is_active AND email = $1";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );

    sqlx::query_as::<_, UserProfile>(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("Failed to look up user by email")
}

/// Append a row to a user's activity log.
pub(crate) async fn record_activity(
    pool: &PgPool,
    user_id: Uuid,
    activity_type: &str,
    description: &str,
) -> Result<()> {
    let query = "INSERT INTO activity_logs (user_id, activity_type, activity_description) \
         VALUES ($1, $2, $3)";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    sqlx::query(query)
        .bind(user_id)
        .bind(activity_type)
        .bind(description)
        .execute(pool)
        .instrument(span)
        .await
        .context("Failed to record activity")?;

    Ok(())
}

/// Append a row to the admin activity log.
pub(crate) async fn record_admin_activity(
    pool: &PgPool,
    admin_id: i32,
    activity_type: &str,
    description: &str,
) -> Result<()> {
    let query = "INSERT INTO admin_activity_logs (admin_id, activity_type, activity_description) \
         VALUES ($1, $2, $3)";

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    sqlx::query(query)
        .bind(admin_id)
        .bind(activity_type)
        .bind(description)
        .execute(pool)
        .instrument(span)
        .await
        .context("Failed to record admin activity")?;

    Ok(())
}
