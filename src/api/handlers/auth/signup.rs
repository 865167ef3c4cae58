//! Account creation endpoints.
//!
//! Both variants demand a verified email and phone in the OTP ledger, then
//! create the user row and its SIGNUP activity log atomically. The unique
//! indexes are the final word under concurrency: of two racing duplicate
//! signups exactly one commits, the other observes a conflict.

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::identity::{self, IdentityError};
use super::state::AuthState;
use super::storage::{self, NewUser, SignupOutcome};
use super::types::{AuthResponse, AutoSignupRequest, AutoSignupResponse, SignupRequest};
use super::utils::{normalize_email, normalize_phone, valid_email};
use super::{error_response, missing_payload};
use crate::api::email::{self, template};

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 8;

struct ValidatedContact {
    email: String,
    phone: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation, unverified OTP, or duplicate account"),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if request.password.len() < MIN_PASSWORD_LEN {
        return error_response(StatusCode::BAD_REQUEST, "Password too short");
    }

    // The caller picks the handle here; only auto-signup mints one.
    let user_id = request.user_id.trim().to_string();
    if user_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "User id is required");
    }

    let contact = match validate_contact(&state, &request.first_name, &request.email, &request.phone).await {
        Ok(contact) => contact,
        Err(response) => return response,
    };

    if let Err(response) = reject_taken_contact(&pool, &contact, Some(&user_id)).await {
        return response;
    }

    let Ok(password_hash) = bcrypt::hash(&request.password, BCRYPT_COST) else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed");
    };

    let new_user = NewUser {
        user_id,
        email: contact.email.clone(),
        phone: Some(contact.phone.clone()),
        password_hash,
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.unwrap_or_default().trim().to_string(),
        dob: request.dob,
        bio: request.bio,
        email_verified: true,
        phone_verified: true,
    };

    let profile = match storage::create_user(&pool, &new_user).await {
        Ok(SignupOutcome::Created(profile)) => profile,
        Ok(SignupOutcome::Conflict) => {
            return error_response(StatusCode::BAD_REQUEST, "Account already exists");
        }
        Err(err) => {
            error!("Signup failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed");
        }
    };

    state.ledger.consume(&contact.email).await;
    state.ledger.consume(&contact.phone).await;

    let token = match state
        .tokens
        .issue_user(profile.id, &profile.email, &profile.user_id, &profile.first_name)
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed");
        }
    };

    (
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Signup successful".to_string(),
            token,
            user: profile,
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/auto-signup",
    request_body = AutoSignupRequest,
    responses(
        (status = 201, description = "Account created with generated credentials", body = AutoSignupResponse),
        (status = 400, description = "Validation, unverified OTP, or duplicate account"),
    ),
    tag = "auth"
)]
pub async fn auto_signup(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<AutoSignupRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let contact = match validate_contact(&state, &request.first_name, &request.email, &request.phone).await {
        Ok(contact) => contact,
        Err(response) => return response,
    };

    if let Err(response) = reject_taken_contact(&pool, &contact, None).await {
        return response;
    }

    let user_id = match identity::generate_user_id(&pool, &request.first_name).await {
        Ok(user_id) => user_id,
        Err(err) => return id_generation_failure(&err),
    };

    let temp_password = identity::generate_temp_password();
    let Ok(password_hash) = bcrypt::hash(&temp_password, BCRYPT_COST) else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed");
    };

    let new_user = NewUser {
        user_id,
        email: contact.email.clone(),
        phone: Some(contact.phone.clone()),
        password_hash,
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.unwrap_or_default().trim().to_string(),
        dob: request.dob,
        bio: request.bio,
        email_verified: true,
        phone_verified: true,
    };

    let profile = match storage::create_user(&pool, &new_user).await {
        Ok(SignupOutcome::Created(profile)) => profile,
        Ok(SignupOutcome::Conflict) => {
            return error_response(StatusCode::BAD_REQUEST, "Account already exists");
        }
        Err(err) => {
            error!("Auto-signup failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed");
        }
    };

    state.ledger.consume(&contact.email).await;
    state.ledger.consume(&contact.phone).await;

    // The account exists either way; a failed enqueue only flips the flag.
    let email_sent = match email::enqueue(
        &pool,
        &profile.email,
        template::CREDENTIALS,
        &json!({
            "user_id": profile.user_id,
            "temp_password": temp_password,
        }),
    )
    .await
    {
        Ok(()) => true,
        Err(err) => {
            warn!("Failed to enqueue credentials email: {err}");
            false
        }
    };

    let token = match state
        .tokens
        .issue_user(profile.id, &profile.email, &profile.user_id, &profile.first_name)
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed");
        }
    };

    (
        StatusCode::CREATED,
        Json(AutoSignupResponse {
            message: "Signup successful".to_string(),
            token,
            user: profile,
            email_sent,
        }),
    )
        .into_response()
}

/// Normalize and validate the contact fields, then require both OTP targets
/// to be verified. Returns a ready error response on any failure.
async fn validate_contact(
    state: &AuthState,
    first_name: &str,
    email: &str,
    phone: &str,
) -> Result<ValidatedContact, axum::response::Response> {
    if first_name.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "First name is required"));
    }

    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid email address"));
    }

    let Some(phone) = normalize_phone(phone) else {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid phone number"));
    };

    if !state.ledger.is_verified(&email).await {
        return Err(error_response(StatusCode::BAD_REQUEST, "Email not verified"));
    }
    if !state.ledger.is_verified(&phone).await {
        return Err(error_response(StatusCode::BAD_REQUEST, "Phone not verified"));
    }

    Ok(ValidatedContact { email, phone })
}

/// Early duplicate check before the expensive work. The unique indexes still
/// decide the race in `create_user`.
async fn reject_taken_contact(
    pool: &PgPool,
    contact: &ValidatedContact,
    user_id: Option<&str>,
) -> Result<(), axum::response::Response> {
    match storage::contact_taken(pool, &contact.email, Some(&contact.phone), user_id).await {
        Ok(false) => Ok(()),
        Ok(true) => Err(error_response(
            StatusCode::BAD_REQUEST,
            "Account already exists",
        )),
        Err(err) => {
            error!("Failed to check existing accounts: {err}");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signup failed",
            ))
        }
    }
}

fn id_generation_failure(err: &IdentityError) -> axum::response::Response {
    error!("User id generation failed: {err}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::ledger::OtpPurpose;
    use crate::api::handlers::auth::test_support::{auth_state, lazy_pool};

    #[tokio::test]
    async fn signup_rejects_missing_payload() {
        let state = Arc::new(auth_state());
        let response = signup(Extension(state), Extension(lazy_pool()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_rejects_short_password() {
        let state = Arc::new(auth_state());
        let response = signup(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(SignupRequest {
                first_name: "Asha".to_string(),
                last_name: None,
                email: "asha@example.com".to_string(),
                phone: "5551230000".to_string(),
                user_id: "asha_travels".to_string(),
                dob: None,
                bio: None,
                password: "short".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_requires_verified_email() {
        let state = Arc::new(auth_state());
        let response = signup(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(SignupRequest {
                first_name: "Asha".to_string(),
                last_name: None,
                email: "asha@example.com".to_string(),
                phone: "5551230000".to_string(),
                user_id: "asha_travels".to_string(),
                dob: None,
                bio: None,
                password: "longenough".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_rejects_blank_user_id() {
        let state = Arc::new(auth_state());
        let response = signup(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(SignupRequest {
                first_name: "Asha".to_string(),
                last_name: None,
                email: "asha@example.com".to_string(),
                phone: "5551230000".to_string(),
                user_id: "   ".to_string(),
                dob: None,
                bio: None,
                password: "longenough".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn auto_signup_requires_verified_phone() {
        let state = Arc::new(auth_state());

        // Email target verified, phone left untouched.
        let code = state
            .ledger
            .issue("asha@example.com", OtpPurpose::Email)
            .await;
        state
            .ledger
            .verify("asha@example.com", &code)
            .await
            .expect("verify");

        let response = auto_signup(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(AutoSignupRequest {
                first_name: "Asha".to_string(),
                last_name: None,
                email: "asha@example.com".to_string(),
                phone: "5551230000".to_string(),
                dob: None,
                bio: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
