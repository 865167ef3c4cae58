//! Credential login endpoints.
//!
//! An unknown identifier and a wrong password return the same 401 so the
//! response does not leak which accounts exist.

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::state::AuthState;
use super::storage;
use super::types::{
    AdminAuthResponse, AdminLoginRequest, AdminProfile, AuthResponse, LoginRequest,
    MessageResponse,
};
use super::{error_response, missing_payload};

#[utoipa::path(
    post,
    path = "/v1/auth/user-login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn user_login(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let found = match storage::lookup_for_login(&pool, &request.identifier).await {
        Ok(found) => found,
        Err(err) => {
            error!("Login lookup failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    let Some(user) = found else {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    if !bcrypt::verify(&request.password, &user.password_hash).unwrap_or(false) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let profile = user.profile;
    if let Err(err) =
        storage::record_activity(&pool, profile.id, "LOGIN", "Signed in with password").await
    {
        warn!("Failed to record login activity: {err}");
    }

    let token = match state
        .tokens
        .issue_user(profile.id, &profile.email, &profile.user_id, &profile.first_name)
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    (
        StatusCode::OK,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            token,
            user: profile,
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/admin-login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin session token issued", body = AdminAuthResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn admin_login(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<AdminLoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let Some(account) = state.admins.verify(&request.email, &request.password) else {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    if let Err(err) =
        storage::record_admin_activity(&pool, account.id, "LOGIN", "Admin signed in").await
    {
        warn!("Failed to record admin activity: {err}");
    }

    let token = match state.tokens.issue_admin(account.id, &account.email, &account.name) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue admin token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    (
        StatusCode::OK,
        Json(AdminAuthResponse {
            message: "Login successful".to_string(),
            token,
            admin: AdminProfile {
                id: account.id,
                email: account.email.clone(),
                name: account.name.clone(),
            },
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session ended client-side", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    // Tokens are stateless; the client discards its copy.
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, lazy_pool};

    #[tokio::test]
    async fn user_login_rejects_missing_payload() {
        let state = Arc::new(auth_state());
        let response = user_login(Extension(state), Extension(lazy_pool()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_login_rejects_wrong_password() {
        let state = Arc::new(auth_state());
        let response = admin_login(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(AdminLoginRequest {
                email: "gupta.rahul.hru@gmail.com".to_string(),
                password: "wrong-password".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_login_rejects_unknown_email() {
        let state = Arc::new(auth_state());
        let response = admin_login(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(AdminLoginRequest {
                email: "nobody@example.com".to_string(),
                password: "Admin1-9525.com".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_is_ok() {
        let response = logout().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
