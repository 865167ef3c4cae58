//! Public contact form.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::types::MessageResponse;
use super::auth::utils::{normalize_email, valid_email};
use super::auth::{AuthState, error_response, missing_payload};
use crate::api::email::{self, template};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/v1/contact/submit",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Query recorded and notification queued", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields"),
    ),
    tag = "contact"
)]
pub async fn submit(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<ContactRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if request.name.trim().is_empty()
        || request.subject.trim().is_empty()
        || request.message.trim().is_empty()
    {
        return error_response(StatusCode::BAD_REQUEST, "All fields are required");
    }
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email address");
    }

    // The row and the admin notification commit together.
    let result = async {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO contact_queries (name, email, phone, subject, message) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(request.name.trim())
        .bind(&email)
        .bind(&request.phone)
        .bind(request.subject.trim())
        .bind(request.message.trim())
        .execute(&mut *tx)
        .await?;

        email::enqueue_tx(
            &mut tx,
            state.config.contact_email(),
            template::CONTACT_NOTIFICATION,
            &json!({
                "name": request.name.trim(),
                "email": email,
                "subject": request.subject.trim(),
            }),
        )
        .await?;

        tx.commit().await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    match result {
        Ok(()) => (
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "Thanks for reaching out, we will get back to you".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to record contact query: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to submit query")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, lazy_pool};

    #[tokio::test]
    async fn submit_rejects_missing_payload() {
        let state = Arc::new(auth_state());
        let response = submit(Extension(state), Extension(lazy_pool()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_rejects_blank_fields() {
        let state = Arc::new(auth_state());
        let response = submit(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(ContactRequest {
                name: " ".to_string(),
                email: "asha@example.com".to_string(),
                phone: None,
                subject: "Trip help".to_string(),
                message: "Hello".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_rejects_bad_email() {
        let state = Arc::new(auth_state());
        let response = submit(
            Extension(state),
            Extension(lazy_pool()),
            Some(Json(ContactRequest {
                name: "Asha".to_string(),
                email: "not-an-email".to_string(),
                phone: None,
                subject: "Trip help".to_string(),
                message: "Hello".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
