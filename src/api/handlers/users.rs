//! User profile endpoints.
//!
//! Updates and deletion are restricted to the account owner; profiles and
//! public posts are readable by any signed-in user.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::types::{MessageResponse, UserProfile};
use super::auth::{AuthState, error_response, missing_payload, require_user};
use super::posts::Post;

const USER_POSTS_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserAnalytics {
    pub total_posts: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_shares: i64,
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 404, description = "Unknown or deactivated user"),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = require_user(&headers, &state) {
        return response;
    }

    let found = sqlx::query_as::<_, UserProfile>(
        "SELECT id, user_id, email, phone, first_name, last_name, dob, bio, \
           email_verified, phone_verified, created_at \
         FROM users WHERE id = $1 AND is_active",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await;

    match found {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to load user: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load user")
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Not the account owner"),
    ),
    tag = "users"
)]
pub async fn update_user(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Option<Json<UpdateUserRequest>>,
) -> impl IntoResponse {
    let (_claims, caller) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if caller != id {
        return error_response(StatusCode::FORBIDDEN, "Not the account owner");
    }
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let updated = sqlx::query_as::<_, UserProfile>(
        "UPDATE users SET \
           first_name = COALESCE($2, first_name), \
           last_name = COALESCE($3, last_name), \
           dob = COALESCE($4, dob), \
           bio = COALESCE($5, bio) \
         WHERE id = $1 AND is_active \
         RETURNING id, user_id, email, phone, first_name, last_name, dob, bio, \
           email_verified, phone_verified, created_at",
    )
    .bind(id)
    .bind(&request.first_name)
    .bind(&request.last_name)
    .bind(request.dob)
    .bind(&request.bio)
    .fetch_optional(&pool)
    .await;

    match updated {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to update user: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update user")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deactivated", body = MessageResponse),
        (status = 403, description = "Not the account owner"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (_claims, caller) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if caller != id {
        return error_response(StatusCode::FORBIDDEN, "Not the account owner");
    }

    // Soft delete keeps rows for posts, likes, and logs.
    let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1 AND is_active")
        .bind(id)
        .execute(&pool)
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() > 0 => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Account deactivated".to_string(),
            }),
        )
            .into_response(),
        Ok(_) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to deactivate user: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to deactivate user")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/posts",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's public posts, newest first", body = [Post]),
    ),
    tag = "users"
)]
pub async fn user_posts(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (_claims, caller) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };

    // Owners see their private posts too.
    let include_private = caller == id;
    let posts = sqlx::query_as::<_, Post>(
        "SELECT id, user_id, title, description, content, featured_image, \
           visibility, seo_title, seo_description, view_count, created_at, updated_at \
         FROM posts \
         WHERE user_id = $1 AND NOT is_deleted \
           AND (visibility = 'public' OR $2) \
         ORDER BY created_at DESC \
         LIMIT $3",
    )
    .bind(id)
    .bind(include_private)
    .bind(USER_POSTS_LIMIT)
    .fetch_all(&pool)
    .await;

    match posts {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(err) => {
            error!("Failed to load user posts: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load posts")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/analytics",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Aggregate engagement for the user's posts", body = UserAnalytics),
        (status = 403, description = "Not the account owner"),
    ),
    tag = "users"
)]
pub async fn user_analytics(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (_claims, caller) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if caller != id {
        return error_response(StatusCode::FORBIDDEN, "Not the account owner");
    }

    let analytics = sqlx::query_as::<_, UserAnalytics>(
        "SELECT \
           COUNT(*) AS total_posts, \
           COALESCE(SUM(p.view_count), 0)::BIGINT AS total_views, \
           (SELECT COUNT(*) FROM likes l \
              JOIN posts lp ON lp.id = l.post_id \
              WHERE lp.user_id = $1 AND NOT lp.is_deleted) AS total_likes, \
           (SELECT COUNT(*) FROM comments c \
              JOIN posts cp ON cp.id = c.post_id \
              WHERE cp.user_id = $1 AND NOT cp.is_deleted AND NOT c.is_deleted) \
             AS total_comments, \
           (SELECT COUNT(*) FROM shares s \
              JOIN posts sp ON sp.id = s.post_id \
              WHERE sp.user_id = $1 AND NOT sp.is_deleted) AS total_shares \
         FROM posts p \
         WHERE p.user_id = $1 AND NOT p.is_deleted",
    )
    .bind(id)
    .fetch_one(&pool)
    .await;

    match analytics {
        Ok(analytics) => (StatusCode::OK, Json(analytics)).into_response(),
        Err(err) => {
            error!("Failed to load analytics: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load analytics")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, lazy_pool};

    #[tokio::test]
    async fn get_user_requires_a_session() {
        let state = Arc::new(auth_state());
        let response = get_user(
            Extension(state),
            Extension(lazy_pool()),
            HeaderMap::new(),
            Path(Uuid::new_v4()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_other_account_is_forbidden() {
        let state = Arc::new(auth_state());
        let caller = Uuid::new_v4();
        let token = state
            .tokens
            .issue_user(caller, "asha@example.com", "ASH_K2M7Q_0042", "Asha")
            .expect("token");

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().expect("header"),
        );

        let response = update_user(
            Extension(state),
            Extension(lazy_pool()),
            headers,
            Path(Uuid::new_v4()),
            Some(Json(UpdateUserRequest {
                first_name: Some("Asha".to_string()),
                last_name: None,
                dob: None,
                bio: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn analytics_for_other_account_is_forbidden() {
        let state = Arc::new(auth_state());
        let caller = Uuid::new_v4();
        let token = state
            .tokens
            .issue_user(caller, "asha@example.com", "ASH_K2M7Q_0042", "Asha")
            .expect("token");

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().expect("header"),
        );

        let response = user_analytics(
            Extension(state),
            Extension(lazy_pool()),
            headers,
            Path(Uuid::new_v4()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
