//! Admin dashboard endpoints. Every route demands an admin token.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::types::{MessageResponse, UserProfile};
use super::auth::{AuthState, error_response, missing_payload, require_admin, storage};
use super::posts::Post;

const LIST_LIMIT: i64 = 100;
const TOP_POSTS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct DashboardOverview {
    pub total_users: i64,
    pub active_users: i64,
    pub total_posts: i64,
    pub new_contact_queries: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct DailySignups {
    pub day: NaiveDate,
    pub signups: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAnalytics {
    /// Signups per day over the trailing week, oldest first.
    pub growth: Vec<DailySignups>,
    pub top_posts: Vec<Post>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ContactQuery {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub activity_description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminCreatePostRequest {
    /// Author account the post is published under.
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/admin/dashboard/overview",
    responses(
        (status = 200, description = "Platform counters", body = DashboardOverview),
        (status = 401, description = "Not an admin session"),
    ),
    tag = "admin"
)]
pub async fn dashboard_overview(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &state) {
        return response;
    }

    let overview = sqlx::query_as::<_, DashboardOverview>(
        "SELECT \
           (SELECT COUNT(*) FROM users) AS total_users, \
           (SELECT COUNT(*) FROM users WHERE is_active) AS active_users, \
           (SELECT COUNT(*) FROM posts WHERE NOT is_deleted) AS total_posts, \
           (SELECT COUNT(*) FROM contact_queries WHERE status = 'new') \
             AS new_contact_queries",
    )
    .fetch_one(&pool)
    .await;

    match overview {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(err) => {
            error!("Failed to load overview: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load overview")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/admin/users",
    params(("search" = Option<String>, Query, description = "Match against email, user id, or first name")),
    responses(
        (status = 200, description = "Accounts, newest first", body = [UserProfile]),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &state) {
        return response;
    }

    let pattern = query
        .search
        .as_deref()
        .map(|term| format!("%{}%", term.trim()));

    let users = sqlx::query_as::<_, UserProfile>(
        "SELECT id, user_id, email, phone, first_name, last_name, dob, bio, \
           email_verified, phone_verified, created_at \
         FROM users \
         WHERE $1::TEXT IS NULL \
           OR email ILIKE $1 OR user_id ILIKE $1 OR first_name ILIKE $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(pattern)
    .bind(LIST_LIMIT)
    .fetch_all(&pool)
    .await;

    match users {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(err) => {
            error!("Failed to list users: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list users")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deactivated", body = MessageResponse),
        (status = 404, description = "Unknown user"),
    ),
    tag = "admin"
)]
pub async fn delete_user(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (_claims, admin_id) = match require_admin(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1 AND is_active")
        .bind(id)
        .execute(&pool)
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() > 0 => {
            if let Err(err) = storage::record_admin_activity(
                &pool,
                admin_id,
                "USER_DELETE",
                &format!("Deactivated user {id}"),
            )
            .await
            {
                warn!("Failed to record admin activity: {err}");
            }

            (
                StatusCode::OK,
                Json(MessageResponse {
                    message: "Account deactivated".to_string(),
                }),
            )
                .into_response()
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to deactivate user: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to deactivate user")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/admin/posts",
    params(("search" = Option<String>, Query, description = "Match against title")),
    responses(
        (status = 200, description = "Posts including soft-deleted ones, newest first", body = [Post]),
    ),
    tag = "admin"
)]
pub async fn list_posts(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &state) {
        return response;
    }

    let pattern = query
        .search
        .as_deref()
        .map(|term| format!("%{}%", term.trim()));

    let posts = sqlx::query_as::<_, Post>(
        "SELECT id, user_id, title, description, content, featured_image, \
           visibility, seo_title, seo_description, view_count, created_at, updated_at \
         FROM posts \
         WHERE $1::TEXT IS NULL OR title ILIKE $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(pattern)
    .bind(LIST_LIMIT)
    .fetch_all(&pool)
    .await;

    match posts {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(err) => {
            error!("Failed to list posts: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list posts")
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/admin/posts",
    request_body = AdminCreatePostRequest,
    responses(
        (status = 201, description = "Post created on behalf of a user", body = Post),
        (status = 400, description = "Missing or invalid fields"),
    ),
    tag = "admin"
)]
pub async fn create_post(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<AdminCreatePostRequest>>,
) -> impl IntoResponse {
    let (_claims, admin_id) = match require_admin(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };
    if request.title.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Title is required");
    }

    let created = sqlx::query_as::<_, Post>(
        "INSERT INTO posts (user_id, title, description, content, featured_image, visibility) \
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'public')) \
         RETURNING id, user_id, title, description, content, featured_image, \
           visibility, seo_title, seo_description, view_count, created_at, updated_at",
    )
    .bind(request.user_id)
    .bind(request.title.trim())
    .bind(&request.description)
    .bind(request.content.unwrap_or_default())
    .bind(&request.featured_image)
    .bind(&request.visibility)
    .fetch_one(&pool)
    .await;

    match created {
        Ok(post) => {
            if let Err(err) = storage::record_admin_activity(
                &pool,
                admin_id,
                "POST_CREATE",
                &format!("Created post {}", post.id),
            )
            .await
            {
                warn!("Failed to record admin activity: {err}");
            }

            (StatusCode::CREATED, Json(post)).into_response()
        }
        Err(err) => {
            error!("Failed to create post: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create post")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/admin/posts/{id}",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post soft-deleted", body = MessageResponse),
        (status = 404, description = "Unknown post"),
    ),
    tag = "admin"
)]
pub async fn delete_post(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (_claims, admin_id) = match require_admin(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = sqlx::query("UPDATE posts SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .execute(&pool)
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() > 0 => {
            if let Err(err) = storage::record_admin_activity(
                &pool,
                admin_id,
                "POST_DELETE",
                &format!("Deleted post {id}"),
            )
            .await
            {
                warn!("Failed to record admin activity: {err}");
            }

            (
                StatusCode::OK,
                Json(MessageResponse {
                    message: "Post deleted".to_string(),
                }),
            )
                .into_response()
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Post not found"),
        Err(err) => {
            error!("Failed to delete post: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete post")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/admin/analytics",
    responses(
        (status = 200, description = "Signup growth and top posts", body = AdminAnalytics),
    ),
    tag = "admin"
)]
pub async fn analytics(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &state) {
        return response;
    }

    let growth = sqlx::query_as::<_, DailySignups>(
        "SELECT d::DATE AS day, COUNT(u.id) AS signups \
         FROM generate_series(NOW() - INTERVAL '6 days', NOW(), INTERVAL '1 day') AS d \
         LEFT JOIN users u ON u.created_at::DATE = d::DATE \
         GROUP BY day \
         ORDER BY day",
    )
    .fetch_all(&pool)
    .await;

    let growth = match growth {
        Ok(growth) => growth,
        Err(err) => {
            error!("Failed to load signup growth: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load analytics");
        }
    };

    let top_posts = sqlx::query_as::<_, Post>(
        "SELECT id, user_id, title, description, content, featured_image, \
           visibility, seo_title, seo_description, view_count, created_at, updated_at \
         FROM posts \
         WHERE NOT is_deleted \
         ORDER BY view_count DESC, created_at DESC \
         LIMIT $1",
    )
    .bind(TOP_POSTS_LIMIT)
    .fetch_all(&pool)
    .await;

    match top_posts {
        Ok(top_posts) => (
            StatusCode::OK,
            Json(AdminAnalytics { growth, top_posts }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to load top posts: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load analytics")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/admin/contact-queries",
    responses(
        (status = 200, description = "Contact form submissions, newest first", body = [ContactQuery]),
    ),
    tag = "admin"
)]
pub async fn contact_queries(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &state) {
        return response;
    }

    let queries = sqlx::query_as::<_, ContactQuery>(
        "SELECT id, name, email, phone, subject, message, status, created_at \
         FROM contact_queries \
         ORDER BY created_at DESC \
         LIMIT $1",
    )
    .bind(LIST_LIMIT)
    .fetch_all(&pool)
    .await;

    match queries {
        Ok(queries) => (StatusCode::OK, Json(queries)).into_response(),
        Err(err) => {
            error!("Failed to list contact queries: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list contact queries",
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/admin/activity-logs",
    responses(
        (status = 200, description = "User activity, newest first", body = [ActivityLogEntry]),
    ),
    tag = "admin"
)]
pub async fn activity_logs(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &state) {
        return response;
    }

    let entries = sqlx::query_as::<_, ActivityLogEntry>(
        "SELECT id, user_id, activity_type, activity_description, created_at \
         FROM activity_logs \
         ORDER BY created_at DESC \
         LIMIT $1",
    )
    .bind(LIST_LIMIT)
    .fetch_all(&pool)
    .await;

    match entries {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => {
            error!("Failed to list activity logs: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list activity logs",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, lazy_pool};

    fn user_headers(state: &AuthState) -> HeaderMap {
        let token = state
            .tokens
            .issue_user(Uuid::new_v4(), "asha@example.com", "ASH_K2M7Q_0042", "Asha")
            .expect("token");
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().expect("header"),
        );
        headers
    }

    #[tokio::test]
    async fn overview_requires_a_session() {
        let state = Arc::new(auth_state());
        let response = dashboard_overview(
            Extension(state),
            Extension(lazy_pool()),
            HeaderMap::new(),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_tokens_cannot_reach_admin_routes() {
        let state = Arc::new(auth_state());
        let headers = user_headers(&state);
        let response = list_users(
            Extension(state),
            Extension(lazy_pool()),
            headers,
            Query(SearchQuery { search: None }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
