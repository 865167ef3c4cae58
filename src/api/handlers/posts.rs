//! Blog post endpoints: create, feed, likes, comments.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::{AuthState, error_response, missing_payload, require_user};

const FEED_LIMIT: i64 = 20;
const COMMENTS_LIMIT: i64 = 100;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub visibility: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Not signed in"),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CreatePostRequest>>,
) -> impl IntoResponse {
    let (_claims, author) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };
    if request.title.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Title is required");
    }

    let visibility = match request.visibility.as_deref() {
        None | Some("public") => "public",
        Some("private") => "private",
        Some(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid visibility"),
    };

    let created = sqlx::query_as::<_, Post>(
        "INSERT INTO posts \
           (user_id, title, description, content, featured_image, visibility, \
            seo_title, seo_description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, user_id, title, description, content, featured_image, \
           visibility, seo_title, seo_description, view_count, created_at, updated_at",
    )
    .bind(author)
    .bind(request.title.trim())
    .bind(&request.description)
    .bind(request.content.unwrap_or_default())
    .bind(&request.featured_image)
    .bind(visibility)
    .bind(&request.seo_title)
    .bind(&request.seo_description)
    .fetch_one(&pool)
    .await;

    match created {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(err) => {
            error!("Failed to create post: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create post")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/posts/feed",
    responses(
        (status = 200, description = "Top public posts by views, newest first on ties", body = [Post]),
    ),
    tag = "posts"
)]
pub async fn feed(Extension(pool): Extension<PgPool>) -> impl IntoResponse {
    let posts = sqlx::query_as::<_, Post>(
        "SELECT id, user_id, title, description, content, featured_image, \
           visibility, seo_title, seo_description, view_count, created_at, updated_at \
         FROM posts \
         WHERE visibility = 'public' AND NOT is_deleted \
         ORDER BY view_count DESC, created_at DESC \
         LIMIT $1",
    )
    .bind(FEED_LIMIT)
    .fetch_all(&pool)
    .await;

    match posts {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(err) => {
            error!("Failed to load feed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load feed")
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/posts/{id}/like",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Unknown post"),
    ),
    tag = "posts"
)]
pub async fn toggle_like(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> impl IntoResponse {
    let (_claims, user) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match post_exists(&pool, post_id).await {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Post not found"),
        Err(err) => {
            error!("Failed to check post: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to toggle like");
        }
    }

    // Toggle: try to remove an existing like first, insert when none was there.
    let removed = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user)
        .execute(&pool)
        .await;

    match removed {
        Ok(result) if result.rows_affected() > 0 => (
            StatusCode::OK,
            Json(LikeResponse {
                message: "Like removed".to_string(),
                liked: false,
            }),
        )
            .into_response(),
        Ok(_) => {
            let inserted = sqlx::query(
                "INSERT INTO likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(user)
            .execute(&pool)
            .await;

            match inserted {
                Ok(_) => (
                    StatusCode::OK,
                    Json(LikeResponse {
                        message: "Post liked".to_string(),
                        liked: true,
                    }),
                )
                    .into_response(),
                Err(err) => {
                    error!("Failed to like post: {err}");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to toggle like")
                }
            }
        }
        Err(err) => {
            error!("Failed to toggle like: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to toggle like")
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [Comment]),
        (status = 404, description = "Unknown post"),
    ),
    tag = "posts"
)]
pub async fn list_comments(
    Extension(pool): Extension<PgPool>,
    Path(post_id): Path<Uuid>,
) -> impl IntoResponse {
    match post_exists(&pool, post_id).await {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Post not found"),
        Err(err) => {
            error!("Failed to check post: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load comments");
        }
    }

    let comments = sqlx::query_as::<_, Comment>(
        "SELECT id, post_id, user_id, content, created_at \
         FROM comments \
         WHERE post_id = $1 AND NOT is_deleted \
         ORDER BY created_at \
         LIMIT $2",
    )
    .bind(post_id)
    .bind(COMMENTS_LIMIT)
    .fetch_all(&pool)
    .await;

    match comments {
        Ok(comments) => (StatusCode::OK, Json(comments)).into_response(),
        Err(err) => {
            error!("Failed to load comments: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load comments")
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 404, description = "Unknown post"),
    ),
    tag = "posts"
)]
pub async fn add_comment(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    payload: Option<Json<CommentRequest>>,
) -> impl IntoResponse {
    let (_claims, user) = match require_user(&headers, &state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };
    if request.content.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Comment cannot be empty");
    }

    match post_exists(&pool, post_id).await {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Post not found"),
        Err(err) => {
            error!("Failed to check post: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add comment");
        }
    }

    let created = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (post_id, user_id, content) \
         VALUES ($1, $2, $3) \
         RETURNING id, post_id, user_id, content, created_at",
    )
    .bind(post_id)
    .bind(user)
    .bind(request.content.trim())
    .fetch_one(&pool)
    .await;

    match created {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(err) => {
            error!("Failed to add comment: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add comment")
        }
    }
}

async fn post_exists(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1 AND NOT is_deleted)",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, lazy_pool};

    #[tokio::test]
    async fn create_post_requires_a_session() {
        let state = Arc::new(auth_state());
        let response = create_post(
            Extension(state),
            Extension(lazy_pool()),
            HeaderMap::new(),
            Some(Json(CreatePostRequest {
                title: "Kerala backwaters".to_string(),
                description: None,
                content: None,
                featured_image: None,
                visibility: None,
                seo_title: None,
                seo_description: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn toggle_like_requires_a_session() {
        let state = Arc::new(auth_state());
        let response = toggle_like(
            Extension(state),
            Extension(lazy_pool()),
            HeaderMap::new(),
            Path(Uuid::new_v4()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
