//! Keyword-matching helper bot for the landing page.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::missing_payload;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatbotRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatbotResponse {
    pub reply: String,
}

const REPLIES: &[(&str, &str)] = &[
    ("hello", "Hi there! Ask me about signing up, posting, or your stats."),
    ("hi", "Hi there! Ask me about signing up, posting, or your stats."),
    ("help", "You can ask about signup, login, posts, or analytics."),
    (
        "signup",
        "To sign up, verify your email and phone with an OTP, then pick a password or let us generate one.",
    ),
    (
        "login",
        "Log in with your email or user id and password, or use Google, Facebook, or LinkedIn.",
    ),
    (
        "post",
        "Once signed in you can publish travel stories with photos and see them on the feed.",
    ),
    (
        "analytics",
        "Your analytics page shows views, likes, and comments across your posts.",
    ),
    (
        "contact",
        "Use the contact form and our team will get back to you by email.",
    ),
];

const FALLBACK: &str =
    "I did not catch that. Try asking about signup, login, posts, or analytics.";

/// Case-insensitive first-keyword match against the reply table.
fn reply_for(message: &str) -> &'static str {
    let message = message.to_lowercase();
    REPLIES
        .iter()
        .find(|(keyword, _)| message.contains(keyword))
        .map_or(FALLBACK, |(_, reply)| reply)
}

#[utoipa::path(
    post,
    path = "/v1/chatbot",
    request_body = ChatbotRequest,
    responses(
        (status = 200, description = "Canned reply", body = ChatbotResponse),
        (status = 400, description = "Missing payload"),
    ),
    tag = "chatbot"
)]
pub async fn chatbot(payload: Option<Json<ChatbotRequest>>) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    (
        StatusCode::OK,
        Json(ChatbotResponse {
            reply: reply_for(&request.message).to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_hit_is_case_insensitive() {
        assert!(reply_for("How do I SIGNUP?").contains("verify your email"));
        assert!(reply_for("hello!").starts_with("Hi there"));
    }

    #[test]
    fn unknown_message_gets_fallback() {
        assert_eq!(reply_for("weather in goa"), FALLBACK);
    }

    #[test]
    fn earlier_table_entries_win() {
        // "hello" also contains no other keyword; mixed messages resolve in
        // table order.
        assert!(reply_for("hello, help me").starts_with("Hi there"));
    }

    #[tokio::test]
    async fn chatbot_requires_payload() {
        let response = chatbot(None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
