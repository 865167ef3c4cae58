//! OTP send/verify/resend endpoints for email and phone targets.

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::ledger::OtpPurpose;
use super::state::AuthState;
use super::types::{
    EmailOtpRequest, MessageResponse, OtpResponse, PhoneOtpRequest, VerifyEmailOtpRequest,
    VerifyPhoneOtpRequest,
};
use super::utils::{normalize_email, normalize_phone, valid_email};
use super::{error_response, missing_payload};
use crate::api::email::{self, template};

#[utoipa::path(
    post,
    path = "/v1/auth/send-email-otp",
    request_body = EmailOtpRequest,
    responses(
        (status = 200, description = "OTP queued for delivery", body = OtpResponse),
        (status = 400, description = "Invalid email", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn send_email_otp(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<EmailOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email address");
    }

    let code = state.ledger.issue(&email, OtpPurpose::Email).await;
    if let Err(err) = email::enqueue(
        &pool,
        &email,
        template::EMAIL_OTP,
        &json!({ "code": code }),
    )
    .await
    {
        error!("Failed to enqueue OTP email: {err}");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send OTP");
    }

    (
        StatusCode::OK,
        Json(OtpResponse {
            message: "OTP sent to email".to_string(),
            demo_otp: state.config.demo_otp().then_some(code),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/send-phone-otp",
    request_body = PhoneOtpRequest,
    responses(
        (status = 200, description = "OTP queued for delivery", body = OtpResponse),
        (status = 400, description = "Invalid phone number", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn send_phone_otp(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<PhoneOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let Some(phone) = normalize_phone(&request.phone) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid phone number");
    };

    let code = state.ledger.issue(&phone, OtpPurpose::Phone).await;
    dispatch_sms(&state, phone.clone(), code.clone());

    (
        StatusCode::OK,
        Json(OtpResponse {
            message: "OTP sent to phone".to_string(),
            demo_otp: (state.config.demo_otp() || state.sms.is_demo()).then_some(code),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-email-otp",
    request_body = VerifyEmailOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Unknown, expired, or wrong OTP", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn verify_email_otp(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyEmailOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let email = normalize_email(&request.email);
    match state.ledger.verify(&email, &request.otp).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Email verified".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-phone-otp",
    request_body = VerifyPhoneOtpRequest,
    responses(
        (status = 200, description = "Phone verified", body = MessageResponse),
        (status = 400, description = "Unknown, expired, or wrong OTP", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn verify_phone_otp(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyPhoneOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let Some(phone) = normalize_phone(&request.phone) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid phone number");
    };

    match state.ledger.verify(&phone, &request.otp).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Phone verified".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/resend-email-otp",
    request_body = EmailOtpRequest,
    responses(
        (status = 200, description = "OTP re-sent", body = OtpResponse),
        (status = 400, description = "Invalid email", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn resend_email_otp(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<EmailOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email address");
    }

    let code = state.ledger.resend(&email, OtpPurpose::Email).await;
    if let Err(err) = email::enqueue(
        &pool,
        &email,
        template::EMAIL_OTP,
        &json!({ "code": code }),
    )
    .await
    {
        error!("Failed to enqueue OTP email: {err}");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send OTP");
    }

    (
        StatusCode::OK,
        Json(OtpResponse {
            message: "OTP re-sent to email".to_string(),
            demo_otp: state.config.demo_otp().then_some(code),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/resend-phone-otp",
    request_body = PhoneOtpRequest,
    responses(
        (status = 200, description = "OTP re-sent", body = OtpResponse),
        (status = 400, description = "Invalid phone number", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn resend_phone_otp(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<PhoneOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let Some(phone) = normalize_phone(&request.phone) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid phone number");
    };

    let code = state.ledger.resend(&phone, OtpPurpose::Phone).await;
    dispatch_sms(&state, phone.clone(), code.clone());

    (
        StatusCode::OK,
        Json(OtpResponse {
            message: "OTP re-sent to phone".to_string(),
            demo_otp: (state.config.demo_otp() || state.sms.is_demo()).then_some(code),
        }),
    )
        .into_response()
}

/// Fire-and-forget SMS delivery; a failed send never fails the request.
fn dispatch_sms(state: &Arc<AuthState>, phone: String, code: String) {
    let state = state.clone();
    tokio::spawn(async move {
        let body = format!("Your Yatra verification code is {code}");
        if let Err(err) = state.sms.send(&phone, &body).await {
            warn!("Failed to send OTP SMS: {err}");
        }
    });
}
