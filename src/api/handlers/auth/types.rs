//! Request/response bodies for the auth endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailOtpRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PhoneOtpRequest {
    #[schema(example = "+91 98765 43210")]
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailOtpRequest {
    pub email: String,
    #[schema(example = "123456")]
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPhoneOtpRequest {
    pub phone: String,
    pub otp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpResponse {
    pub message: String,
    /// Echoed code when no real delivery channel is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_otp: Option<String>,
}

/// Signup where the caller picks both the user id and the password.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    /// Chosen handle, unique alongside email and phone.
    #[serde(alias = "userId")]
    #[schema(example = "asha_travels")]
    pub user_id: String,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub bio: Option<String>,
    pub password: String,
}

/// Signup where the server assigns the user id and a temporary password.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AutoSignupRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or assigned user id.
    #[schema(example = "ASH_K2M7Q_0042")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OauthExchangeRequest {
    /// One-time code from the OAuth callback redirect.
    pub code: String,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub bio: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AutoSignupResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
    /// False when the credentials email could not be queued.
    pub email_sent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAuthResponse {
    pub message: String,
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_response_omits_absent_demo_code() {
        let body = serde_json::to_string(&OtpResponse {
            message: "OTP sent".to_string(),
            demo_otp: None,
        })
        .expect("json");
        assert_eq!(body, r#"{"message":"OTP sent"}"#);
    }

    #[test]
    fn signup_request_optional_fields_default() {
        let request: SignupRequest = serde_json::from_str(
            r#"{"first_name":"Asha","email":"a@example.com","phone":"5551230000","user_id":"asha_travels","password":"pw"}"#,
        )
        .expect("request");
        assert_eq!(request.last_name, None);
        assert_eq!(request.dob, None);
        assert_eq!(request.bio, None);
    }

    #[test]
    fn signup_request_accepts_camel_case_user_id() {
        let request: SignupRequest = serde_json::from_str(
            r#"{"first_name":"Asha","email":"a@example.com","phone":"5551230000","userId":"ASHA_CHOSEN_01","password":"pw"}"#,
        )
        .expect("request");
        assert_eq!(request.user_id, "ASHA_CHOSEN_01");
    }
}
