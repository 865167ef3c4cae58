//! SMS delivery channel for phone OTP codes.
//!
//! Delivery is fire-and-forget from the OTP handlers: a failed send is
//! logged but never fails the HTTP request. Without Twilio credentials the
//! channel degrades to a logging stub and the OTP endpoints echo the code
//! back (`demo_otp`) so the signup flow stays testable.

use anyhow::{Context, Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub enum SmsChannel {
    /// Logging stub for local development.
    Log,
    /// Twilio Messages API.
    Twilio(TwilioSender),
}

impl SmsChannel {
    #[must_use]
    pub fn log() -> Self {
        Self::Log
    }

    #[must_use]
    pub fn twilio(account_sid: String, auth_token: SecretString, from: String) -> Self {
        Self::Twilio(TwilioSender {
            account_sid,
            auth_token,
            from,
            client: reqwest::Client::new(),
        })
    }

    /// True when no real transport is configured.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Log)
    }

    /// Deliver one SMS.
    ///
    /// # Errors
    /// Returns an error if the Twilio request fails or is rejected.
    pub async fn send(&self, to: &str, body: &str) -> Result<()> {
        match self {
            Self::Log => {
                info!(to = %to, body = %body, "sms send stub");
                Ok(())
            }
            Self::Twilio(sender) => sender.send(to, body).await,
        }
    }
}

pub struct TwilioSender {
    account_sid: String,
    auth_token: SecretString,
    from: String,
    client: reqwest::Client,
}

impl TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let url = format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.account_sid
        );

        let form = [("To", to), ("From", self.from.as_str()), ("Body", body)];
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .context("twilio request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("twilio rejected message ({status}): {detail}"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_channel_is_demo_and_sends() {
        let channel = SmsChannel::log();
        assert!(channel.is_demo());
        assert!(channel.send("5551230000", "Your code is 123456").await.is_ok());
    }

    #[test]
    fn twilio_channel_is_not_demo() {
        let channel = SmsChannel::twilio(
            "AC123".to_string(),
            SecretString::from("token".to_string()),
            "+15555550100".to_string(),
        );
        assert!(!channel.is_demo());
    }
}
