//! Outbound SMS delivery.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use staffgate_auth::{PhoneError, PhoneNumber};

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("recipient cannot be addressed: {0}")]
    Recipient(#[from] PhoneError),

    #[error("sms request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sms gateway rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("lock poisoned")]
    Poisoned,
}

/// Delivers a text message to a normalized phone number.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone: &PhoneNumber, text: &str) -> Result<(), SmsError>;
}

#[async_trait]
impl<S> SmsSender for Arc<S>
where
    S: SmsSender + ?Sized,
{
    async fn send(&self, phone: &PhoneNumber, text: &str) -> Result<(), SmsError> {
        (**self).send(phone, text).await
    }
}

/// Development sender: writes the message to the log instead of a handset.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone: &PhoneNumber, text: &str) -> Result<(), SmsError> {
        tracing::info!(
            phone_number = %phone.number,
            country_code = %phone.country_code,
            text,
            "sms (log sender)"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// Sends through the Twilio Messages REST API.
#[derive(Debug, Clone)]
pub struct TwilioSmsSender {
    options: TwilioOptions,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

impl TwilioSmsSender {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.twilio.com";

    pub fn new(options: TwilioOptions) -> Self {
        Self::with_base_url(options, Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(options: TwilioOptions, base_url: impl Into<String>) -> Self {
        Self {
            options,
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.options.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, phone: &PhoneNumber, text: &str) -> Result<(), SmsError> {
        let to = phone.to_e164()?;
        let form = [
            ("To", to.as_str()),
            ("From", self.options.from_number.as_str()),
            ("Body", text),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "twilio rejected sms");
            return Err(SmsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message: MessageResponse = response.json().await?;
        tracing::info!(message_sid = %message.sid, country_code = %phone.country_code, "sms sent");
        Ok(())
    }
}

/// Message captured by [`RecordingSmsSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub phone: PhoneNumber,
    pub text: String,
}

/// Test sender that keeps every message in memory, optionally failing.
#[derive(Debug, Default)]
pub struct RecordingSmsSender {
    sent: Mutex<Vec<SentSms>>,
    fail: bool,
}

impl RecordingSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery is rejected by the "gateway".
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentSms> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<SentSms> {
        self.sent().pop()
    }
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send(&self, phone: &PhoneNumber, text: &str) -> Result<(), SmsError> {
        if self.fail {
            return Err(SmsError::Rejected {
                status: 503,
                body: "gateway unavailable".to_string(),
            });
        }

        self.sent
            .lock()
            .map_err(|_| SmsError::Poisoned)?
            .push(SentSms {
                phone: phone.clone(),
                text: text.to_string(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> PhoneNumber {
        PhoneNumber {
            number: "0999 111 333".to_string(),
            country_code: "VN".to_string(),
        }
    }

    #[tokio::test]
    async fn recording_sender_keeps_messages_in_order() {
        let sender = RecordingSmsSender::new();
        sender.send(&phone(), "111111").await.unwrap();
        sender.send(&phone(), "222222").await.unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sender.last().unwrap().text, "222222");
    }

    #[tokio::test]
    async fn failing_sender_records_nothing() {
        let sender = RecordingSmsSender::failing();
        assert!(matches!(
            sender.send(&phone(), "111111").await,
            Err(SmsError::Rejected { status: 503, .. })
        ));
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn twilio_url_targets_the_account() {
        let sender = TwilioSmsSender::with_base_url(
            TwilioOptions {
                account_sid: "AC123".to_string(),
                auth_token: "token".to_string(),
                from_number: "+15550000000".to_string(),
            },
            "http://localhost:9999/",
        );
        assert_eq!(
            sender.messages_url(),
            "http://localhost:9999/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
