use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use staffgate_core::{Entity, ExpiryOverflow, UserId, VerificationCodeId, expires_after};

use crate::phone::PhoneNumber;

/// What a verification code may be redeemed for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationPurpose {
    Login,
    UpdatePhone,
}

impl VerificationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationPurpose::Login => "LOGIN",
            VerificationPurpose::UpdatePhone => "UPDATE_PHONE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOGIN" => Some(VerificationPurpose::Login),
            "UPDATE_PHONE" => Some(VerificationPurpose::UpdatePhone),
            _ => None,
        }
    }
}

impl core::fmt::Display for VerificationPurpose {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outstanding challenge for a phone number.
///
/// # Invariants
/// - At most one row exists per `(phone_number, country_code)`.
/// - Single use: the row is deleted when redeemed.
/// - `verification_id` is handed to the caller; `code` only travels by SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub id: VerificationCodeId,
    pub user_id: UserId,
    pub code: String,
    pub verification_id: String,
    pub purpose: VerificationPurpose,
    pub phone_number: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn new(
        user_id: UserId,
        phone: &PhoneNumber,
        purpose: VerificationPurpose,
        code: String,
        verification_id: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, ExpiryOverflow> {
        Ok(Self {
            id: VerificationCodeId::new(),
            user_id,
            code,
            verification_id,
            purpose,
            phone_number: phone.number.clone(),
            country_code: phone.country_code.clone(),
            created_at: now,
            expires_at: expires_after(now, ttl)?,
        })
    }

    /// A code is still redeemable at exactly `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn phone(&self) -> PhoneNumber {
        PhoneNumber {
            number: self.phone_number.clone(),
            country_code: self.country_code.clone(),
        }
    }
}

impl Entity for VerificationCode {
    type Id = VerificationCodeId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
