//! Phone-number identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staffgate_core::{Entity, UserId};

use crate::phone::PhoneNumber;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A phone-number-owning principal.
///
/// # Invariants
/// - `(phone_number, country_code)` is unique across users.
/// - `phone_number` is always stored in normalized form.
/// - Users are never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub phone_number: String,
    pub country_code: String,
    pub profile_image_id: String,
    pub is_phone_number_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh, unverified identity for a normalized phone number.
    pub fn new(phone: &PhoneNumber, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            full_name: String::new(),
            phone_number: phone.number.clone(),
            country_code: phone.country_code.clone(),
            profile_image_id: String::new(),
            is_phone_number_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phone(&self) -> PhoneNumber {
        PhoneNumber {
            number: self.phone_number.clone(),
            country_code: self.country_code.clone(),
        }
    }

    pub fn owns(&self, phone: &PhoneNumber) -> bool {
        self.phone_number == phone.number && self.country_code == phone.country_code
    }

    pub fn mark_phone_verified(&mut self, now: DateTime<Utc>) {
        self.is_phone_number_verified = true;
        self.updated_at = now;
    }

    /// Move the identity to a new phone number it has just proven ownership of.
    pub fn change_phone_number(&mut self, phone: &PhoneNumber, now: DateTime<Utc>) {
        self.phone_number = phone.number.clone();
        self.country_code = phone.country_code.clone();
        self.is_phone_number_verified = true;
        self.updated_at = now;
    }

    /// Apply a partial profile update. Returns whether anything changed.
    pub fn apply_profile(&mut self, update: &ProfileUpdate, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if let Some(full_name) = non_blank(&update.full_name) {
            self.full_name = full_name.to_string();
            changed = true;
        }
        if let Some(image_id) = non_blank(&update.profile_image_id) {
            self.profile_image_id = image_id.to_string();
            changed = true;
        }

        if changed {
            self.updated_at = now;
        }
        changed
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Partial update of display fields.
///
/// An empty or whitespace-only field means "leave unchanged"; clearing a field
/// cannot be expressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_image_id: String,
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
