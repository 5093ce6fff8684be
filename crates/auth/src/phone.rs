//! Phone-number normalization.
//!
//! Every phone number is normalized before it is looked up or stored, so the
//! same handset always maps to the same `(number, country_code)` pair no matter
//! how the caller typed it.

use phonenumber::{Mode, country};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("unknown country code '{0}'")]
    UnknownCountry(String),

    #[error("phone number '{number}' cannot be parsed: {reason}")]
    Unparsable { number: String, reason: String },
}

/// A phone number in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// National-format rendering.
    pub number: String,
    /// ISO 3166-1 alpha-2, upper-case.
    pub country_code: String,
}

impl PhoneNumber {
    /// International rendering (`+84...`), as SMS gateways expect it.
    pub fn to_e164(&self) -> Result<String, PhoneError> {
        let parsed = parse(&self.number, &self.country_code)?;
        Ok(parsed.format().mode(Mode::E164).to_string())
    }
}

fn parse(phone_number: &str, country_code: &str) -> Result<phonenumber::PhoneNumber, PhoneError> {
    let region = country_code
        .parse::<country::Id>()
        .map_err(|_| PhoneError::UnknownCountry(country_code.to_string()))?;

    phonenumber::parse(Some(region), phone_number.trim()).map_err(|e| PhoneError::Unparsable {
        number: phone_number.to_string(),
        reason: e.to_string(),
    })
}

pub trait PhoneNormalizer: Send + Sync {
    fn normalize(&self, phone_number: &str, country_code: &str) -> Result<PhoneNumber, PhoneError>;
}

impl<N: PhoneNormalizer + ?Sized> PhoneNormalizer for std::sync::Arc<N> {
    fn normalize(&self, phone_number: &str, country_code: &str) -> Result<PhoneNumber, PhoneError> {
        (**self).normalize(phone_number, country_code)
    }
}

/// Parses with libphonenumber metadata and renders the national format.
///
/// Numbers are not checked for assignability, only for parseability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NationalFormatNormalizer;

impl PhoneNormalizer for NationalFormatNormalizer {
    fn normalize(&self, phone_number: &str, country_code: &str) -> Result<PhoneNumber, PhoneError> {
        let country_code = country_code.trim().to_ascii_uppercase();
        let parsed = parse(phone_number, &country_code)?;

        Ok(PhoneNumber {
            number: parsed.format().mode(Mode::National).to_string(),
            country_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_of_the_same_number_collapse() {
        let normalizer = NationalFormatNormalizer;

        let bare = normalizer.normalize("999111333", "VN").unwrap();
        let prefixed = normalizer.normalize("0999111333", "VN").unwrap();
        let international = normalizer.normalize("+84 999 111 333", "VN").unwrap();

        assert_eq!(bare, prefixed);
        assert_eq!(bare, international);
        assert_eq!(bare.country_code, "VN");
    }

    #[test]
    fn country_code_is_upper_cased() {
        let phone = NationalFormatNormalizer.normalize("999111333", " vn ").unwrap();
        assert_eq!(phone.country_code, "VN");
    }

    #[test]
    fn normalized_number_renders_as_e164() {
        let phone = NationalFormatNormalizer.normalize("999111333", "VN").unwrap();
        assert_eq!(phone.to_e164().unwrap(), "+84999111333");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = NationalFormatNormalizer
            .normalize("not a phone", "VN")
            .unwrap_err();
        assert!(matches!(err, PhoneError::Unparsable { .. }));
    }

    #[test]
    fn unknown_country_is_rejected() {
        let err = NationalFormatNormalizer
            .normalize("999111333", "ZZZ")
            .unwrap_err();
        assert_eq!(err, PhoneError::UnknownCountry("ZZZ".to_string()));
    }
}
