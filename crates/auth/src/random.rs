//! Random material for verification codes.
//!
//! Both helpers draw from `thread_rng`, which is a CSPRNG reseeded from the OS.

use rand::Rng;
use rand::distributions::{Alphanumeric, Uniform};

/// Uniformly random numeric string of exactly `digits` characters.
///
/// Leading zeros are kept, so every value in `0..10^digits` is equally likely.
pub fn random_code(digits: usize) -> String {
    let digit = Uniform::from(0u8..10);
    rand::thread_rng()
        .sample_iter(digit)
        .take(digits)
        .map(|d| char::from(b'0' + d))
        .collect()
}

/// High-entropy alphanumeric identifier of `length` characters.
pub fn random_opaque_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Fixed lengths for the verification material issued per attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CodeGenerator {
    pub code_digits: usize,
    pub id_length: usize,
}

impl CodeGenerator {
    pub const DEFAULT_CODE_DIGITS: usize = 6;
    pub const DEFAULT_ID_LENGTH: usize = 50;

    pub fn new(code_digits: usize, id_length: usize) -> Self {
        Self {
            code_digits,
            id_length,
        }
    }

    pub fn code(&self) -> String {
        random_code(self.code_digits)
    }

    pub fn verification_id(&self) -> String {
        random_opaque_id(self.id_length)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CODE_DIGITS, Self::DEFAULT_ID_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn code_has_requested_length_and_only_digits(digits in 1usize..16) {
            let code = random_code(digits);
            prop_assert_eq!(code.len(), digits);
            prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn opaque_id_is_alphanumeric(length in 1usize..128) {
            let id = random_opaque_id(length);
            prop_assert_eq!(id.len(), length);
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn default_generator_matches_production_lengths() {
        let generator = CodeGenerator::default();
        assert_eq!(generator.code().len(), 6);
        assert_eq!(generator.verification_id().len(), 50);
    }

    #[test]
    fn opaque_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| random_opaque_id(50)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn every_digit_shows_up() {
        let seen: HashSet<char> = (0..200).flat_map(|_| random_code(6).chars().collect::<Vec<_>>()).collect();
        assert_eq!(seen.len(), 10);
    }
}
