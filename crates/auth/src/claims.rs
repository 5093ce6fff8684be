use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use staffgate_core::{ExpiryOverflow, UserId, expires_after};

/// Access-token claims.
///
/// Timestamps are unix seconds, matching the registered JWT claim names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the verified identity.
    pub sub: UserId,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(sub: UserId, now: DateTime<Utc>, ttl: Duration) -> Result<Self, ExpiryOverflow> {
        Ok(Self {
            sub,
            iat: now.timestamp(),
            exp: expires_after(now, ttl)?.timestamp(),
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate claim timing against `now`.
///
/// Signature checks happen in the token issuer; this only looks at the window.
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_valid_inside_the_window() {
        let now = Utc::now();
        let claims = AccessClaims::new(UserId::new(), now, Duration::hours(1)).unwrap();

        assert_eq!(validate_claims(&claims, now), Ok(()));
        assert_eq!(
            validate_claims(&claims, now + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, now - Duration::minutes(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn empty_window_is_rejected() {
        let claims = AccessClaims::new(UserId::new(), Utc::now(), Duration::zero()).unwrap();
        assert_eq!(
            validate_claims(&claims, Utc::now()),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        assert!(AccessClaims::new(UserId::new(), Utc::now(), Duration::days(365_000_000)).is_err());
    }
}
