//! Access-token signing.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use staffgate_core::{Clock, SystemClock};

use crate::claims::{AccessClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token is malformed or its signature does not match: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Signs and verifies access credentials.
pub trait TokenIssuer: Send + Sync {
    fn sign(&self, claims: &AccessClaims) -> Result<String, TokenError>;

    /// Check the signature and the claim window.
    fn verify(&self, token: &str) -> Result<AccessClaims, TokenError>;
}

impl<T: TokenIssuer + ?Sized> TokenIssuer for Arc<T> {
    fn sign(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        (**self).sign(claims)
    }

    fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        (**self).verify(token)
    }
}

/// HMAC-SHA256 JWTs over a shared secret.
#[derive(Clone)]
pub struct Hs256TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl Hs256TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            clock,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Timing is checked against the injected clock in `validate_claims`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl core::fmt::Debug for Hs256TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer for Hs256TokenIssuer {
    fn sign(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(TokenError::Malformed)?;

        validate_claims(&claims, self.clock.now())?;
        Ok(claims)
    }
}
