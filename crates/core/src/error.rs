//! Application error model.
//!
//! Every error carries the name of the operation that produced it. Helpers that
//! call other helpers add their own frame with [`AppError::wrap`], which keeps
//! the original [`ErrorKind`] intact.

use thiserror::Error;

/// Result type used across services.
pub type AppResult<T> = Result<T, AppError>;

/// Message shown to callers for any `Unexpected` failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "An internal error has occurred. Please contact technical support.";

/// Error category, stable across wrapping.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input or failed precondition visible to the caller.
    Invalid,
    /// Actor lacks the operation, or identity mismatch.
    Unauthorized,
    /// Referenced entity is absent.
    NotFound,
    /// Uniqueness violation.
    Conflict,
    /// Store/internal failure or broken referential integrity.
    Unexpected,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ErrorKind::Invalid => "invalid",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

/// Application-level error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{op}: invalid: {message}")]
    Invalid { op: &'static str, message: String },

    #[error("{op}: unauthorized: {reason}")]
    Unauthorized { op: &'static str, reason: String },

    #[error("{op}: not found")]
    NotFound { op: &'static str },

    #[error("{op}: conflict: {message}")]
    Conflict { op: &'static str, message: String },

    #[error("{op}: {context}: {source}")]
    Unexpected {
        op: &'static str,
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// An operation frame around a lower-level application error.
    #[error("{op}: {context}: {source}")]
    Wrapped {
        op: &'static str,
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    pub fn invalid(op: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            op,
            message: message.into(),
        }
    }

    pub fn unauthorized(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            op,
            reason: reason.into(),
        }
    }

    pub fn not_found(op: &'static str) -> Self {
        Self::NotFound { op }
    }

    pub fn conflict(op: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            op,
            message: message.into(),
        }
    }

    pub fn unexpected(
        op: &'static str,
        context: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Unexpected {
            op,
            context: context.into(),
            source: source.into(),
        }
    }

    /// Add an operation frame without changing the kind.
    pub fn wrap(self, op: &'static str, context: impl Into<String>) -> Self {
        Self::Wrapped {
            op,
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Invalid { .. } => ErrorKind::Invalid,
            AppError::Unauthorized { .. } => ErrorKind::Unauthorized,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Conflict { .. } => ErrorKind::Conflict,
            AppError::Unexpected { .. } => ErrorKind::Unexpected,
            AppError::Wrapped { source, .. } => source.kind(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Operation name of the outermost frame.
    pub fn op(&self) -> &'static str {
        match self {
            AppError::Invalid { op, .. }
            | AppError::Unauthorized { op, .. }
            | AppError::NotFound { op }
            | AppError::Conflict { op, .. }
            | AppError::Unexpected { op, .. }
            | AppError::Wrapped { op, .. } => op,
        }
    }

    /// Message safe to hand back to the caller.
    ///
    /// `Unexpected` errors never expose their context or source.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Invalid { message, .. } | AppError::Conflict { message, .. } => {
                message.clone()
            }
            AppError::Unauthorized { .. } => "unauthorized".to_string(),
            AppError::NotFound { .. } => "not found".to_string(),
            AppError::Unexpected { .. } => INTERNAL_ERROR_MESSAGE.to_string(),
            AppError::Wrapped { source, .. } => source.public_message(),
        }
    }
}
