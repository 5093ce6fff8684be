//! `staffgate-core`: shared building blocks.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, ExpiryOverflow, FixedClock, SystemClock, expires_after};
pub use entity::Entity;
pub use error::{AppError, AppResult, ErrorKind, INTERNAL_ERROR_MESSAGE};
pub use id::{EmployeeId, EmployeeRoleId, LocationId, UserId, VerificationCodeId};
