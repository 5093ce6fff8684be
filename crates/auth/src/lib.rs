//! `staffgate-auth`: phone-verified identity and location-scoped authorization.
//!
//! This crate is intentionally decoupled from storage and transport: it holds
//! the domain models, the permission catalog and the pure checks over them.

pub mod actor;
pub mod claims;
pub mod employee;
pub mod permissions;
pub mod phone;
pub mod random;
pub mod registry;
pub mod roles;
pub mod token;
pub mod user;
pub mod verification;

pub use actor::{Actor, AuthzError};
pub use claims::{AccessClaims, TokenValidationError, validate_claims};
pub use employee::Employee;
pub use permissions::{Operation, Permission, PermissionId};
pub use phone::{NationalFormatNormalizer, PhoneError, PhoneNormalizer, PhoneNumber};
pub use random::{CodeGenerator, random_code, random_opaque_id};
pub use registry::{PermissionRegistry, RegistryError};
pub use roles::{DEFAULT_ROLES, DefaultRole, EmployeeRole, OWNER_ROLE_NAME};
pub use token::{Hs256TokenIssuer, TokenError, TokenIssuer};
pub use user::{ProfileUpdate, User};
pub use verification::{VerificationCode, VerificationPurpose};
