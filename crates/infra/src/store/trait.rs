use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use staffgate_auth::{Employee, EmployeeRole, PhoneNumber, User, VerificationCode};
use staffgate_core::{EmployeeId, EmployeeRoleId, LocationId, UserId, VerificationCodeId};

/// Store operation error.
///
/// These are **infrastructure errors**. Services translate them into
/// application errors: `NotFound` and `Conflict` keep their meaning, every
/// other variant becomes `Unexpected`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("uniqueness violation: {0}")]
    Conflict(String),

    #[error("store call '{operation}' exceeded its deadline")]
    Timeout { operation: &'static str },

    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("lock poisoned")]
    Poisoned,
}

/// Phone-number identities.
///
/// `(phone_number, country_code)` is unique: `insert` and `update` report
/// `StoreError::Conflict` when another user already holds the pair.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Overwrite an existing user. `StoreError::NotFound` if the id is unknown.
    async fn update(&self, user: &User) -> Result<(), StoreError>;
}

/// Outstanding verification codes, at most one per phone number.
#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    /// Exact match on both values. A wrong code and a wrong id look the same.
    async fn find_by_verification(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError>;

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<VerificationCode>, StoreError>;

    /// Atomically drop any code for the same phone number and insert `code`.
    async fn replace_for_phone(&self, code: &VerificationCode) -> Result<(), StoreError>;

    /// Returns how many rows were removed.
    async fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<u64, StoreError>;

    /// Returns whether this call removed the row. Exactly one concurrent caller
    /// observes `true`.
    async fn delete_by_id(&self, id: VerificationCodeId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn find_by_user_and_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<Option<Employee>, StoreError>;

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<Employee>, StoreError>;

    async fn list_with_role(&self, role_id: EmployeeRoleId) -> Result<Vec<Employee>, StoreError>;

    /// A user may be employed at most once per location.
    async fn insert(&self, employee: &Employee) -> Result<(), StoreError>;

    async fn update(&self, employee: &Employee) -> Result<(), StoreError>;

    async fn delete(&self, id: EmployeeId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait EmployeeRoleStore: Send + Sync {
    async fn get(&self, id: EmployeeRoleId) -> Result<Option<EmployeeRole>, StoreError>;

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<EmployeeRole>, StoreError>;

    async fn insert(&self, role: &EmployeeRole) -> Result<(), StoreError>;

    async fn update(&self, role: &EmployeeRole) -> Result<(), StoreError>;

    async fn delete(&self, id: EmployeeRoleId) -> Result<bool, StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared-ownership forwarding
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).get(id).await
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, StoreError> {
        (**self).find_by_phone(phone).await
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        (**self).insert(user).await
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        (**self).update(user).await
    }
}

#[async_trait]
impl<S> VerificationCodeStore for Arc<S>
where
    S: VerificationCodeStore + ?Sized,
{
    async fn find_by_verification(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError> {
        (**self).find_by_verification(verification_id, code).await
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<VerificationCode>, StoreError> {
        (**self).find_by_phone(phone).await
    }

    async fn replace_for_phone(&self, code: &VerificationCode) -> Result<(), StoreError> {
        (**self).replace_for_phone(code).await
    }

    async fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<u64, StoreError> {
        (**self).delete_by_phone(phone).await
    }

    async fn delete_by_id(&self, id: VerificationCodeId) -> Result<bool, StoreError> {
        (**self).delete_by_id(id).await
    }
}

#[async_trait]
impl<S> EmployeeStore for Arc<S>
where
    S: EmployeeStore + ?Sized,
{
    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        (**self).get(id).await
    }

    async fn find_by_user_and_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<Option<Employee>, StoreError> {
        (**self).find_by_user_and_location(user_id, location_id).await
    }

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<Employee>, StoreError> {
        (**self).list_for_location(location_id).await
    }

    async fn list_with_role(&self, role_id: EmployeeRoleId) -> Result<Vec<Employee>, StoreError> {
        (**self).list_with_role(role_id).await
    }

    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        (**self).insert(employee).await
    }

    async fn update(&self, employee: &Employee) -> Result<(), StoreError> {
        (**self).update(employee).await
    }

    async fn delete(&self, id: EmployeeId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> EmployeeRoleStore for Arc<S>
where
    S: EmployeeRoleStore + ?Sized,
{
    async fn get(&self, id: EmployeeRoleId) -> Result<Option<EmployeeRole>, StoreError> {
        (**self).get(id).await
    }

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<EmployeeRole>, StoreError> {
        (**self).list_for_location(location_id).await
    }

    async fn insert(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        (**self).insert(role).await
    }

    async fn update(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        (**self).update(role).await
    }

    async fn delete(&self, id: EmployeeRoleId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}
