use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use staffgate_auth::{Employee, EmployeeRole, PhoneNumber, User, VerificationCode};
use staffgate_core::{EmployeeId, EmployeeRoleId, LocationId, UserId, VerificationCodeId};

use super::r#trait::{EmployeeRoleStore, EmployeeStore, StoreError, UserStore, VerificationCodeStore};

/// Adapter that bounds every call on the wrapped store by a fixed deadline.
///
/// An elapsed deadline drops the inner future (cancelling in-flight IO) and
/// reports `StoreError::Timeout`.
#[derive(Debug, Clone)]
pub struct DeadlineStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> DeadlineStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn within<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout { operation })
            }
        }
    }
}

#[async_trait]
impl<S: UserStore> UserStore for DeadlineStore<S> {
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.within("get_user", self.inner.get(id)).await
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, StoreError> {
        self.within("find_user_by_phone", self.inner.find_by_phone(phone)).await
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.within("insert_user", self.inner.insert(user)).await
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        self.within("update_user", self.inner.update(user)).await
    }
}

#[async_trait]
impl<S: VerificationCodeStore> VerificationCodeStore for DeadlineStore<S> {
    async fn find_by_verification(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError> {
        self.within(
            "find_code_by_verification",
            self.inner.find_by_verification(verification_id, code),
        )
        .await
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<VerificationCode>, StoreError> {
        self.within("find_code_by_phone", self.inner.find_by_phone(phone)).await
    }

    async fn replace_for_phone(&self, code: &VerificationCode) -> Result<(), StoreError> {
        self.within("replace_code_for_phone", self.inner.replace_for_phone(code))
            .await
    }

    async fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<u64, StoreError> {
        self.within("delete_code_by_phone", self.inner.delete_by_phone(phone))
            .await
    }

    async fn delete_by_id(&self, id: VerificationCodeId) -> Result<bool, StoreError> {
        self.within("delete_code_by_id", self.inner.delete_by_id(id)).await
    }
}

#[async_trait]
impl<S: EmployeeStore> EmployeeStore for DeadlineStore<S> {
    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        self.within("get_employee", self.inner.get(id)).await
    }

    async fn find_by_user_and_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<Option<Employee>, StoreError> {
        self.within(
            "find_employee_by_user_and_location",
            self.inner.find_by_user_and_location(user_id, location_id),
        )
        .await
    }

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<Employee>, StoreError> {
        self.within("list_employees_for_location", self.inner.list_for_location(location_id))
            .await
    }

    async fn list_with_role(&self, role_id: EmployeeRoleId) -> Result<Vec<Employee>, StoreError> {
        self.within("list_employees_with_role", self.inner.list_with_role(role_id))
            .await
    }

    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        self.within("insert_employee", self.inner.insert(employee)).await
    }

    async fn update(&self, employee: &Employee) -> Result<(), StoreError> {
        self.within("update_employee", self.inner.update(employee)).await
    }

    async fn delete(&self, id: EmployeeId) -> Result<bool, StoreError> {
        self.within("delete_employee", self.inner.delete(id)).await
    }
}

#[async_trait]
impl<S: EmployeeRoleStore> EmployeeRoleStore for DeadlineStore<S> {
    async fn get(&self, id: EmployeeRoleId) -> Result<Option<EmployeeRole>, StoreError> {
        self.within("get_employee_role", self.inner.get(id)).await
    }

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<EmployeeRole>, StoreError> {
        self.within("list_employee_roles", self.inner.list_for_location(location_id))
            .await
    }

    async fn insert(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        self.within("insert_employee_role", self.inner.insert(role)).await
    }

    async fn update(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        self.within("update_employee_role", self.inner.update(role)).await
    }

    async fn delete(&self, id: EmployeeRoleId) -> Result<bool, StoreError> {
        self.within("delete_employee_role", self.inner.delete(id)).await
    }
}
