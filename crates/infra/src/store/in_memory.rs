use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use staffgate_auth::{Employee, EmployeeRole, PhoneNumber, User, VerificationCode};
use staffgate_core::{EmployeeId, EmployeeRoleId, Entity, LocationId, UserId, VerificationCodeId};

use super::r#trait::{EmployeeRoleStore, EmployeeStore, StoreError, UserStore, VerificationCodeStore};

/// Entity table keyed by id.
///
/// Every multi-step check-then-write happens under one write guard, which is
/// what makes the in-memory stores linearizable.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity + Clone> Table<E> {
    fn read<R>(&self, f: impl FnOnce(&HashMap<E::Id, E>) -> R) -> Result<R, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&*rows))
    }

    fn write<R>(&self, f: impl FnOnce(&mut HashMap<E::Id, E>) -> R) -> Result<R, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut *rows))
    }

    fn get(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        self.read(|rows| rows.get(&id).cloned())
    }

    fn find(&self, predicate: impl Fn(&E) -> bool) -> Result<Option<E>, StoreError> {
        self.read(|rows| rows.values().find(|row| predicate(*row)).cloned())
    }

    fn filter(&self, predicate: impl Fn(&E) -> bool) -> Result<Vec<E>, StoreError> {
        self.read(|rows| rows.values().filter(|row| predicate(*row)).cloned().collect())
    }

    fn remove(&self, id: E::Id) -> Result<bool, StoreError> {
        self.write(|rows| rows.remove(&id).is_some())
    }
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

fn sorted_by_creation<E, K: Ord>(mut rows: Vec<E>, key: impl Fn(&E) -> K) -> Vec<E> {
    rows.sort_by_key(|row| key(row));
    rows
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory user store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Table<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn phone_taken(rows: &HashMap<UserId, User>, user: &User) -> bool {
    rows.values().any(|other| {
        other.id != user.id
            && other.phone_number == user.phone_number
            && other.country_code == user.country_code
    })
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.users.get(id)
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, StoreError> {
        self.users.find(|user| user.owns(phone))
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.users.write(|rows| {
            if rows.contains_key(&user.id) {
                return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
            }
            if phone_taken(rows, user) {
                return Err(StoreError::Conflict(format!(
                    "phone number {} ({}) already registered",
                    user.phone_number, user.country_code
                )));
            }
            rows.insert(user.id, user.clone());
            Ok(())
        })?
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        self.users.write(|rows| {
            if !rows.contains_key(&user.id) {
                return Err(StoreError::NotFound(format!("user {}", user.id)));
            }
            if phone_taken(rows, user) {
                return Err(StoreError::Conflict(format!(
                    "phone number {} ({}) already registered",
                    user.phone_number, user.country_code
                )));
            }
            rows.insert(user.id, user.clone());
            Ok(())
        })?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification codes
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory verification code store.
#[derive(Debug, Default)]
pub struct InMemoryVerificationCodeStore {
    codes: Table<VerificationCode>,
}

impl InMemoryVerificationCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.codes.read(|rows| rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }
}

fn same_phone(code: &VerificationCode, phone: &PhoneNumber) -> bool {
    code.phone_number == phone.number && code.country_code == phone.country_code
}

#[async_trait]
impl VerificationCodeStore for InMemoryVerificationCodeStore {
    async fn find_by_verification(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError> {
        self.codes
            .find(|row| row.verification_id == verification_id && row.code == code)
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<VerificationCode>, StoreError> {
        self.codes.find(|row| same_phone(row, phone))
    }

    async fn replace_for_phone(&self, code: &VerificationCode) -> Result<(), StoreError> {
        let phone = code.phone();
        self.codes.write(|rows| {
            rows.retain(|_, row| !same_phone(row, &phone));
            rows.insert(code.id, code.clone());
        })
    }

    async fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<u64, StoreError> {
        self.codes.write(|rows| {
            let before = rows.len();
            rows.retain(|_, row| !same_phone(row, phone));
            (before - rows.len()) as u64
        })
    }

    async fn delete_by_id(&self, id: VerificationCodeId) -> Result<bool, StoreError> {
        self.codes.remove(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employees
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    employees: Table<Employee>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn already_employed(rows: &HashMap<EmployeeId, Employee>, employee: &Employee) -> bool {
    let Some(user_id) = employee.user_id else {
        return false;
    };
    rows.values().any(|other| {
        other.id != employee.id
            && other.location_id == employee.location_id
            && other.user_id == Some(user_id)
    })
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        self.employees.get(id)
    }

    async fn find_by_user_and_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<Option<Employee>, StoreError> {
        self.employees
            .find(|row| row.user_id == Some(user_id) && row.location_id == location_id)
    }

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<Employee>, StoreError> {
        let rows = self.employees.filter(|row| row.location_id == location_id)?;
        Ok(sorted_by_creation(rows, |row| (row.created_at, row.id.to_string())))
    }

    async fn list_with_role(&self, role_id: EmployeeRoleId) -> Result<Vec<Employee>, StoreError> {
        let rows = self.employees.filter(|row| row.employee_role_id == role_id)?;
        Ok(sorted_by_creation(rows, |row| (row.created_at, row.id.to_string())))
    }

    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        self.employees.write(|rows| {
            if rows.contains_key(&employee.id) || already_employed(rows, employee) {
                return Err(StoreError::Conflict(format!(
                    "employee {} already exists at location {}",
                    employee.id, employee.location_id
                )));
            }
            rows.insert(employee.id, employee.clone());
            Ok(())
        })?
    }

    async fn update(&self, employee: &Employee) -> Result<(), StoreError> {
        self.employees.write(|rows| {
            if !rows.contains_key(&employee.id) {
                return Err(StoreError::NotFound(format!("employee {}", employee.id)));
            }
            if already_employed(rows, employee) {
                return Err(StoreError::Conflict(format!(
                    "user already employed at location {}",
                    employee.location_id
                )));
            }
            rows.insert(employee.id, employee.clone());
            Ok(())
        })?
    }

    async fn delete(&self, id: EmployeeId) -> Result<bool, StoreError> {
        self.employees.remove(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employee roles
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryEmployeeRoleStore {
    roles: Table<EmployeeRole>,
}

impl InMemoryEmployeeRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeRoleStore for InMemoryEmployeeRoleStore {
    async fn get(&self, id: EmployeeRoleId) -> Result<Option<EmployeeRole>, StoreError> {
        self.roles.get(id)
    }

    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<EmployeeRole>, StoreError> {
        let rows = self.roles.filter(|row| row.location_id == location_id)?;
        Ok(sorted_by_creation(rows, |row| (row.created_at, row.id.to_string())))
    }

    async fn insert(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        self.roles.write(|rows| {
            if rows.contains_key(&role.id) {
                return Err(StoreError::Conflict(format!("employee role {} already exists", role.id)));
            }
            rows.insert(role.id, role.clone());
            Ok(())
        })?
    }

    async fn update(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        self.roles.write(|rows| match rows.get_mut(&role.id) {
            Some(existing) => {
                *existing = role.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("employee role {}", role.id))),
        })?
    }

    async fn delete(&self, id: EmployeeRoleId) -> Result<bool, StoreError> {
        self.roles.remove(id)
    }
}
