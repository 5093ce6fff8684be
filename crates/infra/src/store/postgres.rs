//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | RowNotFound | N/A | `NotFound` |
//! | Anything else | Any | `Database` (surfaced as `Unexpected`) |
//!
//! ## Thread Safety
//!
//! Every store is `Send + Sync` and cheap to clone; they share the SQLx pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use staffgate_auth::{
    Employee, EmployeeRole, PermissionId, PhoneNumber, User, VerificationCode, VerificationPurpose,
};
use staffgate_core::{EmployeeId, EmployeeRoleId, LocationId, UserId, VerificationCodeId};

use super::r#trait::{EmployeeRoleStore, EmployeeStore, StoreError, UserStore, VerificationCodeStore};

const SCHEMA: &str = include_str!("schema.sql");

/// Create the tables and indexes if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const USER_COLUMNS: &str = "id, full_name, phone_number, country_code, profile_image_id, \
                            is_phone_number_verified, created_at, updated_at";

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        decode_optional::<UserRow, _>("get_user", row)
    }

    #[instrument(skip(self, phone), fields(country_code = %phone.country_code), err)]
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1 AND country_code = $2"
        ))
        .bind(&phone.number)
        .bind(&phone.country_code)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_phone", e))?;

        decode_optional::<UserRow, _>("find_user_by_phone", row)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                full_name,
                phone_number,
                country_code,
                profile_image_id,
                is_phone_number_verified,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.country_code)
        .bind(&user.profile_image_id)
        .bind(user.is_phone_number_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                full_name = $2,
                phone_number = $3,
                country_code = $4,
                profile_image_id = $5,
                is_phone_number_verified = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.country_code)
        .bind(&user.profile_image_id)
        .bind(user.is_phone_number_verified)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification codes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresVerificationCodeStore {
    pool: Arc<PgPool>,
}

impl PostgresVerificationCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const CODE_COLUMNS: &str = "id, user_id, code, verification_id, purpose, phone_number, \
                            country_code, created_at, expires_at";

#[async_trait]
impl VerificationCodeStore for PostgresVerificationCodeStore {
    #[instrument(skip(self, verification_id, code), err)]
    async fn find_by_verification(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CODE_COLUMNS} FROM verification_codes WHERE verification_id = $1 AND code = $2"
        ))
        .bind(verification_id)
        .bind(code)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_code_by_verification", e))?;

        decode_optional::<VerificationCodeRow, _>("find_code_by_verification", row)
    }

    #[instrument(skip(self, phone), fields(country_code = %phone.country_code), err)]
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<VerificationCode>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CODE_COLUMNS} FROM verification_codes WHERE phone_number = $1 AND country_code = $2"
        ))
        .bind(&phone.number)
        .bind(&phone.country_code)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_code_by_phone", e))?;

        decode_optional::<VerificationCodeRow, _>("find_code_by_phone", row)
    }

    /// One upsert on the per-phone unique constraint, so two concurrent issues
    /// for the same phone leave exactly one row behind.
    #[instrument(
        skip(self, code),
        fields(code_id = %code.id, purpose = %code.purpose),
        err
    )]
    async fn replace_for_phone(&self, code: &VerificationCode) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO verification_codes (
                id,
                user_id,
                code,
                verification_id,
                purpose,
                phone_number,
                country_code,
                created_at,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (phone_number, country_code) DO UPDATE SET
                id = EXCLUDED.id,
                user_id = EXCLUDED.user_id,
                code = EXCLUDED.code,
                verification_id = EXCLUDED.verification_id,
                purpose = EXCLUDED.purpose,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(code.id.as_uuid())
        .bind(code.user_id.as_uuid())
        .bind(&code.code)
        .bind(&code.verification_id)
        .bind(code.purpose.as_str())
        .bind(&code.phone_number)
        .bind(&code.country_code)
        .bind(code.created_at)
        .bind(code.expires_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("replace_code_for_phone", e))?;

        Ok(())
    }

    #[instrument(skip(self, phone), fields(country_code = %phone.country_code), err)]
    async fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM verification_codes WHERE phone_number = $1 AND country_code = $2",
        )
        .bind(&phone.number)
        .bind(&phone.country_code)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_code_by_phone", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(code_id = %id), err)]
    async fn delete_by_id(&self, id: VerificationCodeId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_code_by_id", e))?;

        Ok(result.rows_affected() == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employees
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresEmployeeStore {
    pool: Arc<PgPool>,
}

impl PostgresEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_all(
        &self,
        operation: &'static str,
        filter: &str,
        id: Uuid,
    ) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE {filter} ORDER BY created_at, id"
        ))
        .bind(id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

        decode_all::<EmployeeRow, _>(operation, rows)
    }
}

const EMPLOYEE_COLUMNS: &str = "id, location_id, user_id, name, profile_image_id, \
                                employee_role_id, created_at, updated_at";

#[async_trait]
impl EmployeeStore for PostgresEmployeeStore {
    #[instrument(skip(self), fields(employee_id = %id), err)]
    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_employee", e))?;

        decode_optional::<EmployeeRow, _>("get_employee", row)
    }

    #[instrument(skip(self), fields(user_id = %user_id, location_id = %location_id), err)]
    async fn find_by_user_and_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE user_id = $1 AND location_id = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_employee_by_user_and_location", e))?;

        decode_optional::<EmployeeRow, _>("find_employee_by_user_and_location", row)
    }

    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<Employee>, StoreError> {
        self.fetch_all("list_employees_for_location", "location_id = $1", location_id.into())
            .await
    }

    #[instrument(skip(self), fields(role_id = %role_id), err)]
    async fn list_with_role(&self, role_id: EmployeeRoleId) -> Result<Vec<Employee>, StoreError> {
        self.fetch_all("list_employees_with_role", "employee_role_id = $1", role_id.into())
            .await
    }

    #[instrument(skip(self, employee), fields(employee_id = %employee.id), err)]
    async fn insert(&self, employee: &Employee) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employees (
                id,
                location_id,
                user_id,
                name,
                profile_image_id,
                employee_role_id,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(employee.id.as_uuid())
        .bind(employee.location_id.as_uuid())
        .bind(employee.user_id.map(Uuid::from))
        .bind(&employee.name)
        .bind(&employee.profile_image_id)
        .bind(employee.employee_role_id.as_uuid())
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_employee", e))?;

        Ok(())
    }

    #[instrument(skip(self, employee), fields(employee_id = %employee.id), err)]
    async fn update(&self, employee: &Employee) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE employees SET
                user_id = $2,
                name = $3,
                profile_image_id = $4,
                employee_role_id = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(employee.id.as_uuid())
        .bind(employee.user_id.map(Uuid::from))
        .bind(&employee.name)
        .bind(&employee.profile_image_id)
        .bind(employee.employee_role_id.as_uuid())
        .bind(employee.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_employee", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("employee {}", employee.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(employee_id = %id), err)]
    async fn delete(&self, id: EmployeeId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_employee", e))?;

        Ok(result.rows_affected() == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employee roles
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresEmployeeRoleStore {
    pool: Arc<PgPool>,
}

impl PostgresEmployeeRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const ROLE_COLUMNS: &str = "id, location_id, name, permission_ids, created_at, updated_at";

fn permission_strings(ids: &[PermissionId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}

#[async_trait]
impl EmployeeRoleStore for PostgresEmployeeRoleStore {
    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn get(&self, id: EmployeeRoleId) -> Result<Option<EmployeeRole>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM employee_roles WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_employee_role", e))?;

        decode_optional::<EmployeeRoleRow, _>("get_employee_role", row)
    }

    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn list_for_location(&self, location_id: LocationId) -> Result<Vec<EmployeeRole>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ROLE_COLUMNS} FROM employee_roles WHERE location_id = $1 ORDER BY created_at, id"
        ))
        .bind(location_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_employee_roles", e))?;

        decode_all::<EmployeeRoleRow, _>("list_employee_roles", rows)
    }

    #[instrument(skip(self, role), fields(role_id = %role.id, name = %role.name), err)]
    async fn insert(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employee_roles (
                id,
                location_id,
                name,
                permission_ids,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(role.location_id.as_uuid())
        .bind(&role.name)
        .bind(permission_strings(&role.permission_ids))
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_employee_role", e))?;

        Ok(())
    }

    #[instrument(skip(self, role), fields(role_id = %role.id), err)]
    async fn update(&self, role: &EmployeeRole) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE employee_roles SET
                name = $2,
                permission_ids = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(&role.name)
        .bind(permission_strings(&role.permission_ids))
        .bind(role.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_employee_role", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("employee role {}", role.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn delete(&self, id: EmployeeRoleId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM employee_roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_employee_role", e))?;

        Ok(result.rows_affected() == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        let detail = match &err {
            sqlx::Error::Database(db_err) => db_err.message().to_string(),
            other => other.to_string(),
        };
        return StoreError::Conflict(format!("{operation}: {detail}"));
    }

    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(operation.to_string()),
        source => StoreError::Database { operation, source },
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn decode_optional<R, T>(
    operation: &'static str,
    row: Option<sqlx::postgres::PgRow>,
) -> Result<Option<T>, StoreError>
where
    R: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Into<T>,
{
    row.map(|row| R::from_row(&row).map(Into::into))
        .transpose()
        .map_err(|e| map_sqlx_error(operation, e))
}

fn decode_all<R, T>(operation: &'static str, rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<T>, StoreError>
where
    R: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Into<T>,
{
    rows.iter()
        .map(|row| R::from_row(row).map(Into::into))
        .collect::<Result<Vec<T>, sqlx::Error>>()
        .map_err(|e| map_sqlx_error(operation, e))
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    full_name: String,
    phone_number: String,
    country_code: String,
    profile_image_id: String,
    is_phone_number_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            phone_number: row.try_get("phone_number")?,
            country_code: row.try_get("country_code")?,
            profile_image_id: row.try_get("profile_image_id")?,
            is_phone_number_verified: row.try_get("is_phone_number_verified")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            full_name: row.full_name,
            phone_number: row.phone_number,
            country_code: row.country_code,
            profile_image_id: row.profile_image_id,
            is_phone_number_verified: row.is_phone_number_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct VerificationCodeRow {
    id: Uuid,
    user_id: Uuid,
    code: String,
    verification_id: String,
    purpose: VerificationPurpose,
    phone_number: String,
    country_code: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for VerificationCodeRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        let purpose: String = row.try_get("purpose")?;
        let purpose = VerificationPurpose::parse(&purpose).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "purpose".to_string(),
            source: format!("unknown verification purpose '{purpose}'").into(),
        })?;

        Ok(VerificationCodeRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            code: row.try_get("code")?,
            verification_id: row.try_get("verification_id")?,
            purpose,
            phone_number: row.try_get("phone_number")?,
            country_code: row.try_get("country_code")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

impl From<VerificationCodeRow> for VerificationCode {
    fn from(row: VerificationCodeRow) -> Self {
        VerificationCode {
            id: VerificationCodeId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            code: row.code,
            verification_id: row.verification_id,
            purpose: row.purpose,
            phone_number: row.phone_number,
            country_code: row.country_code,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug)]
struct EmployeeRow {
    id: Uuid,
    location_id: Uuid,
    user_id: Option<Uuid>,
    name: String,
    profile_image_id: String,
    employee_role_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for EmployeeRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(EmployeeRow {
            id: row.try_get("id")?,
            location_id: row.try_get("location_id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            profile_image_id: row.try_get("profile_image_id")?,
            employee_role_id: row.try_get("employee_role_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: EmployeeId::from_uuid(row.id),
            location_id: LocationId::from_uuid(row.location_id),
            user_id: row.user_id.map(UserId::from_uuid),
            name: row.name,
            profile_image_id: row.profile_image_id,
            employee_role_id: EmployeeRoleId::from_uuid(row.employee_role_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct EmployeeRoleRow {
    id: Uuid,
    location_id: Uuid,
    name: String,
    permission_ids: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for EmployeeRoleRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(EmployeeRoleRow {
            id: row.try_get("id")?,
            location_id: row.try_get("location_id")?,
            name: row.try_get("name")?,
            permission_ids: row.try_get("permission_ids")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<EmployeeRoleRow> for EmployeeRole {
    fn from(row: EmployeeRoleRow) -> Self {
        EmployeeRole {
            id: EmployeeRoleId::from_uuid(row.id),
            location_id: LocationId::from_uuid(row.location_id),
            name: row.name,
            permission_ids: row.permission_ids.into_iter().map(PermissionId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
