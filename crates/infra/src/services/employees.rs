use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use staffgate_auth::{Actor, Employee, EmployeeRole, OWNER_ROLE_NAME, Operation, User};
use staffgate_core::{AppError, AppResult, Clock, EmployeeId, EmployeeRoleId, LocationId, UserId};

use super::permission::{require, require_location};
use super::store_failure;
use crate::store::{EmployeeRoleStore, EmployeeStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub name: String,
    pub user_id: Option<UserId>,
    pub employee_role_id: EmployeeRoleId,
    #[serde(default)]
    pub profile_image_id: String,
}

/// Empty strings keep the current value; `None` keeps the role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEmployee {
    pub name: String,
    pub profile_image_id: String,
    pub employee_role_id: Option<EmployeeRoleId>,
}

pub struct EmployeeService {
    employees: Arc<dyn EmployeeStore>,
    roles: Arc<dyn EmployeeRoleStore>,
    clock: Arc<dyn Clock>,
}

impl EmployeeService {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        roles: Arc<dyn EmployeeRoleStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            employees,
            roles,
            clock,
        }
    }

    pub async fn get(&self, actor: &Actor, id: EmployeeId) -> AppResult<Employee> {
        const OP: &str = "employees.get";
        require(actor, Operation::ReadEmployee, OP)?;

        self.load(actor, id, OP).await
    }

    pub async fn list_for_location(&self, actor: &Actor) -> AppResult<Vec<Employee>> {
        const OP: &str = "employees.list_for_location";
        require(actor, Operation::ReadEmployee, OP)?;

        self.employees
            .list_for_location(actor.location_id())
            .await
            .map_err(|e| store_failure(OP, "failed to list employees", e))
    }

    pub async fn create(&self, actor: &Actor, input: CreateEmployee) -> AppResult<Employee> {
        const OP: &str = "employees.create";
        require(actor, Operation::CreateEmployee, OP)?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid(OP, "name is required"));
        }
        self.assignable_role(actor.location_id(), input.employee_role_id, OP)
            .await?;

        let mut employee = Employee::new(
            actor.location_id(),
            input.user_id,
            name,
            input.employee_role_id,
            self.clock.now(),
        );
        employee.profile_image_id = input.profile_image_id.trim().to_string();

        self.insert(&employee, OP).await?;
        Ok(employee)
    }

    pub async fn update(&self, actor: &Actor, id: EmployeeId, input: UpdateEmployee) -> AppResult<Employee> {
        const OP: &str = "employees.update";
        require(actor, Operation::UpdateEmployee, OP)?;

        let mut employee = self.load(actor, id, OP).await?;

        let name = input.name.trim();
        if !name.is_empty() {
            employee.name = name.to_string();
        }
        let profile_image_id = input.profile_image_id.trim();
        if !profile_image_id.is_empty() {
            employee.profile_image_id = profile_image_id.to_string();
        }
        if let Some(role_id) = input
            .employee_role_id
            .filter(|id| *id != employee.employee_role_id)
        {
            let current = self.role(employee.employee_role_id, OP).await?;
            if current.is_owner() {
                return Err(AppError::invalid(OP, "the owner's role cannot be changed"));
            }
            self.assignable_role(employee.location_id, role_id, OP).await?;
            employee.employee_role_id = role_id;
        }
        employee.updated_at = self.clock.now();

        self.employees
            .update(&employee)
            .await
            .map_err(|e| store_failure(OP, "failed to update employee", e))?;
        Ok(employee)
    }

    /// Returns the removed employee.
    pub async fn delete(&self, actor: &Actor, id: EmployeeId) -> AppResult<Employee> {
        const OP: &str = "employees.delete";
        require(actor, Operation::DeleteEmployee, OP)?;

        let employee = self.load(actor, id, OP).await?;
        if self.role(employee.employee_role_id, OP).await?.is_owner() {
            return Err(AppError::invalid(OP, "the location owner cannot be deleted"));
        }

        if !self
            .employees
            .delete(employee.id)
            .await
            .map_err(|e| store_failure(OP, "failed to delete employee", e))?
        {
            return Err(AppError::not_found(OP));
        }

        info!(employee_id = %employee.id, location_id = %employee.location_id, "employee deleted");
        Ok(employee)
    }

    /// Employ `user` at a freshly created location under its owner role.
    ///
    /// Requires the default roles to be seeded first.
    pub async fn create_owner(&self, location_id: LocationId, user: &User) -> AppResult<Employee> {
        const OP: &str = "employees.create_owner";

        let roles = self
            .roles
            .list_for_location(location_id)
            .await
            .map_err(|e| store_failure(OP, "failed to list employee roles", e))?;
        let owner_role = roles
            .iter()
            .find(|role| role.is_owner())
            .ok_or_else(|| AppError::invalid(OP, format!("location has no '{OWNER_ROLE_NAME}' role")))?;

        let name = if user.full_name.trim().is_empty() {
            user.phone_number.as_str()
        } else {
            user.full_name.as_str()
        };
        let mut employee = Employee::new(location_id, Some(user.id), name, owner_role.id, self.clock.now());
        employee.profile_image_id = user.profile_image_id.clone();

        self.insert(&employee, OP).await?;
        Ok(employee)
    }

    async fn insert(&self, employee: &Employee, op: &'static str) -> AppResult<()> {
        self.employees
            .insert(employee)
            .await
            .map_err(|e| store_failure(op, "failed to create employee", e))?;

        info!(employee_id = %employee.id, location_id = %employee.location_id, "employee created");
        Ok(())
    }

    async fn load(&self, actor: &Actor, id: EmployeeId, op: &'static str) -> AppResult<Employee> {
        let employee = self
            .employees
            .get(id)
            .await
            .map_err(|e| store_failure(op, "failed to get employee by id", e))?
            .ok_or_else(|| AppError::not_found(op))?;

        require_location(actor, employee.location_id, op)?;
        Ok(employee)
    }

    async fn role(&self, id: EmployeeRoleId, op: &'static str) -> AppResult<EmployeeRole> {
        self.roles
            .get(id)
            .await
            .map_err(|e| store_failure(op, "failed to get employee role by id", e))?
            .ok_or_else(|| {
                AppError::unexpected(
                    op,
                    "employee role not found",
                    anyhow::anyhow!("employee references missing role {id}"),
                )
            })
    }

    /// A role handed out through the API must exist in `location_id` and must
    /// not be the owner role.
    async fn assignable_role(
        &self,
        location_id: LocationId,
        id: EmployeeRoleId,
        op: &'static str,
    ) -> AppResult<EmployeeRole> {
        let role = self
            .roles
            .get(id)
            .await
            .map_err(|e| store_failure(op, "failed to get employee role by id", e))?
            .filter(|role| role.location_id == location_id)
            .ok_or_else(|| AppError::invalid(op, "employee role not found at this location"))?;

        if role.is_owner() {
            return Err(AppError::invalid(op, "the owner role cannot be assigned"));
        }
        Ok(role)
    }
}
