use std::sync::Arc;

use staffgate_auth::{Actor, AuthzError, Operation, PermissionRegistry};
use staffgate_core::{AppError, AppResult, LocationId, UserId};

use super::store_failure;
use crate::store::{EmployeeRoleStore, EmployeeStore};

/// Builds actors from the caller's employee role at a location.
pub struct PermissionService {
    employees: Arc<dyn EmployeeStore>,
    roles: Arc<dyn EmployeeRoleStore>,
    registry: Arc<PermissionRegistry>,
}

impl PermissionService {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        roles: Arc<dyn EmployeeRoleStore>,
        registry: Arc<PermissionRegistry>,
    ) -> Self {
        Self {
            employees,
            roles,
            registry,
        }
    }

    pub async fn get_employee_actor(&self, user_id: UserId, location_id: LocationId) -> AppResult<Actor> {
        const OP: &str = "permission.get_employee_actor";

        let employee = self
            .employees
            .find_by_user_and_location(user_id, location_id)
            .await
            .map_err(|e| store_failure(OP, "failed to get employee by user and location", e))?
            .ok_or_else(|| AppError::not_found(OP))?;

        let role = self
            .roles
            .get(employee.employee_role_id)
            .await
            .map_err(|e| store_failure(OP, "failed to get employee role by id", e))?
            .ok_or_else(|| {
                AppError::unexpected(
                    OP,
                    "employee role not found",
                    anyhow::anyhow!(
                        "employee {} references missing role {}",
                        employee.id,
                        employee.employee_role_id
                    ),
                )
            })?;

        let permissions = self
            .registry
            .resolve(&role.permission_ids)
            .map_err(|e| AppError::unexpected(OP, "failed to get actor permissions", e))?;

        Ok(Actor::new(location_id, &permissions))
    }
}

/// Gate a privileged operation on the actor.
pub(crate) fn require(actor: &Actor, operation: Operation, op: &'static str) -> AppResult<()> {
    actor.can(operation).map_err(|e| {
        tracing::warn!(location_id = %actor.location_id(), operation = %operation, "operation denied");
        authz_failure(op, e)
    })
}

/// Gate access to an entity on the actor's location.
pub(crate) fn require_location(actor: &Actor, target: LocationId, op: &'static str) -> AppResult<()> {
    actor.ensure_location(target).map_err(|e| authz_failure(op, e))
}

fn authz_failure(op: &'static str, err: AuthzError) -> AppError {
    AppError::unauthorized(op, err.to_string())
}
