use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use staffgate_auth::{
    Actor, DEFAULT_ROLES, EmployeeRole, OWNER_ROLE_NAME, Operation, PermissionId, PermissionRegistry,
};
use staffgate_core::{AppError, AppResult, Clock, EmployeeRoleId, LocationId};

use super::permission::{require, require_location};
use super::store_failure;
use crate::store::{EmployeeRoleStore, EmployeeStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEmployeeRole {
    pub name: String,
    pub permission_ids: Vec<String>,
}

/// Empty `name` keeps the current one; `None` keeps the permission set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEmployeeRole {
    pub name: String,
    pub permission_ids: Option<Vec<String>>,
}

pub struct EmployeeRoleService {
    roles: Arc<dyn EmployeeRoleStore>,
    employees: Arc<dyn EmployeeStore>,
    registry: Arc<PermissionRegistry>,
    clock: Arc<dyn Clock>,
}

impl EmployeeRoleService {
    pub fn new(
        roles: Arc<dyn EmployeeRoleStore>,
        employees: Arc<dyn EmployeeStore>,
        registry: Arc<PermissionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            roles,
            employees,
            registry,
            clock,
        }
    }

    pub async fn get(&self, actor: &Actor, id: EmployeeRoleId) -> AppResult<EmployeeRole> {
        const OP: &str = "employee_roles.get";
        require(actor, Operation::ReadEmployeeRole, OP)?;

        self.load(actor, id, OP).await
    }

    pub async fn list_for_location(&self, actor: &Actor) -> AppResult<Vec<EmployeeRole>> {
        const OP: &str = "employee_roles.list_for_location";
        require(actor, Operation::ReadEmployeeRole, OP)?;

        self.roles
            .list_for_location(actor.location_id())
            .await
            .map_err(|e| store_failure(OP, "failed to list employee roles", e))
    }

    pub async fn create(&self, actor: &Actor, input: CreateEmployeeRole) -> AppResult<EmployeeRole> {
        const OP: &str = "employee_roles.create";
        require(actor, Operation::CreateEmployeeRole, OP)?;

        let name = role_name(&input.name, OP)?.ok_or_else(|| AppError::invalid(OP, "name is required"))?;
        let permission_ids = self.permission_ids(&input.permission_ids, OP)?;

        let role = EmployeeRole::new(actor.location_id(), name, permission_ids, self.clock.now());
        self.roles
            .insert(&role)
            .await
            .map_err(|e| store_failure(OP, "failed to create employee role", e))?;

        info!(role_id = %role.id, location_id = %role.location_id, "employee role created");
        Ok(role)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: EmployeeRoleId,
        input: UpdateEmployeeRole,
    ) -> AppResult<EmployeeRole> {
        const OP: &str = "employee_roles.update";
        require(actor, Operation::UpdateEmployeeRole, OP)?;

        let mut role = self.load(actor, id, OP).await?;
        if role.is_owner() {
            return Err(AppError::invalid(OP, "the owner role cannot be updated"));
        }

        if let Some(name) = role_name(&input.name, OP)? {
            role.name = name.to_string();
        }
        if let Some(ids) = &input.permission_ids {
            role.permission_ids = self.permission_ids(ids, OP)?;
        }
        role.updated_at = self.clock.now();

        self.roles
            .update(&role)
            .await
            .map_err(|e| store_failure(OP, "failed to update employee role", e))?;
        Ok(role)
    }

    /// Returns the removed role.
    pub async fn delete(&self, actor: &Actor, id: EmployeeRoleId) -> AppResult<EmployeeRole> {
        const OP: &str = "employee_roles.delete";
        require(actor, Operation::DeleteEmployeeRole, OP)?;

        let role = self.load(actor, id, OP).await?;
        if role.is_owner() {
            return Err(AppError::invalid(OP, "the owner role cannot be deleted"));
        }

        let holders = self
            .employees
            .list_with_role(role.id)
            .await
            .map_err(|e| store_failure(OP, "failed to list employees by role", e))?;
        if !holders.is_empty() {
            return Err(AppError::invalid(OP, "employee role is still assigned to employees"));
        }

        if !self
            .roles
            .delete(role.id)
            .await
            .map_err(|e| store_failure(OP, "failed to delete employee role", e))?
        {
            return Err(AppError::not_found(OP));
        }

        info!(role_id = %role.id, location_id = %role.location_id, "employee role deleted");
        Ok(role)
    }

    /// Create the default role set for a new location.
    pub async fn seed_default_roles(&self, location_id: LocationId) -> AppResult<Vec<EmployeeRole>> {
        const OP: &str = "employee_roles.seed_default_roles";

        let now = self.clock.now();
        let mut seeded = Vec::with_capacity(DEFAULT_ROLES.len());
        for template in &DEFAULT_ROLES {
            let role = EmployeeRole::new(location_id, template.name, template.permission_ids(), now);
            self.roles
                .insert(&role)
                .await
                .map_err(|e| store_failure(OP, "failed to create default employee role", e))?;
            seeded.push(role);
        }

        info!(location_id = %location_id, count = seeded.len(), "default employee roles seeded");
        Ok(seeded)
    }

    async fn load(&self, actor: &Actor, id: EmployeeRoleId, op: &'static str) -> AppResult<EmployeeRole> {
        let role = self
            .roles
            .get(id)
            .await
            .map_err(|e| store_failure(op, "failed to get employee role by id", e))?
            .ok_or_else(|| AppError::not_found(op))?;

        require_location(actor, role.location_id, op)?;
        Ok(role)
    }

    /// Caller-supplied ids must all be registered. Duplicates collapse.
    fn permission_ids(&self, raw: &[String], op: &'static str) -> AppResult<Vec<PermissionId>> {
        let mut ids: Vec<PermissionId> = Vec::with_capacity(raw.len());
        for id in raw {
            let id = PermissionId::new(id.trim().to_string());
            if self.registry.get(&id).is_none() {
                return Err(AppError::invalid(op, format!("permission '{id}' not found")));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

/// Trimmed name, `None` when blank. The owner name is reserved.
fn role_name<'a>(raw: &'a str, op: &'static str) -> AppResult<Option<&'a str>> {
    let name = raw.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if name == OWNER_ROLE_NAME {
        return Err(AppError::invalid(op, "role name 'owner' is reserved"));
    }
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use staffgate_auth::{Employee, registry::ids};
    use staffgate_core::{ErrorKind, FixedClock, UserId};

    use crate::store::{InMemoryEmployeeRoleStore, InMemoryEmployeeStore};

    struct Fixture {
        service: EmployeeRoleService,
        employees: Arc<InMemoryEmployeeStore>,
        registry: Arc<PermissionRegistry>,
        location_id: LocationId,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(PermissionRegistry::standard());
        let employees = Arc::new(InMemoryEmployeeStore::new());
        let service = EmployeeRoleService::new(
            Arc::new(InMemoryEmployeeRoleStore::new()),
            employees.clone(),
            registry.clone(),
            Arc::new(FixedClock::new(Utc::now())),
        );
        Fixture {
            service,
            employees,
            registry,
            location_id: LocationId::new(),
        }
    }

    fn actor_with(f: &Fixture, permission_ids: &[&'static str]) -> Actor {
        let ids: Vec<PermissionId> = permission_ids.iter().map(|id| PermissionId::new(*id)).collect();
        Actor::new(f.location_id, &f.registry.resolve(&ids).unwrap())
    }

    fn admin(f: &Fixture) -> Actor {
        actor_with(f, &[ids::MANAGE_EMPLOYEE_ROLE])
    }

    fn create(name: &str, permission_ids: &[&str]) -> CreateEmployeeRole {
        CreateEmployeeRole {
            name: name.to_string(),
            permission_ids: permission_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn create_and_read_back() {
        let f = fixture();
        let actor = admin(&f);

        let role = f
            .service
            .create(&actor, create("  cashier ", &[ids::MANAGE_EMPLOYEE, ids::MANAGE_EMPLOYEE]))
            .await
            .unwrap();
        assert_eq!(role.name, "cashier");
        assert_eq!(role.permission_ids, vec![PermissionId::new(ids::MANAGE_EMPLOYEE)]);

        assert_eq!(f.service.get(&actor, role.id).await.unwrap(), role);
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let f = fixture();
        let actor = admin(&f);

        for input in [create("  ", &[]), create("owner", &[]), create("cashier", &["99"])] {
            let err = f.service.create(&actor, input).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Invalid);
        }
    }

    #[tokio::test]
    async fn operations_require_the_role_permission() {
        let f = fixture();
        let actor = actor_with(&f, &[ids::MANAGE_LOCATION]);

        let err = f.service.create(&actor, create("cashier", &[])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = f.service.list_for_location(&actor).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn roles_of_another_location_are_off_limits() {
        let f = fixture();
        let role = f
            .service
            .create(&admin(&f), create("cashier", &[]))
            .await
            .unwrap();

        let stranger = Actor::new(
            LocationId::new(),
            &f.registry.resolve(&[PermissionId::new(ids::MANAGE_EMPLOYEE_ROLE)]).unwrap(),
        );
        let err = f.service.get(&stranger, role.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn update_keeps_blank_name_and_missing_permissions() {
        let f = fixture();
        let actor = admin(&f);
        let role = f
            .service
            .create(&actor, create("cashier", &[ids::MANAGE_LOCATION]))
            .await
            .unwrap();

        let renamed = f
            .service
            .update(
                &actor,
                role.id,
                UpdateEmployeeRole {
                    name: "till".to_string(),
                    permission_ids: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "till");
        assert_eq!(renamed.permission_ids, role.permission_ids);

        let regranted = f
            .service
            .update(
                &actor,
                role.id,
                UpdateEmployeeRole {
                    name: String::new(),
                    permission_ids: Some(Vec::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(regranted.name, "till");
        assert!(regranted.permission_ids.is_empty());
    }

    #[tokio::test]
    async fn owner_role_is_immutable() {
        let f = fixture();
        let actor = actor_with(&f, &[ids::MANAGE_EMPLOYEE_ROLE]);
        let seeded = f.service.seed_default_roles(f.location_id).await.unwrap();
        let owner = seeded.iter().find(|r| r.is_owner()).unwrap();

        let err = f
            .service
            .update(&actor, owner.id, UpdateEmployeeRole::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let err = f.service.delete(&actor, owner.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn assigned_role_cannot_be_deleted() {
        let f = fixture();
        let actor = admin(&f);
        let role = f.service.create(&actor, create("cashier", &[])).await.unwrap();

        let employee = Employee::new(f.location_id, Some(UserId::new()), "Lan", role.id, Utc::now());
        f.employees.insert(&employee).await.unwrap();

        let err = f.service.delete(&actor, role.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        f.employees.delete(employee.id).await.unwrap();
        let removed = f.service.delete(&actor, role.id).await.unwrap();
        assert_eq!(removed.id, role.id);
        assert_eq!(
            f.service.get(&actor, role.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn seeding_creates_the_default_set() {
        let f = fixture();
        let seeded = f.service.seed_default_roles(f.location_id).await.unwrap();

        let names: Vec<&str> = seeded.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["owner", "admin", "manager", "receptionist", "specialist"]);
        assert_eq!(
            f.service.list_for_location(&admin(&f)).await.unwrap().len(),
            DEFAULT_ROLES.len()
        );
    }
}
