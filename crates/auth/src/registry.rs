//! Catalog of every permission the system knows about.
//!
//! The registry is built once at process start and shared read-only
//! (`Arc<PermissionRegistry>`) with every service that resolves permission ids.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::permissions::{Operation, Permission, PermissionId};

/// Stable ids of the built-in permissions.
pub mod ids {
    pub const MANAGE_LOCATION: &str = "1";
    pub const MANAGE_EMPLOYEE_ROLE: &str = "2";
    pub const MANAGE_EMPLOYEE: &str = "3";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("permission '{0}' not found")]
    UnknownPermission(PermissionId),

    #[error("permission '{0}' registered twice")]
    DuplicatePermission(PermissionId),
}

/// Immutable permission table: id → permission, operation → granting ids.
#[derive(Debug, Clone)]
pub struct PermissionRegistry {
    permissions: BTreeMap<PermissionId, Permission>,
    grants: HashMap<Operation, Vec<PermissionId>>,
}

impl PermissionRegistry {
    /// Build a registry from an explicit permission list.
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Result<Self, RegistryError> {
        let mut table = BTreeMap::new();
        for permission in permissions {
            if table.contains_key(&permission.id) {
                return Err(RegistryError::DuplicatePermission(permission.id));
            }
            table.insert(permission.id.clone(), permission);
        }

        Ok(Self::from_table(table))
    }

    fn from_table(table: BTreeMap<PermissionId, Permission>) -> Self {
        let mut grants: HashMap<Operation, Vec<PermissionId>> = HashMap::new();
        for permission in table.values() {
            for operation in &permission.operations {
                let granting = grants.entry(*operation).or_default();
                if !granting.contains(&permission.id) {
                    granting.push(permission.id.clone());
                }
            }
        }

        Self {
            permissions: table,
            grants,
        }
    }

    /// The built-in catalog.
    pub fn standard() -> Self {
        let catalog = [
            Permission::new(
                ids::MANAGE_LOCATION,
                "manage_location",
                vec![Operation::UpdateLocation],
            ),
            Permission::new(
                ids::MANAGE_EMPLOYEE_ROLE,
                "manage_employee_role",
                vec![
                    Operation::CreateEmployeeRole,
                    Operation::ReadEmployeeRole,
                    Operation::UpdateEmployeeRole,
                    Operation::DeleteEmployeeRole,
                ],
            ),
            Permission::new(
                ids::MANAGE_EMPLOYEE,
                "manage_employee",
                vec![
                    Operation::CreateEmployee,
                    Operation::ReadEmployee,
                    Operation::UpdateEmployee,
                    Operation::DeleteEmployee,
                ],
            ),
        ];

        Self::from_table(
            catalog
                .into_iter()
                .map(|permission| (permission.id.clone(), permission))
                .collect(),
        )
    }

    pub fn get(&self, id: &PermissionId) -> Option<&Permission> {
        self.permissions.get(id)
    }

    /// Map stored permission ids to full permissions.
    ///
    /// Fails on the first id the catalog does not contain.
    pub fn resolve(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, RegistryError> {
        ids.iter()
            .map(|id| {
                self.permissions
                    .get(id)
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownPermission(id.clone()))
            })
            .collect()
    }

    /// Ids of the permissions that grant `operation`.
    pub fn permissions_granting(&self, operation: Operation) -> &[PermissionId] {
        self.grants
            .get(&operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every registered id, in stable order.
    pub fn ids(&self) -> Vec<PermissionId> {
        self.permissions.keys().cloned().collect()
    }
}
