use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staffgate_core::{EmployeeRoleId, Entity, LocationId};

use crate::permissions::PermissionId;
use crate::registry::ids;

/// Name of the role every location's creator holds. It cannot be edited or
/// removed.
pub const OWNER_ROLE_NAME: &str = "owner";

/// Location-scoped named set of permissions.
///
/// Only permission ids are stored; they are resolved through the
/// `PermissionRegistry` when an actor is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRole {
    pub id: EmployeeRoleId,
    pub location_id: LocationId,
    pub name: String,
    pub permission_ids: Vec<PermissionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeRole {
    pub fn new(
        location_id: LocationId,
        name: impl Into<String>,
        permission_ids: Vec<PermissionId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EmployeeRoleId::new(),
            location_id,
            name: name.into().trim().to_string(),
            permission_ids,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.name == OWNER_ROLE_NAME
    }
}

impl Entity for EmployeeRole {
    type Id = EmployeeRoleId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Role created for every new location.
#[derive(Debug, Clone, Copy)]
pub struct DefaultRole {
    pub name: &'static str,
    pub permission_ids: &'static [&'static str],
}

impl DefaultRole {
    pub fn permission_ids(&self) -> Vec<PermissionId> {
        self.permission_ids
            .iter()
            .map(|id| PermissionId::new(*id))
            .collect()
    }
}

pub const DEFAULT_ROLES: [DefaultRole; 5] = [
    DefaultRole {
        name: OWNER_ROLE_NAME,
        permission_ids: &[
            ids::MANAGE_LOCATION,
            ids::MANAGE_EMPLOYEE_ROLE,
            ids::MANAGE_EMPLOYEE,
        ],
    },
    DefaultRole {
        name: "admin",
        permission_ids: &[],
    },
    DefaultRole {
        name: "manager",
        permission_ids: &[],
    },
    DefaultRole {
        name: "receptionist",
        permission_ids: &[],
    },
    DefaultRole {
        name: "specialist",
        permission_ids: &[],
    },
];
