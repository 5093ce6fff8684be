use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staffgate_core::{EmployeeId, EmployeeRoleId, Entity, LocationId, UserId};

/// Binds an identity to a location and one employee role.
///
/// `user_id` is `None` for staff entries that have not been linked to a
/// phone-verified identity yet; such employees can never act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub location_id: LocationId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub profile_image_id: String,
    pub employee_role_id: EmployeeRoleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(
        location_id: LocationId,
        user_id: Option<UserId>,
        name: impl Into<String>,
        employee_role_id: EmployeeRoleId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EmployeeId::new(),
            location_id,
            user_id,
            name: name.into().trim().to_string(),
            profile_image_id: String::new(),
            employee_role_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
