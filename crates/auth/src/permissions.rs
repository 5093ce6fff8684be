use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Elementary authorizable action.
///
/// Operations are statically enumerated; services name the one they perform
/// and ask the actor whether it holds it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    UpdateLocation,
    CreateEmployeeRole,
    ReadEmployeeRole,
    UpdateEmployeeRole,
    DeleteEmployeeRole,
    CreateEmployee,
    ReadEmployee,
    UpdateEmployee,
    DeleteEmployee,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::UpdateLocation,
        Operation::CreateEmployeeRole,
        Operation::ReadEmployeeRole,
        Operation::UpdateEmployeeRole,
        Operation::DeleteEmployeeRole,
        Operation::CreateEmployee,
        Operation::ReadEmployee,
        Operation::UpdateEmployee,
        Operation::DeleteEmployee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::UpdateLocation => "update_location",
            Operation::CreateEmployeeRole => "create_employee_role",
            Operation::ReadEmployeeRole => "read_employee_role",
            Operation::UpdateEmployeeRole => "update_employee_role",
            Operation::DeleteEmployeeRole => "delete_employee_role",
            Operation::CreateEmployee => "create_employee",
            Operation::ReadEmployee => "read_employee",
            Operation::UpdateEmployee => "update_employee",
            Operation::DeleteEmployee => "delete_employee",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable permission identifier, as stored on employee roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(Cow<'static, str>);

impl PermissionId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named bundle of operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: Cow<'static, str>,
    pub operations: Vec<Operation>,
}

impl Permission {
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            id: PermissionId::new(id),
            name: name.into(),
            operations,
        }
    }

    pub fn grants(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }
}
