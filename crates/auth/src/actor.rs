use std::collections::BTreeSet;

use thiserror::Error;

use staffgate_core::LocationId;

use crate::permissions::{Operation, Permission, PermissionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing operation '{0}'")]
    Forbidden(Operation),

    #[error("location mismatch: actor acts in {actor}, target belongs to {target}")]
    LocationMismatch {
        actor: LocationId,
        target: LocationId,
    },
}

/// Request-scoped capability holder.
///
/// Built from the permissions of one employee role and never persisted. The
/// operation set is flattened at construction so `can` is a plain lookup:
/// no IO, no panics, deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    location_id: LocationId,
    permission_ids: Vec<PermissionId>,
    operations: BTreeSet<Operation>,
}

impl Actor {
    pub fn new(location_id: LocationId, permissions: &[Permission]) -> Self {
        let permission_ids = permissions.iter().map(|p| p.id.clone()).collect();
        let operations = permissions
            .iter()
            .flat_map(|p| p.operations.iter().copied())
            .collect();

        Self {
            location_id,
            permission_ids,
            operations,
        }
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn permission_ids(&self) -> &[PermissionId] {
        &self.permission_ids
    }

    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.operations.iter().copied()
    }

    /// Check that the actor holds `operation`.
    pub fn can(&self, operation: Operation) -> Result<(), AuthzError> {
        if self.operations.contains(&operation) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(operation))
        }
    }

    /// Check that a target entity lives in the location the actor acts in.
    pub fn ensure_location(&self, target: LocationId) -> Result<(), AuthzError> {
        if self.location_id == target {
            Ok(())
        } else {
            Err(AuthzError::LocationMismatch {
                actor: self.location_id,
                target,
            })
        }
    }
}
