//! Persistence boundary for identities, verification codes and roles.
//!
//! One trait per entity, each with an in-memory implementation (tests/dev) and
//! a Postgres implementation. `DeadlineStore` bounds any of them in time.

pub mod deadline;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use deadline::DeadlineStore;
pub use in_memory::{
    InMemoryEmployeeRoleStore, InMemoryEmployeeStore, InMemoryUserStore, InMemoryVerificationCodeStore,
};
pub use postgres::{
    PostgresEmployeeRoleStore, PostgresEmployeeStore, PostgresUserStore, PostgresVerificationCodeStore,
    apply_schema,
};
pub use r#trait::{EmployeeRoleStore, EmployeeStore, StoreError, UserStore, VerificationCodeStore};
