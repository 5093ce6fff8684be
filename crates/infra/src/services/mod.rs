//! Application services and the wiring that builds them.

pub mod auth;
pub mod employee_roles;
pub mod employees;
pub mod identity;
pub mod permission;
pub mod verification;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::error;

use staffgate_auth::{CodeGenerator, Hs256TokenIssuer, NationalFormatNormalizer, PermissionRegistry};
use staffgate_core::{AppError, Clock, SystemClock};

pub use auth::AuthService;
pub use employee_roles::{CreateEmployeeRole, EmployeeRoleService, UpdateEmployeeRole};
pub use employees::{CreateEmployee, EmployeeService, UpdateEmployee};
pub use identity::IdentityResolver;
pub use permission::PermissionService;
pub use verification::{IssuedCode, VerificationCodeManager};

use crate::config::AppConfig;
use crate::external::{LogSmsSender, SmsSender, TwilioSmsSender};
use crate::store::{
    DeadlineStore, EmployeeRoleStore, EmployeeStore, InMemoryEmployeeRoleStore, InMemoryEmployeeStore,
    InMemoryUserStore, InMemoryVerificationCodeStore, PostgresEmployeeRoleStore, PostgresEmployeeStore,
    PostgresUserStore, PostgresVerificationCodeStore, StoreError, UserStore, VerificationCodeStore,
};

/// Translate a store failure into an application error.
///
/// `NotFound` and `Conflict` keep their meaning. Everything else is an
/// infrastructure fault and is logged here.
pub(crate) fn store_failure(op: &'static str, context: &str, err: StoreError) -> AppError {
    match err {
        StoreError::NotFound(_) => AppError::not_found(op),
        StoreError::Conflict(message) => AppError::conflict(op, message),
        other => {
            error!(op = op, error = %other, "{context}");
            AppError::unexpected(op, context.to_string(), other)
        }
    }
}

fn chrono_duration(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::seconds(i64::from(u32::MAX)))
}

/// One handle per persisted entity.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub codes: Arc<dyn VerificationCodeStore>,
    pub employees: Arc<dyn EmployeeStore>,
    pub roles: Arc<dyn EmployeeRoleStore>,
}

impl Stores {
    /// Fresh in-memory stores, each bounded by `timeout`.
    pub fn in_memory(timeout: std::time::Duration) -> Self {
        Self {
            users: Arc::new(DeadlineStore::new(InMemoryUserStore::new(), timeout)),
            codes: Arc::new(DeadlineStore::new(InMemoryVerificationCodeStore::new(), timeout)),
            employees: Arc::new(DeadlineStore::new(InMemoryEmployeeStore::new(), timeout)),
            roles: Arc::new(DeadlineStore::new(InMemoryEmployeeRoleStore::new(), timeout)),
        }
    }

    /// Postgres stores sharing `pool`, each bounded by `timeout`.
    pub fn postgres(pool: PgPool, timeout: std::time::Duration) -> Self {
        Self {
            users: Arc::new(DeadlineStore::new(PostgresUserStore::new(pool.clone()), timeout)),
            codes: Arc::new(DeadlineStore::new(
                PostgresVerificationCodeStore::new(pool.clone()),
                timeout,
            )),
            employees: Arc::new(DeadlineStore::new(PostgresEmployeeStore::new(pool.clone()), timeout)),
            roles: Arc::new(DeadlineStore::new(PostgresEmployeeRoleStore::new(pool), timeout)),
        }
    }
}

/// The full service graph.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<PermissionRegistry>,
    pub identity: Arc<IdentityResolver>,
    pub verification: Arc<VerificationCodeManager>,
    pub auth: Arc<AuthService>,
    pub permissions: Arc<PermissionService>,
    pub employee_roles: Arc<EmployeeRoleService>,
    pub employees: Arc<EmployeeService>,
}

impl Services {
    pub fn build(stores: Stores, sms: Arc<dyn SmsSender>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let registry = Arc::new(PermissionRegistry::standard());

        let identity = Arc::new(IdentityResolver::new(
            stores.users.clone(),
            Arc::new(NationalFormatNormalizer),
            clock.clone(),
        ));
        let verification = Arc::new(VerificationCodeManager::new(
            stores.codes.clone(),
            CodeGenerator::new(config.verification_code_digits, config.verification_id_length),
            chrono_duration(config.verification_code_ttl),
            clock.clone(),
        ));
        let tokens = Arc::new(Hs256TokenIssuer::with_clock(&config.jwt_secret, clock.clone()));

        let auth = Arc::new(AuthService::new(
            identity.clone(),
            verification.clone(),
            sms,
            tokens,
            clock.clone(),
            chrono_duration(config.access_token_ttl),
        ));
        let permissions = Arc::new(PermissionService::new(
            stores.employees.clone(),
            stores.roles.clone(),
            registry.clone(),
        ));
        let employee_roles = Arc::new(EmployeeRoleService::new(
            stores.roles.clone(),
            stores.employees.clone(),
            registry.clone(),
            clock.clone(),
        ));
        let employees = Arc::new(EmployeeService::new(stores.employees, stores.roles, clock));

        Self {
            registry,
            identity,
            verification,
            auth,
            permissions,
            employee_roles,
            employees,
        }
    }

    /// In-memory stores; Twilio when configured, log sender otherwise.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::build(
            Stores::in_memory(config.store_timeout),
            sms_sender(config),
            Arc::new(SystemClock),
            config,
        )
    }

    pub fn postgres(pool: PgPool, config: &AppConfig) -> Self {
        Self::build(
            Stores::postgres(pool, config.store_timeout),
            sms_sender(config),
            Arc::new(SystemClock),
            config,
        )
    }
}

fn sms_sender(config: &AppConfig) -> Arc<dyn SmsSender> {
    match &config.twilio {
        Some(options) => Arc::new(TwilioSmsSender::new(options.clone())),
        None => {
            tracing::warn!("Twilio not configured; verification codes go to the log");
            Arc::new(LogSmsSender)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgate_auth::{ProfileUpdate, registry::ids};
    use staffgate_core::{ErrorKind, LocationId};

    use crate::external::RecordingSmsSender;

    #[test]
    fn store_failures_keep_or_hide_their_meaning() {
        assert_eq!(
            store_failure("t", "ctx", StoreError::NotFound("x".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            store_failure("t", "ctx", StoreError::Conflict("x".into())).kind(),
            ErrorKind::Conflict
        );
        let hidden = store_failure("t", "ctx", StoreError::Timeout { operation: "users.get" });
        assert_eq!(hidden.kind(), ErrorKind::Unexpected);
        assert_eq!(hidden.public_message(), staffgate_core::INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        assert_eq!(chrono_duration(std::time::Duration::from_secs(600)), chrono::Duration::minutes(10));
        assert!(chrono_duration(std::time::Duration::MAX) > chrono::Duration::days(365));
    }

    #[tokio::test]
    async fn login_then_act_as_location_owner() {
        staffgate_observability::init();
        let config = AppConfig::default();
        let sms = Arc::new(RecordingSmsSender::new());
        let services = Services::build(
            Stores::in_memory(config.store_timeout),
            sms.clone(),
            Arc::new(SystemClock),
            &config,
        );

        let verification_id = services.auth.login_verify("999111333", "VN").await.unwrap();
        let code = sms.last().unwrap().text;
        let token = services.auth.login_check(&verification_id, &code).await.unwrap();
        let user = services.auth.current_user(&token).await.unwrap();
        let user = services
            .auth
            .update_profile(
                &user,
                &ProfileUpdate {
                    full_name: "Lan".to_string(),
                    profile_image_id: String::new(),
                },
            )
            .await
            .unwrap();

        let location_id = LocationId::new();
        services.employee_roles.seed_default_roles(location_id).await.unwrap();
        services.employees.create_owner(location_id, &user).await.unwrap();

        let actor = services
            .permissions
            .get_employee_actor(user.id, location_id)
            .await
            .unwrap();
        assert_eq!(actor.permission_ids().len(), services.registry.ids().len());

        let roles = services.employee_roles.list_for_location(&actor).await.unwrap();
        assert_eq!(roles.len(), 5);

        let other = services
            .permissions
            .get_employee_actor(user.id, LocationId::new())
            .await
            .unwrap_err();
        assert_eq!(other.kind(), ErrorKind::NotFound);

        let receptionist = roles.iter().find(|r| r.name == "receptionist").unwrap();
        let updated = services
            .employee_roles
            .update(
                &actor,
                receptionist.id,
                UpdateEmployeeRole {
                    name: String::new(),
                    permission_ids: Some(vec![ids::MANAGE_EMPLOYEE.to_string()]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.permission_ids.len(), 1);
    }
}
