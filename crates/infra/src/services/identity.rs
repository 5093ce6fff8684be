//! Identity resolution: phone number → user.

use std::sync::Arc;

use tracing::{info, warn};

use staffgate_auth::{PhoneNormalizer, PhoneNumber, ProfileUpdate, User};
use staffgate_core::{AppError, AppResult, Clock, UserId};

use super::store_failure;
use crate::store::{StoreError, UserStore};

pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
    normalizer: Arc<dyn PhoneNormalizer>,
    clock: Arc<dyn Clock>,
}

impl IdentityResolver {
    pub fn new(
        users: Arc<dyn UserStore>,
        normalizer: Arc<dyn PhoneNormalizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            normalizer,
            clock,
        }
    }

    /// Canonical form of a caller-supplied phone number.
    pub fn normalize(&self, phone_number: &str, country_code: &str) -> AppResult<PhoneNumber> {
        const OP: &str = "identity.normalize";

        self.normalizer
            .normalize(phone_number, country_code)
            .map_err(|e| {
                warn!(error = %e, "rejected phone number");
                AppError::invalid(OP, "phone number invalid")
            })
    }

    pub async fn get(&self, user_id: UserId) -> AppResult<User> {
        const OP: &str = "identity.get";

        self.users
            .get(user_id)
            .await
            .map_err(|e| store_failure(OP, "failed to get user by id", e))?
            .ok_or_else(|| AppError::not_found(OP))
    }

    pub async fn find_by_phone(&self, phone: &PhoneNumber) -> AppResult<Option<User>> {
        const OP: &str = "identity.find_by_phone";

        self.users
            .find_by_phone(phone)
            .await
            .map_err(|e| store_failure(OP, "failed to get user by phone number", e))
    }

    /// Normalize, then get or create the owning identity.
    pub async fn resolve_or_create(&self, phone_number: &str, country_code: &str) -> AppResult<User> {
        let phone = self.normalize(phone_number, country_code)?;
        self.resolve_or_create_normalized(&phone).await
    }

    /// Get or create the identity owning an already normalized phone number.
    ///
    /// Idempotent. When a concurrent call creates the same identity first, the
    /// winner is returned.
    pub async fn resolve_or_create_normalized(&self, phone: &PhoneNumber) -> AppResult<User> {
        const OP: &str = "identity.resolve_or_create";

        if let Some(user) = self.find_by_phone(phone).await.map_err(|e| e.wrap(OP, "lookup failed"))? {
            return Ok(user);
        }

        let user = User::new(phone, self.clock.now());
        match self.users.insert(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, country_code = %phone.country_code, "created identity");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => self
                .find_by_phone(phone)
                .await
                .map_err(|e| e.wrap(OP, "re-read after conflict failed"))?
                .ok_or_else(|| {
                    AppError::unexpected(
                        OP,
                        "identity vanished after uniqueness conflict",
                        anyhow::anyhow!("no user for conflicting phone number"),
                    )
                }),
            Err(e) => Err(store_failure(OP, "failed to store user", e)),
        }
    }

    pub async fn mark_phone_verified(&self, mut user: User) -> AppResult<User> {
        const OP: &str = "identity.mark_phone_verified";

        user.mark_phone_verified(self.clock.now());
        self.users
            .update(&user)
            .await
            .map_err(|e| store_failure(OP, "failed to update user", e))?;
        Ok(user)
    }

    /// Move `user` to `new_phone`, which must not belong to anyone else.
    pub async fn update_phone_number(&self, mut user: User, new_phone: &PhoneNumber) -> AppResult<User> {
        const OP: &str = "identity.update_phone_number";

        self.ensure_phone_available(&user, new_phone)
            .await
            .map_err(|e| e.wrap(OP, "phone number unavailable"))?;

        user.change_phone_number(new_phone, self.clock.now());
        self.users
            .update(&user)
            .await
            .map_err(|e| store_failure(OP, "failed to update user", e))?;

        info!(user_id = %user.id, "phone number changed");
        Ok(user)
    }

    /// `Conflict` when an identity other than `user` owns `phone`.
    pub async fn ensure_phone_available(&self, user: &User, phone: &PhoneNumber) -> AppResult<()> {
        const OP: &str = "identity.ensure_phone_available";

        match self.find_by_phone(phone).await? {
            Some(owner) if owner.id != user.id => {
                Err(AppError::conflict(OP, "phone number already used by another account"))
            }
            _ => Ok(()),
        }
    }

    /// Partial update; empty or whitespace-only fields stay unchanged.
    pub async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> AppResult<User> {
        const OP: &str = "identity.update_profile";

        let mut user = self
            .get(user_id)
            .await
            .map_err(|e| e.wrap(OP, "failed to get user by id"))?;

        if user.apply_profile(update, self.clock.now()) {
            self.users
                .update(&user)
                .await
                .map_err(|e| store_failure(OP, "failed to update user", e))?;
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgate_auth::NationalFormatNormalizer;
    use staffgate_core::{ErrorKind, SystemClock};

    use crate::store::InMemoryUserStore;

    fn resolver() -> (IdentityResolver, Arc<InMemoryUserStore>) {
        let users = Arc::new(InMemoryUserStore::new());
        let resolver = IdentityResolver::new(
            users.clone(),
            Arc::new(NationalFormatNormalizer),
            Arc::new(SystemClock),
        );
        (resolver, users)
    }

    #[tokio::test]
    async fn resolve_or_create_is_idempotent() {
        let (resolver, _) = resolver();

        let first = resolver.resolve_or_create("999111333", "VN").await.unwrap();
        let second = resolver.resolve_or_create("0999 111 333", "vn").await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(!first.is_phone_number_verified);
    }

    #[tokio::test]
    async fn unparsable_phone_is_invalid() {
        let (resolver, _) = resolver();
        let err = resolver.resolve_or_create("hello", "VN").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn concurrent_creation_returns_one_identity() {
        let (resolver, _) = resolver();
        let resolver = Arc::new(resolver);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve_or_create("999111333", "VN").await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn taking_someone_elses_number_conflicts() {
        let (resolver, _) = resolver();
        let alice = resolver.resolve_or_create("999111333", "VN").await.unwrap();
        let bob = resolver.resolve_or_create("912345678", "VN").await.unwrap();

        let err = resolver
            .update_phone_number(bob, &alice.phone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn profile_update_persists_non_blank_fields() {
        let (resolver, users) = resolver();
        let user = resolver.resolve_or_create("999111333", "VN").await.unwrap();

        resolver
            .update_profile(
                user.id,
                &ProfileUpdate {
                    full_name: " Lan Nguyen ".to_string(),
                    profile_image_id: String::new(),
                },
            )
            .await
            .unwrap();

        let stored = users.get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.full_name, "Lan Nguyen");
        assert_eq!(stored.profile_image_id, "");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (resolver, _) = resolver();
        let err = resolver.get(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
