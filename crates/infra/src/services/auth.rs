//! Phone-number login and phone-number change flows.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};

use staffgate_auth::{AccessClaims, ProfileUpdate, TokenError, TokenIssuer, User, VerificationPurpose};
use staffgate_core::{AppError, AppResult, Clock, ErrorKind};

use super::identity::IdentityResolver;
use super::verification::{CODE_INVALID, VerificationCodeManager};
use crate::external::SmsSender;

pub struct AuthService {
    identity: Arc<IdentityResolver>,
    verification: Arc<VerificationCodeManager>,
    sms: Arc<dyn SmsSender>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        identity: Arc<IdentityResolver>,
        verification: Arc<VerificationCodeManager>,
        sms: Arc<dyn SmsSender>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        access_token_ttl: Duration,
    ) -> Self {
        Self {
            identity,
            verification,
            sms,
            tokens,
            clock,
            access_token_ttl,
        }
    }

    /// Start a login: send a code to the phone, return the verification id.
    pub async fn login_verify(&self, phone_number: &str, country_code: &str) -> AppResult<String> {
        const OP: &str = "auth.login_verify";

        let phone = self
            .identity
            .normalize(phone_number, country_code)
            .map_err(|e| e.wrap(OP, "failed to normalize phone number"))?;

        let user = self
            .identity
            .resolve_or_create_normalized(&phone)
            .await
            .map_err(|e| e.wrap(OP, "failed to resolve identity"))?;

        let issued = self
            .verification
            .issue(&user, &phone, VerificationPurpose::Login)
            .await
            .map_err(|e| e.wrap(OP, "failed to create verification code"))?;

        self.sms.send(&phone, &issued.code).await.map_err(|e| {
            error!(user_id = %user.id, error = %e, "failed to send login code");
            AppError::unexpected(OP, "failed to send sms", e)
        })?;

        Ok(issued.verification_id)
    }

    /// Finish a login: redeem the code and return a signed access token.
    pub async fn login_check(&self, verification_id: &str, code: &str) -> AppResult<String> {
        const OP: &str = "auth.login_check";

        let consumed = self
            .verification
            .consume(verification_id, code)
            .await
            .map_err(|e| e.wrap(OP, "failed to consume verification code"))?;

        let user = self.owner_of_code(OP, &consumed.user_id).await?;

        if consumed.purpose != VerificationPurpose::Login {
            warn!(user_id = %user.id, purpose = %consumed.purpose, "code redeemed for the wrong flow");
            return Err(AppError::invalid(OP, CODE_INVALID));
        }

        let user = self
            .identity
            .mark_phone_verified(user)
            .await
            .map_err(|e| e.wrap(OP, "failed to mark phone number verified"))?;

        let claims = AccessClaims::new(user.id, self.clock.now(), self.access_token_ttl)
            .map_err(|e| AppError::unexpected(OP, "access token expiry out of range", e))?;
        let token = self
            .tokens
            .sign(&claims)
            .map_err(|e| AppError::unexpected(OP, "failed to sign access token", e))?;

        info!(user_id = %user.id, "login verified");
        Ok(token)
    }

    /// Resolve the identity behind an access token.
    pub async fn current_user(&self, access_token: &str) -> AppResult<User> {
        const OP: &str = "auth.current_user";

        let claims = self.tokens.verify(access_token).map_err(|e| match e {
            TokenError::Signing(_) => AppError::unexpected(OP, "failed to verify access token", e),
            other => AppError::unauthorized(OP, other.to_string()),
        })?;

        self.identity
            .get(claims.sub)
            .await
            .map_err(|e| e.wrap(OP, "failed to get user by id"))
    }

    /// Start a phone-number change for `current_user`.
    pub async fn update_phone_number_verify(
        &self,
        current_user: &User,
        phone_number: &str,
        country_code: &str,
    ) -> AppResult<String> {
        const OP: &str = "auth.update_phone_number_verify";

        let phone = self
            .identity
            .normalize(phone_number, country_code)
            .map_err(|e| e.wrap(OP, "failed to normalize phone number"))?;

        self.identity
            .ensure_phone_available(current_user, &phone)
            .await
            .map_err(|e| e.wrap(OP, "phone number unavailable"))?;

        let issued = self
            .verification
            .issue(current_user, &phone, VerificationPurpose::UpdatePhone)
            .await
            .map_err(|e| e.wrap(OP, "failed to create verification code"))?;

        self.sms.send(&phone, &issued.code).await.map_err(|e| {
            error!(user_id = %current_user.id, error = %e, "failed to send phone change code");
            AppError::unexpected(OP, "failed to send sms", e)
        })?;

        Ok(issued.verification_id)
    }

    /// Finish a phone-number change: the code proves the new number.
    ///
    /// Purpose and ownership are checked before the code is redeemed, so a
    /// rejected attempt leaves it usable by its owner.
    pub async fn update_phone_number_check(
        &self,
        current_user: &User,
        verification_id: &str,
        code: &str,
    ) -> AppResult<User> {
        const OP: &str = "auth.update_phone_number_check";

        let pending = self
            .verification
            .pending(verification_id, code)
            .await
            .map_err(|e| e.wrap(OP, "failed to get verification code"))?;

        if pending.purpose != VerificationPurpose::UpdatePhone {
            warn!(user_id = %current_user.id, purpose = %pending.purpose, "code redeemed for the wrong flow");
            return Err(AppError::invalid(OP, CODE_INVALID));
        }

        if pending.user_id != current_user.id {
            warn!(user_id = %current_user.id, "phone change code belongs to another user");
            return Err(AppError::unauthorized(OP, "verification code issued to another user"));
        }

        let consumed = self
            .verification
            .consume(verification_id, code)
            .await
            .map_err(|e| e.wrap(OP, "failed to consume verification code"))?;

        let user = self
            .identity
            .get(current_user.id)
            .await
            .map_err(|e| e.wrap(OP, "failed to get user by id"))?;

        let user = self
            .identity
            .update_phone_number(user, &consumed.phone())
            .await
            .map_err(|e| e.wrap(OP, "failed to update phone number"))?;

        info!(user_id = %user.id, "phone number change verified");
        Ok(user)
    }

    pub async fn update_profile(&self, current_user: &User, update: &ProfileUpdate) -> AppResult<User> {
        const OP: &str = "auth.update_profile";

        self.identity
            .update_profile(current_user.id, update)
            .await
            .map_err(|e| e.wrap(OP, "failed to update profile"))
    }

    /// A redeemed code must point at an existing identity.
    async fn owner_of_code(&self, op: &'static str, user_id: &staffgate_core::UserId) -> AppResult<User> {
        match self.identity.get(*user_id).await {
            Ok(user) => Ok(user),
            Err(e) if e.is(ErrorKind::NotFound) => Err(AppError::unexpected(
                op,
                "verification code owner missing",
                anyhow::anyhow!("no user {user_id} for a redeemed verification code"),
            )),
            Err(e) => Err(e.wrap(op, "failed to get user by id")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use staffgate_auth::{CodeGenerator, Hs256TokenIssuer, NationalFormatNormalizer, PhoneNormalizer};
    use staffgate_core::FixedClock;

    use crate::external::RecordingSmsSender;
    use crate::store::{
        DeadlineStore, InMemoryUserStore, InMemoryVerificationCodeStore, StoreError, UserStore,
        VerificationCodeStore,
    };

    struct Fixture {
        auth: AuthService,
        sms: Arc<RecordingSmsSender>,
        clock: Arc<FixedClock>,
        codes: Arc<InMemoryVerificationCodeStore>,
        users: Arc<dyn UserStore>,
    }

    fn fixture_with(users: Arc<dyn UserStore>, sms: Arc<RecordingSmsSender>) -> Fixture {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let codes = Arc::new(InMemoryVerificationCodeStore::new());

        let identity = Arc::new(IdentityResolver::new(
            users.clone(),
            Arc::new(NationalFormatNormalizer),
            clock.clone(),
        ));
        let verification = Arc::new(VerificationCodeManager::new(
            codes.clone(),
            CodeGenerator::default(),
            Duration::minutes(10),
            clock.clone(),
        ));
        let tokens = Arc::new(Hs256TokenIssuer::with_clock("test-secret", clock.clone()));

        let auth = AuthService::new(
            identity,
            verification,
            sms.clone(),
            tokens,
            clock.clone(),
            Duration::days(30),
        );

        Fixture {
            auth,
            sms,
            clock,
            codes,
            users,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(RecordingSmsSender::new()),
        )
    }

    fn last_code(f: &Fixture) -> String {
        f.sms.last().unwrap().text
    }

    async fn login(f: &Fixture, phone: &str) -> (String, User) {
        let verification_id = f.auth.login_verify(phone, "VN").await.unwrap();
        let token = f.auth.login_check(&verification_id, &last_code(f)).await.unwrap();
        let user = f.auth.current_user(&token).await.unwrap();
        (token, user)
    }

    #[tokio::test]
    async fn login_end_to_end() {
        let f = fixture();

        let verification_id = f.auth.login_verify("999111333", "VN").await.unwrap();
        assert_eq!(verification_id.len(), 50);
        assert_eq!(f.codes.len().unwrap(), 1);

        let sent = f.sms.last().unwrap();
        assert_eq!(sent.text.len(), 6);
        assert!(sent.text.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(sent.phone.country_code, "VN");

        let token = f.auth.login_check(&verification_id, &sent.text).await.unwrap();
        let user = f.auth.current_user(&token).await.unwrap();
        assert!(user.is_phone_number_verified);

        let replay = f.auth.login_check(&verification_id, &sent.text).await.unwrap_err();
        assert_eq!(replay.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn second_login_verify_invalidates_the_first() {
        let f = fixture();

        let first_id = f.auth.login_verify("999111333", "VN").await.unwrap();
        let first_code = last_code(&f);
        let second_id = f.auth.login_verify("999111333", "VN").await.unwrap();
        let second_code = last_code(&f);

        assert_ne!(first_id, second_id);
        assert_eq!(f.codes.len().unwrap(), 1);

        let err = f.auth.login_check(&first_id, &first_code).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(f.auth.login_check(&second_id, &second_code).await.is_ok());
    }

    #[tokio::test]
    async fn expired_login_code_is_invalid() {
        let f = fixture();
        let verification_id = f.auth.login_verify("999111333", "VN").await.unwrap();

        f.clock.advance(Duration::minutes(11));

        let err = f
            .auth
            .login_check(&verification_id, &last_code(&f))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn sms_failure_is_unexpected() {
        let f = fixture_with(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(RecordingSmsSender::failing()),
        );
        let err = f.auth.login_verify("999111333", "VN").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.public_message(), staffgate_core::INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn bad_phone_number_is_invalid() {
        let f = fixture();
        let err = f.auth.login_verify("call me maybe", "VN").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(f.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let f = fixture();
        let (token, _) = login(&f, "999111333").await;

        f.clock.advance(Duration::days(31));

        let err = f.auth.current_user(&token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn phone_change_flow() {
        let f = fixture();
        let (_, user) = login(&f, "999111333").await;

        let verification_id = f
            .auth
            .update_phone_number_verify(&user, "912345678", "VN")
            .await
            .unwrap();
        let updated = f
            .auth
            .update_phone_number_check(&user, &verification_id, &last_code(&f))
            .await
            .unwrap();

        assert_eq!(updated.id, user.id);
        assert_ne!(updated.phone_number, user.phone_number);
        assert!(updated.is_phone_number_verified);
    }

    #[tokio::test]
    async fn phone_change_to_taken_number_conflicts() {
        let f = fixture();
        let (_, alice) = login(&f, "999111333").await;
        let (_, bob) = login(&f, "912345678").await;

        let err = f
            .auth
            .update_phone_number_verify(&bob, &alice.phone_number, "VN")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn phone_change_code_is_bound_to_its_owner() {
        let f = fixture();
        let (_, alice) = login(&f, "999111333").await;
        let (_, bob) = login(&f, "912345678").await;

        let verification_id = f
            .auth
            .update_phone_number_verify(&alice, "987654321", "VN")
            .await
            .unwrap();
        let code = last_code(&f);
        let err = f
            .auth
            .update_phone_number_check(&bob, &verification_id, &code)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        // Bob's attempt must not burn Alice's code.
        let updated = f
            .auth
            .update_phone_number_check(&alice, &verification_id, &code)
            .await
            .unwrap();
        assert_eq!(updated.id, alice.id);
        let expected = NationalFormatNormalizer.normalize("987654321", "VN").unwrap();
        assert_eq!(updated.phone_number, expected.number);
    }

    #[tokio::test]
    async fn number_claimed_between_verify_and_check_conflicts() {
        let f = fixture();
        let (_, alice) = login(&f, "999111333").await;

        let verification_id = f
            .auth
            .update_phone_number_verify(&alice, "987654321", "VN")
            .await
            .unwrap();

        let taken = NationalFormatNormalizer.normalize("987654321", "VN").unwrap();
        let bob = User::new(&taken, f.clock.now());
        f.users.insert(&bob).await.unwrap();

        let err = f
            .auth
            .update_phone_number_check(&alice, &verification_id, &last_code(&f))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            f.users.get(alice.id).await.unwrap().unwrap().phone_number,
            alice.phone_number
        );
    }

    #[tokio::test]
    async fn access_token_expiry_out_of_range_is_unexpected() {
        let f = fixture();
        f.clock.set(chrono::DateTime::<Utc>::MAX_UTC - Duration::days(1));

        let verification_id = f.auth.login_verify("999111333", "VN").await.unwrap();
        let err = f
            .auth
            .login_check(&verification_id, &last_code(&f))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.public_message(), staffgate_core::INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn login_code_cannot_change_phone_number() {
        let f = fixture();
        let (_, user) = login(&f, "999111333").await;

        let verification_id = f.auth.login_verify("999111333", "VN").await.unwrap();
        let err = f
            .auth
            .update_phone_number_check(&user, &verification_id, &last_code(&f))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn profile_update_keeps_blank_fields() {
        let f = fixture();
        let (_, user) = login(&f, "999111333").await;

        let updated = f
            .auth
            .update_profile(
                &user,
                &ProfileUpdate {
                    full_name: "Minh".to_string(),
                    profile_image_id: "   ".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Minh");
        assert_eq!(updated.profile_image_id, "");
        assert_eq!(f.users.get(user.id).await.unwrap().unwrap().full_name, "Minh");
    }

    /// Verification store whose lookups hang forever.
    struct StalledCodes;

    #[async_trait::async_trait]
    impl VerificationCodeStore for StalledCodes {
        async fn find_by_verification(
            &self,
            _verification_id: &str,
            _code: &str,
        ) -> Result<Option<staffgate_auth::VerificationCode>, StoreError> {
            std::future::pending().await
        }

        async fn find_by_phone(
            &self,
            _phone: &staffgate_auth::PhoneNumber,
        ) -> Result<Option<staffgate_auth::VerificationCode>, StoreError> {
            std::future::pending().await
        }

        async fn replace_for_phone(&self, _code: &staffgate_auth::VerificationCode) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn delete_by_phone(&self, _phone: &staffgate_auth::PhoneNumber) -> Result<u64, StoreError> {
            std::future::pending().await
        }

        async fn delete_by_id(&self, _id: staffgate_core::VerificationCodeId) -> Result<bool, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn store_timeout_during_login_check_is_unexpected() {
        let clock: Arc<FixedClock> = Arc::new(FixedClock::new(Utc::now()));
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let codes = Arc::new(DeadlineStore::new(
            StalledCodes,
            std::time::Duration::from_millis(20),
        ));

        let auth = AuthService::new(
            Arc::new(IdentityResolver::new(
                users,
                Arc::new(NationalFormatNormalizer),
                clock.clone(),
            )),
            Arc::new(VerificationCodeManager::new(
                codes,
                CodeGenerator::default(),
                Duration::minutes(10),
                clock.clone(),
            )),
            Arc::new(RecordingSmsSender::new()),
            Arc::new(Hs256TokenIssuer::with_clock("test-secret", clock.clone())),
            clock,
            Duration::days(30),
        );

        let err = auth.login_check("some-id", "123456").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.public_message(), staffgate_core::INTERNAL_ERROR_MESSAGE);
    }
}
