//! One-time verification codes: issuance and single-use redemption.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use staffgate_auth::{CodeGenerator, PhoneNumber, User, VerificationCode, VerificationPurpose};
use staffgate_core::{AppError, AppResult, Clock};

use super::store_failure;
use crate::store::VerificationCodeStore;

pub const CODE_INVALID: &str = "verification code invalid";
pub const CODE_EXPIRED: &str = "verification code expired";

/// Material handed back by [`VerificationCodeManager::issue`].
///
/// `code` goes out-of-band (SMS); only `verification_id` goes back to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub verification_id: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct VerificationCodeManager {
    codes: Arc<dyn VerificationCodeStore>,
    generator: CodeGenerator,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl VerificationCodeManager {
    pub fn new(
        codes: Arc<dyn VerificationCodeStore>,
        generator: CodeGenerator,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codes,
            generator,
            ttl,
            clock,
        }
    }

    /// Supersede any outstanding code for `phone` and issue a new one owned by
    /// `user`.
    pub async fn issue(
        &self,
        user: &User,
        phone: &PhoneNumber,
        purpose: VerificationPurpose,
    ) -> AppResult<IssuedCode> {
        const OP: &str = "verification.issue";

        let code = VerificationCode::new(
            user.id,
            phone,
            purpose,
            self.generator.code(),
            self.generator.verification_id(),
            self.clock.now(),
            self.ttl,
        )
        .map_err(|e| AppError::unexpected(OP, "verification code expiry out of range", e))?;

        self.codes
            .replace_for_phone(&code)
            .await
            .map_err(|e| store_failure(OP, "failed to store verification code", e))?;

        info!(
            user_id = %user.id,
            purpose = %purpose,
            expires_at = %code.expires_at,
            "verification code issued"
        );

        Ok(IssuedCode {
            verification_id: code.verification_id,
            code: code.code,
            expires_at: code.expires_at,
        })
    }

    /// The outstanding code matching the pair, left in place.
    ///
    /// Lets callers reject a code before [`consume`](Self::consume) burns it.
    /// Expiry is not checked here.
    pub async fn pending(&self, verification_id: &str, code: &str) -> AppResult<VerificationCode> {
        const OP: &str = "verification.pending";

        self.codes
            .find_by_verification(verification_id, code)
            .await
            .map_err(|e| store_failure(OP, "failed to get verification code", e))?
            .ok_or_else(|| {
                warn!("verification attempt with unknown id or wrong code");
                AppError::invalid(OP, CODE_INVALID)
            })
    }

    /// Redeem a code. Succeeds at most once per issued code.
    ///
    /// Unknown id and wrong code fail identically. Store failures are
    /// `Unexpected`, never `Invalid`.
    pub async fn consume(&self, verification_id: &str, code: &str) -> AppResult<VerificationCode> {
        const OP: &str = "verification.consume";

        let Some(found) = self
            .codes
            .find_by_verification(verification_id, code)
            .await
            .map_err(|e| store_failure(OP, "failed to get verification code", e))?
        else {
            warn!("verification attempt with unknown id or wrong code");
            return Err(AppError::invalid(OP, CODE_INVALID));
        };

        if found.is_expired(self.clock.now()) {
            self.codes
                .delete_by_id(found.id)
                .await
                .map_err(|e| store_failure(OP, "failed to delete expired verification code", e))?;
            warn!(user_id = %found.user_id, "expired verification code presented");
            return Err(AppError::invalid(OP, CODE_EXPIRED));
        }

        let removed = self
            .codes
            .delete_by_id(found.id)
            .await
            .map_err(|e| store_failure(OP, "failed to delete verification code", e))?;

        if !removed {
            warn!(user_id = %found.user_id, "verification code consumed concurrently");
            return Err(AppError::invalid(OP, CODE_INVALID));
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgate_core::{ErrorKind, FixedClock};

    use crate::store::InMemoryVerificationCodeStore;

    struct Fixture {
        manager: Arc<VerificationCodeManager>,
        codes: Arc<InMemoryVerificationCodeStore>,
        clock: Arc<FixedClock>,
        user: User,
        phone: PhoneNumber,
    }

    fn fixture() -> Fixture {
        fixture_with_ttl(Duration::minutes(10))
    }

    fn fixture_with_ttl(ttl: Duration) -> Fixture {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let codes = Arc::new(InMemoryVerificationCodeStore::new());
        let manager = VerificationCodeManager::new(codes.clone(), CodeGenerator::default(), ttl, clock.clone());
        let phone = PhoneNumber {
            number: "0999 111 333".to_string(),
            country_code: "VN".to_string(),
        };
        let user = User::new(&phone, clock.now());

        Fixture {
            manager: Arc::new(manager),
            codes,
            clock,
            user,
            phone,
        }
    }

    #[tokio::test]
    async fn issued_code_redeems_once() {
        let f = fixture();
        let issued = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap();

        let consumed = f
            .manager
            .consume(&issued.verification_id, &issued.code)
            .await
            .unwrap();
        assert_eq!(consumed.user_id, f.user.id);

        let err = f
            .manager
            .consume(&issued.verification_id, &issued.code)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert_eq!(err.public_message(), CODE_INVALID);
    }

    #[tokio::test]
    async fn wrong_code_and_wrong_id_look_the_same() {
        let f = fixture();
        let issued = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap();

        let wrong_code = f
            .manager
            .consume(&issued.verification_id, "not-the-code")
            .await
            .unwrap_err();
        let wrong_id = f.manager.consume("nope", &issued.code).await.unwrap_err();

        assert_eq!(wrong_code.public_message(), wrong_id.public_message());

        // Failed attempts do not burn the code.
        assert!(
            f.manager
                .consume(&issued.verification_id, &issued.code)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_removed() {
        let f = fixture();
        let issued = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap();

        f.clock.advance(Duration::minutes(10) + Duration::seconds(1));

        let err = f
            .manager
            .consume(&issued.verification_id, &issued.code)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert_eq!(err.public_message(), CODE_EXPIRED);
        assert!(f.codes.is_empty().unwrap());
    }

    #[tokio::test]
    async fn pending_leaves_the_code_redeemable() {
        let f = fixture();
        let issued = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::UpdatePhone)
            .await
            .unwrap();

        let pending = f
            .manager
            .pending(&issued.verification_id, &issued.code)
            .await
            .unwrap();
        assert_eq!(pending.user_id, f.user.id);
        assert_eq!(pending.purpose, VerificationPurpose::UpdatePhone);

        let err = f
            .manager
            .pending(&issued.verification_id, "not-the-code")
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), CODE_INVALID);

        assert!(
            f.manager
                .consume(&issued.verification_id, &issued.code)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn expiry_out_of_range_is_unexpected() {
        let f = fixture_with_ttl(Duration::days(365_000_000));
        let err = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(f.codes.is_empty().unwrap());
    }

    #[tokio::test]
    async fn reissue_supersedes_the_previous_code() {
        let f = fixture();
        let first = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap();
        let second = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap();

        assert_ne!(first.verification_id, second.verification_id);
        assert!(f.manager.consume(&first.verification_id, &first.code).await.is_err());
        assert!(f.manager.consume(&second.verification_id, &second.code).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumption_has_one_winner() {
        let f = fixture();
        let issued = f
            .manager
            .issue(&f.user, &f.phone, VerificationPurpose::Login)
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = f.manager.clone();
                let issued = issued.clone();
                tokio::spawn(async move { manager.consume(&issued.verification_id, &issued.code).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::Invalid),
            }
        }
        assert_eq!(winners, 1);
    }
}
