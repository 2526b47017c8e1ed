use super::TokenIssuer;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

/// Redeems refresh tokens. Each record goes from live to retired once; the
/// atomic `delete_by_id` decides which of several concurrent redemptions wins.
pub struct RotationController {
    token_codec: Arc<dyn TokenCodec>,
    token_store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    issuer: Arc<TokenIssuer>,
}

impl RotationController {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        token_store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            token_codec,
            token_store,
            clock,
            issuer,
        }
    }

    pub async fn refresh(&self, refresh_token_raw: &str) -> Result<TokenPair, AuthError> {
        let presented = RefreshToken(refresh_token_raw.to_string());

        // Signature and claims. Nothing forged gets past this point.
        let verified = self.token_codec.verify_refresh_token(&presented).await?;
        let TokenVerifyResult { user_id, jti, .. } = verified;

        let record = self
            .token_store
            .find_by_id(&jti)
            .await
            .map_err(AuthError::store("looking up token record"))?
            .ok_or(AuthError::RefreshNotFound)?;

        if record.is_expired_at(self.clock.now()) {
            if let Err(e) = self.token_store.delete_by_id(&jti).await {
                warn!(jti = %jti, error = %e, "failed to clean up expired token record");
            }
            return Err(AuthError::TokenExpired(TokenUse::Refresh));
        }

        if record.user_id != user_id || record.token_hash != presented.fingerprint() {
            warn!(jti = %jti, "refresh token does not match its record");
            return Err(AuthError::RefreshMismatch);
        }

        // Rotation boundary: only the caller whose delete succeeds may mint.
        self.token_store
            .delete_by_id(&jti)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::RefreshNotFound,
                other => AuthError::store("retiring token record")(other),
            })?;

        let pair = self.issuer.issue(&user_id).await?;
        info!(user_id = %user_id, old_jti = %jti, new_jti = %pair.jti, "refresh token rotated");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::test_support::*;
    use chrono::Duration;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn first_redemption_succeeds_second_fails() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();

        let rotated = h.controller.refresh(&pair.refresh_token.0).await.unwrap();
        assert_ne!(rotated.jti, pair.jti);
        assert!(h.store.find_by_id(&pair.jti).await.unwrap().is_none());
        assert!(h.store.find_by_id(&rotated.jti).await.unwrap().is_some());

        let err = h.controller.refresh(&pair.refresh_token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshNotFound));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn rotated_pair_keeps_identity() {
        let h = Harness::new();
        let user = UserId::from("user-42");
        let pair = h.issuer.issue(&user).await.unwrap();

        let rotated = h.controller.refresh(&pair.refresh_token.0).await.unwrap();

        let access = h.codec.verify_access_token(&rotated.access_token).await.unwrap();
        assert_eq!(access.user_id, user);
        assert_eq!(access.jti, rotated.jti);
    }

    #[tokio::test]
    async fn issue_then_rotate_scenario() {
        let h = Harness::new();
        let p0 = h.issuer.issue(&UserId::from("user-42")).await.unwrap();
        let r0 = p0.refresh_token.0.clone();

        let p1 = h.controller.refresh(&r0).await.unwrap();
        assert_ne!(p1.jti, p0.jti);
        let err = h.controller.refresh(&r0).await.unwrap_err();
        assert_eq!(err.to_string(), "refresh token not found");

        h.clock.advance(Duration::days(6));
        let p2 = h.controller.refresh(&p1.refresh_token.0).await.unwrap();

        h.clock.advance(Duration::days(7) + Duration::seconds(1));
        let err = h.controller.refresh(&p2.refresh_token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired(TokenUse::Refresh)));
        assert_eq!(err.to_string(), "refresh token expired");
    }

    #[tokio::test]
    async fn expired_record_is_cleaned_up() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();

        h.clock.advance(Duration::days(7));
        let err = h.controller.refresh(&pair.refresh_token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired(TokenUse::Refresh)));
        assert!(h.store.is_empty());

        // Cleaned up, so a replay now reports not found.
        let err = h.controller.refresh(&pair.refresh_token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshNotFound));
    }

    #[tokio::test]
    async fn failed_cleanup_still_reports_expiry() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();
        h.faulty.fail_delete.store(true, Ordering::SeqCst);

        h.clock.advance(Duration::days(8));
        let err = h
            .faulty_controller()
            .refresh(&pair.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired(TokenUse::Refresh)));
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn delete_failure_aborts_rotation() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();
        h.faulty.fail_delete.store(true, Ordering::SeqCst);

        let err = h
            .faulty_controller()
            .refresh(&pair.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Store {
                op: "retiring token record",
                ..
            }
        ));
        // No replacement pair was minted over the un-retired record.
        assert_eq!(h.store.len(), 1);
        assert!(h.store.find_by_id(&pair.jti).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lookup_failure_is_a_storage_error() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();
        h.faulty.fail_find.store(true, Ordering::SeqCst);

        let err = h
            .faulty_controller()
            .refresh(&pair.refresh_token.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn forged_tokens_never_reach_the_store() {
        let h = Harness::new();
        let other = Harness::with_secret(&[b'z'; 64]);
        let forged = other.issuer.issue(&UserId::from("user-42")).await.unwrap();
        h.faulty.fail_find.store(true, Ordering::SeqCst);

        // A lookup would fail with a storage error; validation fails first.
        let err = h
            .faulty_controller()
            .refresh(&forged.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(TokenUse::Refresh)));
        assert_eq!(h.faulty.find_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn access_token_is_not_redeemable() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();

        let err = h.controller.refresh(&pair.access_token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(TokenUse::Refresh)));
        assert!(h.store.find_by_id(&pair.jti).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn record_for_another_token_is_a_mismatch() {
        let h = Harness::new();
        let user = UserId::from("user-42");
        let pair = h.issuer.issue(&user).await.unwrap();

        // Same jti and subject, but a different refresh token string.
        let (other_refresh, _) = h
            .codec
            .issue_refresh_token(&user, &pair.jti, h.clock.now() + Duration::seconds(1))
            .await
            .unwrap();

        let err = h.controller.refresh(&other_refresh.0).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshMismatch));
        assert!(h.store.find_by_id(&pair.jti).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redemption_has_exactly_one_winner() {
        let h = Harness::new();
        let pair = h.issuer.issue(&UserId::from("user-42")).await.unwrap();
        let controller = Arc::new(h.controller);

        let attempts = 8;
        let tasks = (0..attempts).map(|_| {
            let controller = controller.clone();
            let token = pair.refresh_token.0.clone();
            tokio::spawn(async move { controller.refresh(&token).await })
        });
        let results: Vec<_> = futures_util::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let not_found = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::RefreshNotFound)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(not_found, attempts - 1);
        // Old record retired, exactly one replacement live.
        assert_eq!(h.store.len(), 1);
    }
}
