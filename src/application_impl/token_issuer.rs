use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

/// Mints signed token pairs and records them so the refresh side can later be
/// redeemed exactly once.
pub struct TokenIssuer {
    token_codec: Arc<dyn TokenCodec>,
    token_store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        token_store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            token_codec,
            token_store,
            clock,
        }
    }

    /// Issue a pair for `user_id`. Nothing is returned unless the record for
    /// the pair has been stored.
    pub async fn issue(&self, user_id: &UserId) -> Result<TokenPair, AuthError> {
        let jti = Jti::generate();
        let issued_at = self.clock.now();

        let (access_token, access_exp) = self
            .token_codec
            .issue_access_token(user_id, &jti, issued_at)
            .await?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(user_id, &jti, issued_at)
            .await?;

        let record = TokenRecord {
            jti: jti.clone(),
            user_id: user_id.clone(),
            issued_at,
            expires_at: refresh_exp,
            token_hash: refresh_token.fingerprint(),
        };
        self.token_store
            .store(&record)
            .await
            .map_err(AuthError::store("storing token record"))?;

        debug!(user_id = %user_id, jti = %jti, expires_at = %refresh_exp, "token pair issued");

        Ok(TokenPair {
            jti,
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }
}
