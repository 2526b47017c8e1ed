use super::{RotationController, TokenIssuer};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealAuthService {
    token_codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    issuer: Arc<TokenIssuer>,
    rotation: RotationController,
}

impl RealAuthService {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        token_store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let issuer = Arc::new(TokenIssuer::new(
            token_codec.clone(),
            token_store.clone(),
            clock.clone(),
        ));
        let rotation = RotationController::new(
            token_codec.clone(),
            token_store,
            clock.clone(),
            issuer.clone(),
        );
        Self {
            token_codec,
            clock,
            issuer,
            rotation,
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        self.issuer.issue(&user_id).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.rotation.refresh(refresh_token).await
    }

    async fn verify_token(&self, access_token: &str) -> Result<UserId, AuthError> {
        let verify_result = self
            .token_codec
            .verify_access_token(&AccessToken(access_token.to_string()))
            .await?;

        if self.clock.now() >= verify_result.expires_at {
            return Err(AuthError::TokenExpired(TokenUse::Access));
        }

        Ok(verify_result.user_id)
    }
}
