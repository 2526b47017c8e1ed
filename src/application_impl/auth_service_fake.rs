use crate::application_port::*;
use crate::domain_model::*;
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeAuthService {
    fn default() -> Self {
        Self::new()
    }
}

// Deterministic tokens for client development. Nothing is stored and
// refresh tokens are not single use.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn login(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        Ok(get_fake_pair(&user_id))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        match refresh_token.strip_prefix("fake-refresh-token:") {
            Some(user) if !user.is_empty() => Ok(get_fake_pair(&UserId::from(user))),
            _ => Err(AuthError::TokenInvalid(TokenUse::Refresh)),
        }
    }

    async fn verify_token(&self, access_token: &str) -> Result<UserId, AuthError> {
        match access_token.strip_prefix("fake-access-token:") {
            Some(user) if !user.is_empty() => Ok(UserId::from(user)),
            _ => Err(AuthError::TokenInvalid(TokenUse::Access)),
        }
    }
}

fn get_fake_pair(user_id: &UserId) -> TokenPair {
    let now = Utc::now();
    TokenPair {
        jti: Jti(format!("fake-jti:{}", user_id)),
        access_token: AccessToken(format!("fake-access-token:{}", user_id)),
        access_token_expires_at: now + Duration::minutes(15),
        refresh_token: RefreshToken(format!("fake-refresh-token:{}", user_id)),
        refresh_token_expires_at: now + Duration::days(7),
    }
}
