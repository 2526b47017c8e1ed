use crate::domain_model::*;
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    /// The presented token is malformed or not signed by us.
    Validation,
    /// The token was ours but can no longer be used; re-authenticate.
    Unauthorized,
    /// The persistence layer failed; may be transient.
    Storage,
    /// Misconfiguration. Should stop startup rather than show up per request.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid {0} token")]
    TokenInvalid(TokenUse),
    #[error("malformed claims")]
    MalformedClaims,
    #[error("{0} token expired")]
    TokenExpired(TokenUse),
    #[error("refresh token not found")]
    RefreshNotFound,
    #[error("refresh token mismatch")]
    RefreshMismatch,
    #[error("store error while {op}: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("signing error: {0}")]
    Signing(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    pub fn store(op: &'static str) -> impl FnOnce(StoreError) -> AuthError {
        move |source| AuthError::Store { op, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::TokenInvalid(_) | AuthError::MalformedClaims => ErrorKind::Validation,
            AuthError::TokenExpired(_)
            | AuthError::RefreshNotFound
            | AuthError::RefreshMismatch => ErrorKind::Unauthorized,
            AuthError::Store { .. } => ErrorKind::Storage,
            AuthError::Signing(_) | AuthError::Config(_) => ErrorKind::Fatal,
        }
    }

    /// Caller must log in again. True for both validation and unauthorized kinds.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Unauthorized)
    }

    /// Message that is safe to hand to an end user.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Unauthorized => self.to_string(),
            ErrorKind::Storage => "token storage unavailable".to_string(),
            ErrorKind::Fatal => "internal error".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifyResult {
    pub user_id: UserId,
    pub jti: Jti,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens. Verification checks signature, algorithm,
/// issuer, audience and claim shape; it never looks at the clock, callers
/// decide expiry.
#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: &UserId,
        jti: &Jti,
        issued_at: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn issue_refresh_token(
        &self,
        user: &UserId,
        jti: &Jti,
        issued_at: DateTime<Utc>,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError>;
    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<TokenVerifyResult, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Issue a fresh pair for an already authenticated user.
    async fn login(&self, user_id: UserId) -> Result<TokenPair, AuthError>;
    /// Redeem a refresh token exactly once.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    async fn verify_token(&self, access_token: &str) -> Result<UserId, AuthError>;
}
