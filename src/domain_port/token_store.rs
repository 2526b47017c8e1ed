use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record with jti already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Persistence for token records, keyed by `jti`.
///
/// `delete_by_id` is the rotation boundary: when several callers delete the
/// same `jti` concurrently, exactly one of them gets `Ok(())` and every other
/// one gets `StoreError::NotFound`.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a new record. A duplicate `jti` is rejected with `Conflict`.
    async fn store(&self, record: &TokenRecord) -> Result<(), StoreError>;

    async fn find_by_id(&self, jti: &Jti) -> Result<Option<TokenRecord>, StoreError>;

    /// Atomically delete the record if present.
    async fn delete_by_id(&self, jti: &Jti) -> Result<(), StoreError>;
}
