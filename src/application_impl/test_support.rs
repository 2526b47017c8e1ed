use super::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::MemoryTokenStore;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub(crate) const TEST_SECRET: &[u8] =
    b"test-secret-0123456789abcdef0123456789abcdef0123456789abcdef0123";

pub(crate) fn test_jwt_config(secret: &[u8]) -> JwtConfig {
    JwtConfig {
        issuer: "keyturn.test".to_string(),
        audience: "test-client".to_string(),
        access_ttl: DEFAULT_ACCESS_TTL,
        refresh_ttl: DEFAULT_REFRESH_TTL,
        signing_key: SigningSecret::new(secret).unwrap(),
    }
}

/// Shares records with a `MemoryTokenStore` but can be told to fail.
pub(crate) struct FaultyStore {
    inner: Arc<MemoryTokenStore>,
    pub fail_store: AtomicBool,
    pub conflict_on_store: AtomicBool,
    pub fail_find: AtomicBool,
    pub fail_delete: AtomicBool,
    pub find_calls: AtomicUsize,
}

impl FaultyStore {
    fn new(inner: Arc<MemoryTokenStore>) -> Self {
        Self {
            inner,
            fail_store: AtomicBool::new(false),
            conflict_on_store: AtomicBool::new(false),
            fail_find: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            find_calls: AtomicUsize::new(0),
        }
    }

    fn backend_down() -> StoreError {
        StoreError::Backend("connection reset".to_string())
    }
}

#[async_trait::async_trait]
impl TokenStore for FaultyStore {
    async fn store(&self, record: &TokenRecord) -> Result<(), StoreError> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        if self.conflict_on_store.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict);
        }
        self.inner.store(record).await
    }

    async fn find_by_id(&self, jti: &Jti) -> Result<Option<TokenRecord>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.find_by_id(jti).await
    }

    async fn delete_by_id(&self, jti: &Jti) -> Result<(), StoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.delete_by_id(jti).await
    }
}

/// Issuer, controller and service wired to an in-memory store and a manual clock.
pub(crate) struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryTokenStore>,
    pub faulty: Arc<FaultyStore>,
    pub codec: Arc<JwtHs512Codec>,
    pub issuer: Arc<TokenIssuer>,
    pub controller: RotationController,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_secret(TEST_SECRET)
    }

    pub fn with_secret(secret: &[u8]) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(MemoryTokenStore::new());
        let faulty = Arc::new(FaultyStore::new(store.clone()));
        let codec = Arc::new(JwtHs512Codec::new(test_jwt_config(secret)).unwrap());
        let issuer = Arc::new(TokenIssuer::new(codec.clone(), store.clone(), clock.clone()));
        let controller =
            RotationController::new(codec.clone(), store.clone(), clock.clone(), issuer.clone());
        Self {
            clock,
            store,
            faulty,
            codec,
            issuer,
            controller,
        }
    }

    pub fn faulty_issuer(&self) -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(
            self.codec.clone(),
            self.faulty.clone(),
            self.clock.clone(),
        ))
    }

    pub fn faulty_controller(&self) -> RotationController {
        RotationController::new(
            self.codec.clone(),
            self.faulty.clone(),
            self.clock.clone(),
            self.faulty_issuer(),
        )
    }

    pub fn service(&self) -> RealAuthService {
        RealAuthService::new(
            self.codec.clone(),
            self.store.clone(),
            self.clock.clone(),
        )
    }
}
