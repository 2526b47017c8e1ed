use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Process-local token store. Records do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: DashMap<Jti, TokenRecord>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store(&self, record: &TokenRecord) -> Result<(), StoreError> {
        match self.records.entry(record.jti.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, jti: &Jti) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.records.get(jti).map(|r| r.value().clone()))
    }

    async fn delete_by_id(&self, jti: &Jti) -> Result<(), StoreError> {
        self.records
            .remove(jti)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
