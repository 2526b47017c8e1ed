use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Token records as JSON strings under `<prefix>:<jti>`, expiring with the record.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTokenStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, jti: &Jti) -> String {
        record_key(&self.prefix, jti)
    }
}

fn record_key(prefix: &str, jti: &Jti) -> String {
    format!("{}:{}", prefix, jti)
}

fn ttl_secs(until: DateTime<Utc>, from: DateTime<Utc>) -> u64 {
    let secs = (until - from).num_seconds();
    if secs <= 0 { 1 } else { secs as u64 }
}

/// Key lifetime is the record's own lifetime, both ends set by the issuing clock.
fn record_ttl_secs(record: &TokenRecord) -> u64 {
    ttl_secs(record.expires_at, record.issued_at)
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn store(&self, record: &TokenRecord) -> Result<(), StoreError> {
        let key = self.key(&record.jti);
        let payload =
            serde_json::to_string(record).map_err(|e| StoreError::Backend(e.to_string()))?;
        let ttl = record_ttl_secs(record);

        let mut conn = self.conn.clone();
        // SET NX replies nil when the key already exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(payload)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match reply {
            Some(_) => Ok(()),
            None => Err(StoreError::Conflict),
        }
    }

    async fn find_by_id(&self, jti: &Jti) -> Result<Option<TokenRecord>, StoreError> {
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        val.map(|payload| {
            serde_json::from_str::<TokenRecord>(&payload)
                .map_err(|e| StoreError::Backend(format!("corrupt record {}: {}", key, e)))
        })
        .transpose()
    }

    async fn delete_by_id(&self, jti: &Jti) -> Result<(), StoreError> {
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(&key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
