use super::util::is_dup_key;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlTokenStore {
    pool: MySqlPool,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlTokenStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<TokenRecord, StoreError> {
        let jti: String = row
            .try_get("jti")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let issued_at: DateTime<Utc> = row
            .try_get("issued_at")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let token_hash: String = row
            .try_get("token_hash")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(TokenRecord {
            jti: Jti(jti),
            user_id: UserId(user_id),
            issued_at,
            expires_at,
            token_hash,
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn store(&self, record: &TokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO token_record (jti, user_id, issued_at, expires_at, token_hash)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(record.jti.as_str())
        .bind(record.user_id.as_str())
        .bind(record.issued_at)
        .bind(record.expires_at)
        .bind(&record.token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                StoreError::Conflict
            } else {
                StoreError::Backend(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, jti: &Jti) -> Result<Option<TokenRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT jti, user_id, issued_at, expires_at, token_hash
FROM token_record
WHERE jti = ?
"#,
        )
        .bind(jti.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn delete_by_id(&self, jti: &Jti) -> Result<(), StoreError> {
        // A single DELETE is atomic; a concurrent loser sees zero rows affected.
        let result = sqlx::query(
            r#"
DELETE FROM token_record
WHERE jti = ?
"#,
        )
        .bind(jti.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
