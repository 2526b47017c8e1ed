use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Token identifier shared by the access and refresh token of one pair.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Jti(pub String);

impl Jti {
    pub fn generate() -> Self {
        Jti(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Jti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

impl fmt::Display for TokenUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenUse::Access => write!(f, "access"),
            TokenUse::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

impl RefreshToken {
    /// Hex SHA-256 of the raw token, kept on the record instead of the token.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

/// Server-side bookkeeping for one outstanding token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub jti: Jti,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_hash: String,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub jti: Jti,
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn generated_jtis_are_distinct_uuids() {
        let a = Jti::generate();
        let b = Jti::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn fingerprint_is_stable_hex_sha256() {
        let token = RefreshToken("abc".to_string());
        assert_eq!(
            token.fingerprint(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(token.fingerprint(), RefreshToken("abd".into()).fingerprint());
    }

    #[test]
    fn record_expires_at_boundary() {
        let now = Utc::now();
        let record = TokenRecord {
            jti: Jti::generate(),
            user_id: UserId::from("user-1"),
            issued_at: now,
            expires_at: now + Duration::seconds(10),
            token_hash: String::new(),
        };
        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + Duration::seconds(10)));
        assert!(record.is_expired_at(now + Duration::seconds(11)));
    }

    #[test]
    fn token_use_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenUse::Refresh).unwrap(), "\"refresh\"");
        assert_eq!(TokenUse::Access.to_string(), "access");
    }
}
