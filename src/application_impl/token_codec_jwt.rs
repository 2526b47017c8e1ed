use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// HS512 keys shorter than the hash output weaken the MAC.
pub const MIN_SECRET_LEN: usize = 64;

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upper bound for either TTL.
pub const MAX_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "signing secret must be at least {} bytes, got {}",
                MIN_SECRET_LEN,
                bytes.len()
            )));
        }
        Ok(SigningSecret(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: SigningSecret,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
    token_use: TokenUse,
}

pub struct JwtHs512Codec {
    issuer: String,
    audience: String,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs512Codec {
    pub fn new(cfg: JwtConfig) -> Result<Self, AuthError> {
        if cfg.access_ttl.is_zero() || cfg.refresh_ttl.is_zero() {
            return Err(AuthError::Config("token TTLs must be non-zero".to_string()));
        }
        if cfg.access_ttl > cfg.refresh_ttl {
            return Err(AuthError::Config(
                "access TTL must not exceed refresh TTL".to_string(),
            ));
        }
        if cfg.refresh_ttl > MAX_TTL {
            return Err(AuthError::Config(format!(
                "refresh TTL must not exceed {} seconds",
                MAX_TTL.as_secs()
            )));
        }
        let access_ttl =
            TimeDelta::from_std(cfg.access_ttl).map_err(|e| AuthError::Config(e.to_string()))?;
        let refresh_ttl =
            TimeDelta::from_std(cfg.refresh_ttl).map_err(|e| AuthError::Config(e.to_string()))?;

        // Expiry is judged against the injected clock by callers, not here.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);

        Ok(JwtHs512Codec {
            encoding_key: EncodingKey::from_secret(cfg.signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(cfg.signing_key.as_bytes()),
            issuer: cfg.issuer,
            audience: cfg.audience,
            access_ttl,
            refresh_ttl,
            validation,
        })
    }

    fn encode_token(
        &self,
        user: &UserId,
        jti: &Jti,
        issued_at: DateTime<Utc>,
        token_use: TokenUse,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let ttl = match token_use {
            TokenUse::Access => self.access_ttl,
            TokenUse::Refresh => self.refresh_ttl,
        };
        let exp_dt = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Config(format!("{} token expiry out of range", token_use)))?;
        let claims = Claims {
            sub: user.0.clone(),
            jti: jti.0.clone(),
            iat: issued_at.timestamp(),
            exp: exp_dt.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            token_use,
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn decode_token(&self, token: &str, expected: TokenUse) -> Result<Claims, AuthError> {
        // A header that does not parse is a broken token, not broken claims.
        jsonwebtoken::decode_header(token).map_err(|_| AuthError::TokenInvalid(expected))?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::Json(_) | JwtErrorKind::MissingRequiredClaim(_) => {
                    AuthError::MalformedClaims
                }
                _ => AuthError::TokenInvalid(expected),
            }
        })?;
        let claims = data.claims;

        if claims.token_use != expected {
            return Err(AuthError::TokenInvalid(expected));
        }
        if claims.sub.is_empty() || claims.jti.is_empty() {
            return Err(AuthError::MalformedClaims);
        }
        Ok(claims)
    }

    fn to_verify_result(claims: Claims) -> Result<TokenVerifyResult, AuthError> {
        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::MalformedClaims)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedClaims)?;
        Ok(TokenVerifyResult {
            user_id: UserId(claims.sub),
            jti: Jti(claims.jti),
            issued_at,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs512Codec {
    async fn issue_access_token(
        &self,
        user: &UserId,
        jti: &Jti,
        issued_at: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = self.encode_token(user, jti, issued_at, TokenUse::Access)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        user: &UserId,
        jti: &Jti,
        issued_at: DateTime<Utc>,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = self.encode_token(user, jti, issued_at, TokenUse::Refresh)?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = self.decode_token(&token.0, TokenUse::Access)?;
        Self::to_verify_result(claims)
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = self.decode_token(&token.0, TokenUse::Refresh)?;
        Self::to_verify_result(claims)
    }
}
