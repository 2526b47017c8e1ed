use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Jwt, Settings};
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub request_timeout: Duration,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let mut pool = None;

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => {
                let token_codec = build_token_codec(&settings.jwt)?;

                let token_store: Arc<dyn TokenStore> = match settings.store.backend.as_str() {
                    "memory" => {
                        warn!("memory token store: refresh tokens do not survive a restart");
                        Arc::new(MemoryTokenStore::new())
                    }
                    "mysql" => {
                        let dsn = settings
                            .store
                            .mysql_dsn
                            .as_deref()
                            .ok_or_else(|| anyhow!("store.mysql_dsn is required for mysql"))?;
                        let mysql_pool = Pool::<MySql>::connect(dsn).await?;
                        sqlx::raw_sql(TOKEN_RECORD_SCHEMA)
                            .execute(&mysql_pool)
                            .await?;
                        pool = Some(mysql_pool.clone());
                        Arc::new(MySqlTokenStore::new(mysql_pool))
                    }
                    "redis" => {
                        let dsn = settings
                            .store
                            .redis_dsn
                            .as_deref()
                            .ok_or_else(|| anyhow!("store.redis_dsn is required for redis"))?;
                        let redis_client = redis::Client::open(dsn)?;
                        let redis_manager = redis_client.get_connection_manager().await?;
                        Arc::new(RedisTokenStore::new(
                            redis_manager,
                            settings.store.redis_prefix.clone(),
                        ))
                    }
                    other => return Err(anyhow!("Unknown store backend: {}", other)),
                };

                Arc::new(RealAuthService::new(
                    token_codec,
                    token_store,
                    Arc::new(SystemClock),
                ))
            }
            other => return Err(anyhow!("Unknown auth backend: {}", other)),
        };

        info!(
            auth = %settings.auth.backend,
            store = %settings.store.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            request_timeout: Duration::from_secs(settings.http.request_timeout_secs),
            pool,
        })
    }

    pub fn with_auth_service(
        auth_service: Arc<dyn AuthService>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            auth_service,
            request_timeout,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Build the signing codec. Any problem here is fatal to startup.
pub fn build_token_codec(jwt: &Jwt) -> anyhow::Result<Arc<dyn TokenCodec>> {
    let signing_key = SigningSecret::new(jwt.resolve_secret()?)?;
    let codec = JwtHs512Codec::new(JwtConfig {
        issuer: jwt.issuer.clone(),
        audience: jwt.audience.clone(),
        access_ttl: Duration::from_secs(jwt.access_ttl_secs),
        refresh_ttl: Duration::from_secs(jwt.refresh_ttl_secs),
        signing_key,
    })?;
    Ok(Arc::new(codec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::UserId;
    use crate::settings::parse_settings;

    #[tokio::test]
    async fn dev_settings_build_a_working_service() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        let server = Server::try_new(&settings).await.unwrap();

        let pair = server
            .auth_service
            .login(UserId::from("user-42"))
            .await
            .unwrap();
        let rotated = server
            .auth_service
            .refresh(&pair.refresh_token.0)
            .await
            .unwrap();
        assert_ne!(rotated.jti, pair.jti);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_backends_are_rejected() {
        let mut settings = parse_settings(Some("settings/dev.toml")).unwrap();
        settings.store.backend = "cassandra".to_string();
        assert!(Server::try_new(&settings).await.is_err());

        let mut settings = parse_settings(Some("settings/dev.toml")).unwrap();
        settings.auth.backend = "ldap".to_string();
        assert!(Server::try_new(&settings).await.is_err());
    }

    #[tokio::test]
    async fn short_secret_aborts_startup() {
        let mut settings = parse_settings(Some("settings/dev.toml")).unwrap();
        settings.jwt.secret = Some("short".to_string());
        let err = Server::try_new(&settings).await.err().unwrap();
        let auth_err = err.downcast_ref::<AuthError>().unwrap();
        assert_eq!(auth_err.kind(), ErrorKind::Fatal);
    }

    #[tokio::test]
    async fn fake_backend_needs_no_secret() {
        let mut settings = parse_settings(Some("settings/dev.toml")).unwrap();
        settings.auth.backend = "fake".to_string();
        settings.jwt.secret = None;
        let server = Server::try_new(&settings).await.unwrap();
        assert!(server.auth_service.verify_token("fake-access-token:bob").await.is_ok());
    }
}
