/// Walks one session through login, rotation and replay against the
/// in-memory store. Needs no database.
///
/// $ cargo run --bin rotation_demo
use keyturn::application_impl::*;
use keyturn::application_port::*;
use keyturn::domain_model::UserId;
use keyturn::domain_port::SystemClock;
use keyturn::infra_memory::MemoryTokenStore;
use keyturn::logger::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "keyturn=debug,rotation_demo=debug".to_string(),
    })?;

    let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs512Codec::new(JwtConfig {
        issuer: "keyturn.demo".to_string(),
        audience: "demo-client".to_string(),
        access_ttl: DEFAULT_ACCESS_TTL,
        refresh_ttl: DEFAULT_REFRESH_TTL,
        signing_key: SigningSecret::new(vec![0x5a; MIN_SECRET_LEN])?,
    })?);
    let auth_service = RealAuthService::new(
        token_codec,
        Arc::new(MemoryTokenStore::new()),
        Arc::new(SystemClock),
    );

    let first = auth_service.login(UserId::from("user-42")).await?;
    info!(jti = %first.jti, "logged in");

    let user = auth_service.verify_token(&first.access_token.0).await?;
    info!(%user, "access token verified");

    let second = auth_service.refresh(&first.refresh_token.0).await?;
    info!(old = %first.jti, new = %second.jti, "rotated");

    match auth_service.refresh(&first.refresh_token.0).await {
        Ok(_) => error!("replayed refresh token was accepted"),
        Err(e) => info!(kind = ?e.kind(), "replay rejected: {}", e),
    }

    Ok(())
}
