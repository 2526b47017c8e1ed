use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::{Filter, reject};

/// Largest JSON body accepted by the token endpoints.
const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let request_timeout = server.request_timeout;

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_timeout(request_timeout))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_timeout(request_timeout))
        .and_then(handler::refresh);

    let verify = warp::get()
        .and(warp::path("verify"))
        .and(warp::path::end())
        .and(with_verification(
            server.auth_service.clone(),
            request_timeout,
        ))
        .and_then(handler::verify);

    login.or(refresh).or(verify)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_timeout(
    request_timeout: Duration,
) -> impl Filter<Extract = (Duration,), Error = Infallible> + Clone {
    warp::any().map(move || request_timeout)
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
    request_timeout: Duration,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>("authorization").and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                handler::with_deadline(request_timeout, auth_service.verify_token(token)).await
            } else {
                Err(reject::custom(ApiRejection::from(ApiErrorCode::InvalidToken)))
            }
        }
    })
}
