use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_token_expires_at: pair.access_token_expires_at,
            refresh_token_expires_at: pair.refresh_token_expires_at,
        }
    }
}

/// Run a service call under the request deadline. On timeout the call's
/// future is dropped, which cancels whatever store call it was awaiting.
pub async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, warp::Rejection> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ApiRejection::from).map_err(reject::custom),
        Err(_) => Err(reject::custom(ApiRejection::from(ApiErrorCode::Timeout))),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    request_timeout: Duration,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(reject::custom(ApiRejection::from(ApiErrorCode::MissingUserId)));
    }

    let pair = with_deadline(request_timeout, auth_service.login(UserId::from(user_id))).await?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenPairResponse::from(pair))))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
    request_timeout: Duration,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = with_deadline(request_timeout, auth_service.refresh(&body.refresh_token)).await?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenPairResponse::from(pair))))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user_id: UserId,
}

pub async fn verify(user_id: UserId) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(VerifyResponse { user_id })))
}
