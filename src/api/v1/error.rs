use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, code, message) = if let Some(rejection) = err.find::<ApiRejection>() {
        (
            rejection.code.status(),
            rejection.code.clone(),
            rejection.message.clone(),
        )
    } else if err.is_not_found() {
        let code = ApiErrorCode::NotFound;
        (StatusCode::NOT_FOUND, code.clone(), code.to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, ApiErrorCode::BadRequest, e.to_string())
    } else if err.find::<reject::MissingHeader>().is_some() {
        let code = ApiErrorCode::InvalidToken;
        (StatusCode::UNAUTHORIZED, code.clone(), code.to_string())
    } else if let Some(code) = client_body_error(&err) {
        (code.status(), code.clone(), code.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        let code = ApiErrorCode::MethodNotAllowed;
        (StatusCode::METHOD_NOT_ALLOWED, code.clone(), code.to_string())
    } else {
        error!("unhandled rejection: {:?}", err);
        let code = ApiErrorCode::InternalError;
        (StatusCode::INTERNAL_SERVER_ERROR, code.clone(), code.to_string())
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

/// Body rejections from a POST route. These must win over the method
/// rejection that the GET route contributes to the same combined rejection.
fn client_body_error(err: &Rejection) -> Option<ApiErrorCode> {
    if err.find::<reject::PayloadTooLarge>().is_some() {
        Some(ApiErrorCode::PayloadTooLarge)
    } else if err.find::<reject::LengthRequired>().is_some() {
        Some(ApiErrorCode::LengthRequired)
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        Some(ApiErrorCode::UnsupportedMediaType)
    } else {
        None
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
pub enum ApiErrorCode {
    #[error("Missing user_id")]
    MissingUserId,
    #[error("Malformed request")]
    BadRequest,
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Content-Length required")]
    LengthRequired,
    #[error("Unsupported media type")]
    UnsupportedMediaType,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Session expired or already used")]
    Unauthorized,
    #[error("Token storage unavailable")]
    StorageUnavailable,
    #[error("Request timed out")]
    Timeout,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MissingUserId | ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::LengthRequired => StatusCode::LENGTH_REQUIRED,
            ApiErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiErrorCode::InvalidToken | ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A rejection carrying a code and a message that is safe to show the client.
#[derive(Debug)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl reject::Reject for ApiRejection {}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection {
            message: code.to_string(),
            code,
        }
    }
}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        let code = match error.kind() {
            ErrorKind::Validation => ApiErrorCode::InvalidToken,
            ErrorKind::Unauthorized => ApiErrorCode::Unauthorized,
            ErrorKind::Storage => {
                warn!("storage error: {}", error);
                ApiErrorCode::StorageUnavailable
            }
            ErrorKind::Fatal => {
                error!("fatal error while serving request: {}", error);
                ApiErrorCode::InternalError
            }
        };
        ApiRejection {
            code,
            message: error.public_message(),
        }
    }
}
