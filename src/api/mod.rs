//! REST API module.
//!
//! Thin handlers over the recruitment service. Business rules live in the service;
//! handlers only extract, delegate and wrap the result in the response envelope.

mod applications;
mod search;
mod stacks;
mod teams;
mod users;

pub use applications::*;
pub use search::*;
pub use stacks::*;
pub use teams::*;
pub use users::*;

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Header carrying the authenticated subject, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Unwrap a JSON body, turning axum's rejection into the error envelope.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// The already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub i64);

impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", USER_ID_HEADER)))?;

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(Subject)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid {} header", USER_ID_HEADER)))
    }
}
