//! User API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::{body, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, User};
use crate::AppState;

/// POST /api/users - Register a user.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let request = body(payload)?;

    if request.nickname.trim().is_empty() {
        return Err(AppError::Validation("Nickname is required".to_string()));
    }

    success(state.repo.create_user(&request).await?)
}
