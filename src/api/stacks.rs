//! Stack catalog endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::Stack;
use crate::AppState;

/// GET /api/stacks - List the stack catalog.
pub async fn list_stacks(State(state): State<AppState>) -> ApiResult<Vec<Stack>> {
    success(state.repo.list_stacks().await?)
}
