//! Application API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{body, success, ApiResult, Subject};
use crate::models::{ApplyRequest, Member};
use crate::AppState;

/// POST /api/teams/:id/applications - Apply to a team as the caller.
pub async fn apply(
    State(state): State<AppState>,
    Subject(user_id): Subject,
    Path(team_id): Path<i64>,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> ApiResult<Member> {
    let request = body(payload)?;
    success(state.service.apply(team_id, user_id, &request).await?)
}

/// DELETE /api/teams/:id/applications - Withdraw the caller's pending application.
pub async fn cancel_application(
    State(state): State<AppState>,
    Subject(user_id): Subject,
    Path(team_id): Path<i64>,
) -> ApiResult<()> {
    state.service.cancel(team_id, user_id).await?;
    success(())
}

/// PUT /api/teams/:id/applications/:member_id/accept
pub async fn accept_application(
    State(state): State<AppState>,
    Subject(requester_id): Subject,
    Path((team_id, member_id)): Path<(i64, i64)>,
) -> ApiResult<Member> {
    success(state.service.accept(team_id, member_id, requester_id).await?)
}

/// PUT /api/teams/:id/applications/:member_id/reject
pub async fn reject_application(
    State(state): State<AppState>,
    Subject(requester_id): Subject,
    Path((team_id, member_id)): Path<(i64, i64)>,
) -> ApiResult<Member> {
    success(state.service.reject(team_id, member_id, requester_id).await?)
}
