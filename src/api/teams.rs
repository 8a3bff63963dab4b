//! Team API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{body, success, ApiResult, Subject};
use crate::models::{CreateTeamRequest, TeamDetail, UpdateTeamRequest};
use crate::AppState;

/// POST /api/teams - Create a team with its initial roster.
pub async fn create_team(
    State(state): State<AppState>,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> ApiResult<TeamDetail> {
    let request = body(payload)?;
    success(state.service.create_team(&request).await?)
}

/// GET /api/teams/:id - Get a team with stacks and members.
pub async fn get_team(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<TeamDetail> {
    success(state.service.get_team(id).await?)
}

/// PUT /api/teams/:id - Update a team. The caller must be an active member.
pub async fn update_team(
    State(state): State<AppState>,
    Subject(requester_id): Subject,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTeamRequest>, JsonRejection>,
) -> ApiResult<TeamDetail> {
    let request = body(payload)?;
    success(state.service.update_team(id, requester_id, &request).await?)
}
