//! Team model: the recruitment posting and its read-model.

use serde::{Deserialize, Serialize};

use super::{Member, RecruitmentCounters, RequestedStack};

/// A team recruiting members for a collaborative project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub counters: RecruitmentCounters,
    pub is_recruited: bool,
    pub is_finished: bool,
    #[serde(default, skip_serializing)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A stack attached to a team, joined with its catalog name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStack {
    pub stack_id: i64,
    pub name: String,
    pub is_main: bool,
}

/// Read-model returned after create/update and by `GET /api/teams/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub stacks: Vec<TeamStack>,
    pub members: Vec<Member>,
}

/// Member entry in a create/update request.
///
/// `role` stays a string here so an unknown role surfaces as `INVALID_ROLE`
/// instead of a body rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredMember {
    pub user_id: i64,
    #[serde(default)]
    pub is_leader: bool,
    pub role: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Request body for creating a team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub counters: RecruitmentCounters,
    #[serde(default, alias = "isRecruiting")]
    pub is_recruited: bool,
    #[serde(default)]
    pub stacks: Vec<RequestedStack>,
    #[serde(default)]
    pub members: Vec<DesiredMember>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Request body for updating a team.
///
/// `members` is the full desired roster. `delete_member_ids` are membership row ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub counters: RecruitmentCounters,
    #[serde(default, alias = "isRecruiting")]
    pub is_recruited: bool,
    #[serde(default)]
    pub is_finished: Option<bool>,
    #[serde(default)]
    pub stacks: Vec<RequestedStack>,
    #[serde(default)]
    pub members: Vec<DesiredMember>,
    #[serde(default)]
    pub delete_member_ids: Vec<i64>,
    /// Newly uploaded cover image references.
    #[serde(default)]
    pub cover_images: Vec<String>,
    /// Cover image references to drop.
    #[serde(default)]
    pub delete_cover_images: Vec<String>,
}
