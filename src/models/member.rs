//! Membership rows and the application request.

use serde::{Deserialize, Serialize};

use super::Role;

/// Standing of a (team, subject) membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "PENDING",
            MemberStatus::Approved => "APPROVED",
            MemberStatus::Rejected => "REJECTED",
            MemberStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(MemberStatus::Pending),
            "APPROVED" => Some(MemberStatus::Approved),
            "REJECTED" => Some(MemberStatus::Rejected),
            "CANCELLED" => Some(MemberStatus::Cancelled),
            _ => None,
        }
    }
}

/// A membership row. One per (team, user) pair, soft-deleted rather than removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: Role,
    pub is_leader: bool,
    pub status: MemberStatus,
    #[serde(default, skip_serializing)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub updated_at: String,
}

impl Member {
    /// Approved and not soft-deleted.
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Approved && !self.is_deleted
    }
}

/// Request body for applying to a team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub role: Role,
    #[serde(default)]
    pub summary: Option<String>,
}
