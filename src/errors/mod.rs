//! Error handling module for the TeamUp backend.
//!
//! Every business rule violation has its own variant so callers branch on the kind,
//! not on message text. Variants map to HTTP status codes and the response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    // Validation
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DUPLICATE_TAG: &str = "DUPLICATE_TAG";
    pub const UNKNOWN_TAG: &str = "UNKNOWN_TAG";
    pub const INVALID_ROLE: &str = "INVALID_ROLE";
    pub const COVER_IMAGE_MISMATCH: &str = "COVER_IMAGE_MISMATCH";
    pub const CONFLICTING_UPDATE_DELETE: &str = "CONFLICTING_UPDATE_DELETE";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";

    // State conflicts
    pub const ALREADY_APPROVED: &str = "ALREADY_APPROVED";
    pub const ALREADY_MEMBER: &str = "ALREADY_MEMBER";
    pub const NO_LEADER: &str = "NO_LEADER";
    pub const NEGATIVE_RECRUITMENT: &str = "NEGATIVE_RECRUITMENT";
    pub const RECONCILIATION_INVARIANT: &str = "RECONCILIATION_INVARIANT";
    pub const ROLE_CLOSED: &str = "ROLE_CLOSED";
    pub const NOT_RECRUITING: &str = "NOT_RECRUITING";
    pub const NO_CANCELABLE_APPLICATION: &str = "NO_CANCELABLE_APPLICATION";
    pub const NOT_PENDING: &str = "NOT_PENDING";
    pub const DUPLICATE_TEAM_NAME: &str = "DUPLICATE_TEAM_NAME";

    // Not found
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const APPLICANT_NOT_FOUND: &str = "APPLICANT_NOT_FOUND";
    pub const NOT_TEAM_MEMBER: &str = "NOT_TEAM_MEMBER";

    // Infrastructure
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const NOTIFICATION_ERROR: &str = "NOTIFICATION_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Generic malformed input
    Validation(String),
    /// The same stack name was requested twice
    DuplicateTag(String),
    /// Requested stacks that are not in the catalog
    UnknownTag { requested: usize, resolved: usize },
    /// A role string outside the role enum
    InvalidRole(String),
    /// Cover image add/delete counts are not both 0 or both 1
    CoverImageMismatch { added: usize, deleted: usize },
    /// Membership rows both updated and deleted in one request
    ConflictingUpdateDelete(Vec<i64>),
    /// Body could not be deserialized
    BadRequest(String),

    /// Applicant already approved
    AlreadyApproved(i64),
    /// Subject already an approved member of the team
    AlreadyMember { team_id: i64, user_id: i64 },
    /// Resulting roster has no leader
    NoLeader,
    /// Sum of role counters is negative
    NegativeRecruitment(i64),
    /// Reconciliation postcondition violated
    ReconciliationInvariant(String),
    /// The requested role has no open slot
    RoleClosed(Role),
    /// The team is not recruiting at all
    NotRecruiting(i64),
    /// No pending application to cancel
    NoCancelableApplication { team_id: i64, user_id: i64 },
    /// Application is not pending
    NotPending(i64),
    /// Another live team already uses the name
    DuplicateTeamName(String),

    /// Resource not found
    NotFound(String),
    /// Applicant row missing for the team
    ApplicantNotFound(i64),
    /// Requester has no active approved membership in the team
    NotTeamMember { team_id: i64, user_id: i64 },

    /// Database error
    Database(String),
    /// Search index error
    Search(String),
    /// Notification delivery error
    Notification(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateTag(_)
            | AppError::UnknownTag { .. }
            | AppError::InvalidRole(_)
            | AppError::CoverImageMismatch { .. }
            | AppError::ConflictingUpdateDelete(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyApproved(_)
            | AppError::AlreadyMember { .. }
            | AppError::NoLeader
            | AppError::NegativeRecruitment(_)
            | AppError::ReconciliationInvariant(_)
            | AppError::RoleClosed(_)
            | AppError::NotRecruiting(_)
            | AppError::NoCancelableApplication { .. }
            | AppError::NotPending(_)
            | AppError::DuplicateTeamName(_) => StatusCode::CONFLICT,
            AppError::NotFound(_)
            | AppError::ApplicantNotFound(_)
            | AppError::NotTeamMember { .. } => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Search(_)
            | AppError::Notification(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::DuplicateTag(_) => codes::DUPLICATE_TAG,
            AppError::UnknownTag { .. } => codes::UNKNOWN_TAG,
            AppError::InvalidRole(_) => codes::INVALID_ROLE,
            AppError::CoverImageMismatch { .. } => codes::COVER_IMAGE_MISMATCH,
            AppError::ConflictingUpdateDelete(_) => codes::CONFLICTING_UPDATE_DELETE,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::AlreadyApproved(_) => codes::ALREADY_APPROVED,
            AppError::AlreadyMember { .. } => codes::ALREADY_MEMBER,
            AppError::NoLeader => codes::NO_LEADER,
            AppError::NegativeRecruitment(_) => codes::NEGATIVE_RECRUITMENT,
            AppError::ReconciliationInvariant(_) => codes::RECONCILIATION_INVARIANT,
            AppError::RoleClosed(_) => codes::ROLE_CLOSED,
            AppError::NotRecruiting(_) => codes::NOT_RECRUITING,
            AppError::NoCancelableApplication { .. } => codes::NO_CANCELABLE_APPLICATION,
            AppError::NotPending(_) => codes::NOT_PENDING,
            AppError::DuplicateTeamName(_) => codes::DUPLICATE_TEAM_NAME,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::ApplicantNotFound(_) => codes::APPLICANT_NOT_FOUND,
            AppError::NotTeamMember { .. } => codes::NOT_TEAM_MEMBER,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Search(_) => codes::SEARCH_ERROR,
            AppError::Notification(_) => codes::NOTIFICATION_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::ReconciliationInvariant(msg)
            | AppError::NotFound(msg)
            | AppError::Database(msg)
            | AppError::Search(msg)
            | AppError::Notification(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::DuplicateTag(name) => format!("Stack {} requested more than once", name),
            AppError::UnknownTag {
                requested,
                resolved,
            } => format!(
                "Unknown stack: requested {} distinct stacks, resolved {}",
                requested, resolved
            ),
            AppError::InvalidRole(role) => format!("Invalid role: {}", role),
            AppError::CoverImageMismatch { added, deleted } => format!(
                "Cover image must be replaced one for one (added {}, deleted {})",
                added, deleted
            ),
            AppError::ConflictingUpdateDelete(ids) => format!(
                "Members {:?} are both updated and deleted in the same request",
                ids
            ),
            AppError::AlreadyApproved(id) => format!("Applicant {} is already approved", id),
            AppError::AlreadyMember { team_id, user_id } => {
                format!("User {} is already a member of team {}", user_id, team_id)
            }
            AppError::NoLeader => "The team must keep at least one leader".to_string(),
            AppError::NegativeRecruitment(total) => {
                format!("Recruitment total cannot be negative (got {})", total)
            }
            AppError::RoleClosed(role) => {
                format!("Recruitment for role {} is closed", role.as_str())
            }
            AppError::NotRecruiting(id) => format!("Team {} is not recruiting", id),
            AppError::NoCancelableApplication { team_id, user_id } => format!(
                "User {} has no pending application for team {}",
                user_id, team_id
            ),
            AppError::NotPending(id) => format!("Application {} is not pending", id),
            AppError::DuplicateTeamName(name) => format!("Team name {} is already taken", name),
            AppError::ApplicantNotFound(id) => format!("Applicant {} not found", id),
            AppError::NotTeamMember { team_id, user_id } => {
                format!("User {} is not an active member of team {}", user_id, team_id)
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<tantivy::TantivyError> for AppError {
    fn from(err: tantivy::TantivyError) -> Self {
        tracing::error!("Search error: {:?}", err);
        AppError::Search(format!("Search error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Notification error: {:?}", err);
        AppError::Notification(format!("Notification error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_kinds_are_bad_request() {
        let errors = [
            AppError::DuplicateTag("React".to_string()),
            AppError::UnknownTag {
                requested: 2,
                resolved: 1,
            },
            AppError::InvalidRole("DESIGNER".to_string()),
            AppError::CoverImageMismatch {
                added: 1,
                deleted: 0,
            },
            AppError::ConflictingUpdateDelete(vec![3]),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{}", err);
        }
    }

    #[test]
    fn test_state_conflicts_are_conflict() {
        assert_eq!(AppError::NoLeader.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::RoleClosed(Role::Frontend).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::AlreadyApproved(7).error_code(),
            codes::ALREADY_APPROVED
        );
    }

    #[test]
    fn test_missing_requester_is_not_found() {
        let err = AppError::NotTeamMember {
            team_id: 1,
            user_id: 2,
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "NOT_TEAM_MEMBER: User 2 is not an active member of team 1");
    }

    #[test]
    fn test_role_closed_message_names_role() {
        let err = AppError::RoleClosed(Role::DataEngineer);
        assert_eq!(err.message(), "Recruitment for role DATA_ENGINEER is closed");
    }
}
