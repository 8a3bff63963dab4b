//! Candidate application lifecycle for one (team, user) pair.
//!
//! ```text
//! (none) ──apply──▶ PENDING ──accept──▶ APPROVED
//!                      │  └──reject──▶ REJECTED ──apply──▶ PENDING
//!                      └──cancel──▶ CANCELLED (soft-deleted) ──apply──▶ PENDING
//! ```
//!
//! These checks are pure; the service runs them inside the transaction that
//! performs the write.

use crate::errors::AppError;
use crate::models::{Member, MemberStatus, Role, Team};

/// How an accepted application is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    /// No row for the pair yet.
    Insert,
    /// Overwrite the earlier row in place.
    Reapply { member_id: i64 },
}

pub fn decide_apply(
    team: &Team,
    user_id: i64,
    role: Role,
    existing: Option<&Member>,
) -> Result<ApplyAction, AppError> {
    if !team.is_recruited || team.is_finished {
        return Err(AppError::NotRecruiting(team.id));
    }
    if team.counters.get(role) <= 0 {
        return Err(AppError::RoleClosed(role));
    }

    match existing {
        None => Ok(ApplyAction::Insert),
        Some(member) if member.is_active() => Err(AppError::AlreadyMember {
            team_id: team.id,
            user_id,
        }),
        Some(member) => Ok(ApplyAction::Reapply {
            member_id: member.id,
        }),
    }
}

/// Returns the row id to soft-delete.
pub fn check_cancel(team_id: i64, user_id: i64, existing: Option<&Member>) -> Result<i64, AppError> {
    match existing {
        Some(member) if member.status == MemberStatus::Pending && !member.is_deleted => {
            Ok(member.id)
        }
        _ => Err(AppError::NoCancelableApplication { team_id, user_id }),
    }
}

/// Only active approved members may decide on applications.
pub fn check_requester(
    team_id: i64,
    requester_id: i64,
    requester: Option<&Member>,
) -> Result<(), AppError> {
    match requester {
        Some(member) if member.team_id == team_id && member.is_active() => Ok(()),
        _ => Err(AppError::NotTeamMember {
            team_id,
            user_id: requester_id,
        }),
    }
}

/// Applicant must be a live PENDING row of the team. Used for both accept and reject.
pub fn check_decidable(
    team_id: i64,
    applicant_id: i64,
    applicant: Option<&Member>,
) -> Result<&Member, AppError> {
    let member = match applicant {
        Some(member) if member.team_id == team_id && !member.is_deleted => member,
        _ => return Err(AppError::ApplicantNotFound(applicant_id)),
    };

    match member.status {
        MemberStatus::Pending => Ok(member),
        MemberStatus::Approved => Err(AppError::AlreadyApproved(applicant_id)),
        MemberStatus::Rejected | MemberStatus::Cancelled => Err(AppError::NotPending(applicant_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecruitmentCounters;

    fn team(frontend_num: i64, backend_num: i64, is_recruited: bool) -> Team {
        Team {
            id: 10,
            name: "Night Owls".to_string(),
            description: None,
            counters: RecruitmentCounters {
                frontend_num,
                backend_num,
                ..Default::default()
            },
            is_recruited,
            is_finished: false,
            is_deleted: false,
            cover_image: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn row(id: i64, status: MemberStatus, is_deleted: bool) -> Member {
        Member {
            id,
            team_id: 10,
            user_id: 3,
            role: Role::Frontend,
            is_leader: false,
            status,
            is_deleted,
            summary: None,
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_first_application_inserts() {
        let action = decide_apply(&team(1, 0, true), 3, Role::Frontend, None).unwrap();
        assert_eq!(action, ApplyAction::Insert);
    }

    #[test]
    fn test_closed_role_rejected() {
        let err = decide_apply(&team(0, 2, true), 3, Role::Frontend, None).unwrap_err();
        assert!(matches!(err, AppError::RoleClosed(Role::Frontend)));
    }

    #[test]
    fn test_team_not_recruiting_rejected() {
        let err = decide_apply(&team(1, 0, false), 3, Role::Frontend, None).unwrap_err();
        assert!(matches!(err, AppError::NotRecruiting(10)));
    }

    #[test]
    fn test_approved_member_cannot_apply_again() {
        let existing = row(5, MemberStatus::Approved, false);
        let err = decide_apply(&team(1, 0, true), 3, Role::Frontend, Some(&existing)).unwrap_err();
        assert!(matches!(err, AppError::AlreadyMember { team_id: 10, user_id: 3 }));
    }

    #[test]
    fn test_reapply_reuses_row() {
        for existing in [
            row(5, MemberStatus::Rejected, false),
            row(5, MemberStatus::Pending, true),
            row(5, MemberStatus::Cancelled, true),
            row(5, MemberStatus::Approved, true),
        ] {
            let action =
                decide_apply(&team(1, 0, true), 3, Role::Frontend, Some(&existing)).unwrap();
            assert_eq!(action, ApplyAction::Reapply { member_id: 5 });
        }
    }

    #[test]
    fn test_cancel_only_live_pending() {
        assert_eq!(
            check_cancel(10, 3, Some(&row(5, MemberStatus::Pending, false))).unwrap(),
            5
        );
        for existing in [
            row(5, MemberStatus::Pending, true),
            row(5, MemberStatus::Rejected, false),
            row(5, MemberStatus::Approved, false),
        ] {
            assert!(matches!(
                check_cancel(10, 3, Some(&existing)),
                Err(AppError::NoCancelableApplication { .. })
            ));
        }
        assert!(check_cancel(10, 3, None).is_err());
    }

    #[test]
    fn test_requester_must_be_active() {
        assert!(check_requester(10, 3, Some(&row(1, MemberStatus::Approved, false))).is_ok());
        assert!(matches!(
            check_requester(10, 3, Some(&row(1, MemberStatus::Pending, false))),
            Err(AppError::NotTeamMember { .. })
        ));
        assert!(check_requester(10, 3, Some(&row(1, MemberStatus::Approved, true))).is_err());
        assert!(check_requester(10, 3, None).is_err());
    }

    #[test]
    fn test_accepting_approved_applicant_fails() {
        let approved = row(5, MemberStatus::Approved, false);
        assert!(matches!(
            check_decidable(10, 5, Some(&approved)),
            Err(AppError::AlreadyApproved(5))
        ));
    }

    #[test]
    fn test_decidable_requires_live_row_of_team() {
        assert!(matches!(
            check_decidable(10, 5, None),
            Err(AppError::ApplicantNotFound(5))
        ));
        let mut elsewhere = row(5, MemberStatus::Pending, false);
        elsewhere.team_id = 11;
        assert!(matches!(
            check_decidable(10, 5, Some(&elsewhere)),
            Err(AppError::ApplicantNotFound(5))
        ));
        assert!(matches!(
            check_decidable(10, 5, Some(&row(5, MemberStatus::Rejected, false))),
            Err(AppError::NotPending(5))
        ));
        assert!(check_decidable(10, 5, Some(&row(5, MemberStatus::Pending, false))).is_ok());
    }
}
