//! Application transitions: apply, cancel, accept, reject.

use sqlx::SqliteConnection;

use super::RecruitmentService;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ApplyRequest, Member, MemberStatus, Team};
use crate::notify::{EventKind, NotificationPayload};
use crate::recruitment::application::{self, ApplyAction};
use crate::recruitment::ledger::{self, RecruitmentState};
use crate::search::{IndexDocument, MemberDocument, TeamDocument};

impl RecruitmentService {
    /// Submit (or resubmit) an application for one role.
    #[tracing::instrument(skip(self, request), fields(role = request.role.as_str()))]
    pub async fn apply(
        &self,
        team_id: i64,
        user_id: i64,
        request: &ApplyRequest,
    ) -> Result<Member, AppError> {
        let mut tx = self.repo.begin().await?;

        let team = live_team(&mut tx, team_id).await?;
        let existing = queries::find_membership(&mut tx, team_id, user_id).await?;
        let action = application::decide_apply(&team, user_id, request.role, existing.as_ref())?;

        let summary = request.summary.as_deref();
        let member_id = match action {
            ApplyAction::Insert => {
                queries::insert_application(&mut tx, team_id, user_id, request.role, summary)
                    .await?
            }
            ApplyAction::Reapply { member_id } => {
                queries::reapply(&mut tx, member_id, request.role, summary).await?;
                member_id
            }
        };
        let member = reload_member(&mut tx, member_id).await?;
        let payload = payload(&mut tx, &team, user_id, MemberStatus::Pending).await?;

        tx.commit().await?;
        tracing::info!(member_id, ?action, "Application submitted");

        self.notify_leaders(EventKind::ApplicationReceived, payload)
            .await;

        Ok(member)
    }

    /// Withdraw a pending application.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, team_id: i64, user_id: i64) -> Result<(), AppError> {
        let mut tx = self.repo.begin().await?;

        let team = live_team(&mut tx, team_id).await?;
        let existing = queries::find_membership(&mut tx, team_id, user_id).await?;
        let member_id = application::check_cancel(team_id, user_id, existing.as_ref())?;

        queries::cancel_application(&mut tx, member_id).await?;
        let payload = payload(&mut tx, &team, user_id, MemberStatus::Cancelled).await?;

        tx.commit().await?;
        tracing::info!(member_id, "Application cancelled");

        self.notify_leaders(EventKind::ApplicationCancelled, payload)
            .await;

        Ok(())
    }

    /// Approve a pending applicant and consume one slot of their role.
    #[tracing::instrument(skip(self))]
    pub async fn accept(
        &self,
        team_id: i64,
        applicant_id: i64,
        requester_id: i64,
    ) -> Result<Member, AppError> {
        let mut tx = self.repo.begin().await?;

        let team = live_team(&mut tx, team_id).await?;
        let requester = queries::find_membership(&mut tx, team_id, requester_id).await?;
        application::check_requester(team_id, requester_id, requester.as_ref())?;

        let applicant = queries::find_member(&mut tx, applicant_id).await?;
        let applicant = application::check_decidable(team_id, applicant_id, applicant.as_ref())?;
        let (role, user_id) = (applicant.role, applicant.user_id);

        if !queries::decide_pending(&mut tx, applicant_id, MemberStatus::Approved).await? {
            return Err(AppError::AlreadyApproved(applicant_id));
        }
        // The write lock is held, so the team row read above is current.
        let expected = ledger::apply_approval(
            RecruitmentState {
                counters: team.counters,
                is_recruited: team.is_recruited,
            },
            role,
        );
        if !queries::take_recruitment_slot(&mut tx, team_id, role).await? {
            tracing::warn!(
                role = role.as_str(),
                "Approved with no open slot; counter stays at zero"
            );
        }
        tracing::debug!(
            remaining = expected.counters.get(role),
            is_recruited = expected.is_recruited,
            "Recruitment ledger after approval"
        );

        let member = reload_member(&mut tx, applicant_id).await?;
        let payload = payload(&mut tx, &team, user_id, MemberStatus::Approved).await?;

        tx.commit().await?;
        tracing::info!(user_id, "Application approved");

        self.notify_channel(EventKind::ApplicationApproved, payload)
            .await;
        self.index(IndexDocument::Member(MemberDocument::new(&member, &team.name)))
            .await;
        match self.repo.get_team_detail(team_id).await {
            Ok(Some(detail)) => {
                self.index(IndexDocument::Team(TeamDocument::from(&detail)))
                    .await
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to reload team for indexing: {}", e),
        }

        Ok(member)
    }

    /// Decline a pending applicant. Counters are untouched.
    #[tracing::instrument(skip(self))]
    pub async fn reject(
        &self,
        team_id: i64,
        applicant_id: i64,
        requester_id: i64,
    ) -> Result<Member, AppError> {
        let mut tx = self.repo.begin().await?;

        let team = live_team(&mut tx, team_id).await?;
        let requester = queries::find_membership(&mut tx, team_id, requester_id).await?;
        application::check_requester(team_id, requester_id, requester.as_ref())?;

        let applicant = queries::find_member(&mut tx, applicant_id).await?;
        let user_id = application::check_decidable(team_id, applicant_id, applicant.as_ref())?
            .user_id;

        if !queries::decide_pending(&mut tx, applicant_id, MemberStatus::Rejected).await? {
            return Err(AppError::NotPending(applicant_id));
        }

        let member = reload_member(&mut tx, applicant_id).await?;
        let payload = payload(&mut tx, &team, user_id, MemberStatus::Rejected).await?;

        tx.commit().await?;
        tracing::info!(user_id, "Application rejected");

        self.notify_channel(EventKind::ApplicationRejected, payload)
            .await;

        Ok(member)
    }
}

async fn live_team(conn: &mut SqliteConnection, team_id: i64) -> Result<Team, AppError> {
    queries::find_team(conn, team_id)
        .await?
        .filter(|team| !team.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))
}

async fn reload_member(conn: &mut SqliteConnection, member_id: i64) -> Result<Member, AppError> {
    queries::find_member(conn, member_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Member {} vanished mid-transaction", member_id)))
}

/// Candidate contact comes from the user record; unknown users get none.
async fn payload(
    conn: &mut SqliteConnection,
    team: &Team,
    user_id: i64,
    status: MemberStatus,
) -> Result<NotificationPayload, AppError> {
    let contact = queries::find_user(conn, user_id)
        .await?
        .and_then(|user| user.email);

    Ok(NotificationPayload {
        team_id: team.id,
        team_name: team.name.clone(),
        candidate_id: Some(user_id),
        candidate_contact: contact,
        status: Some(status),
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{team_request, Fixture};
    use crate::errors::AppError;
    use crate::models::{ApplyRequest, MemberStatus, Role};
    use crate::notify::EventKind;

    fn apply_as(role: Role) -> ApplyRequest {
        ApplyRequest {
            role,
            summary: Some("Keen to help".to_string()),
        }
    }

    /// A team led by a fresh user, with one frontend and one backend slot.
    async fn recruiting_team(fixture: &Fixture) -> (i64, i64) {
        let leader = fixture.user("lead").await;
        let detail = fixture
            .service
            .create_team(&team_request("Recruiters", leader))
            .await
            .unwrap();
        (detail.team.id, leader)
    }

    #[tokio::test]
    async fn test_apply_creates_pending_row_and_notifies_leaders() {
        let fixture = Fixture::new().await;
        let (team_id, _) = recruiting_team(&fixture).await;
        let candidate = fixture.user("cand").await;

        let member = fixture
            .service
            .apply(team_id, candidate, &apply_as(Role::Frontend))
            .await
            .unwrap();

        assert_eq!(member.status, MemberStatus::Pending);
        assert_eq!(member.role, Role::Frontend);
        assert!(!member.is_leader);

        let leaders = fixture.notifier.leaders.lock().unwrap();
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].0, EventKind::ApplicationReceived);
        assert_eq!(
            leaders[0].1.candidate_contact.as_deref(),
            Some("cand@example.com")
        );
    }

    #[tokio::test]
    async fn test_apply_to_closed_role() {
        let fixture = Fixture::new().await;
        let (team_id, _) = recruiting_team(&fixture).await;

        let err = fixture
            .service
            .apply(team_id, 77, &apply_as(Role::Devops))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RoleClosed(Role::Devops)));
    }

    #[tokio::test]
    async fn test_apply_when_team_not_recruiting() {
        let fixture = Fixture::new().await;
        let mut request = team_request("Closed Doors", 1);
        request.is_recruited = false;
        let team = fixture.service.create_team(&request).await.unwrap();

        let err = fixture
            .service
            .apply(team.team.id, 2, &apply_as(Role::Frontend))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotRecruiting(_)));
    }

    #[tokio::test]
    async fn test_member_cannot_apply_again() {
        let fixture = Fixture::new().await;
        let (team_id, leader) = recruiting_team(&fixture).await;

        let err = fixture
            .service
            .apply(team_id, leader, &apply_as(Role::Frontend))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyMember { .. }));
    }

    #[tokio::test]
    async fn test_accept_takes_last_slot_and_closes_recruitment() {
        let fixture = Fixture::new().await;
        let leader = fixture.user("lead").await;
        let mut request = team_request("One Seat", leader);
        request.counters.backend_num = 0;
        let team = fixture.service.create_team(&request).await.unwrap();
        let team_id = team.team.id;

        let applicant = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Frontend))
            .await
            .unwrap();
        let approved = fixture
            .service
            .accept(team_id, applicant.id, leader)
            .await
            .unwrap();
        assert_eq!(approved.status, MemberStatus::Approved);

        let detail = fixture.service.get_team(team_id).await.unwrap();
        assert_eq!(detail.team.counters.frontend_num, 0);
        assert!(!detail.team.is_recruited);
        assert_eq!(detail.members.len(), 2);

        let channel = fixture.notifier.channel.lock().unwrap();
        let (kind, payload) = channel.last().unwrap();
        assert_eq!(*kind, EventKind::ApplicationApproved);
        assert_eq!(payload.status, Some(MemberStatus::Approved));
    }

    #[tokio::test]
    async fn test_accept_twice_is_already_approved() {
        let fixture = Fixture::new().await;
        let (team_id, leader) = recruiting_team(&fixture).await;
        let applicant = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();
        fixture
            .service
            .accept(team_id, applicant.id, leader)
            .await
            .unwrap();

        let err = fixture
            .service
            .accept(team_id, applicant.id, leader)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyApproved(id) if id == applicant.id));

        let detail = fixture.service.get_team(team_id).await.unwrap();
        assert_eq!(detail.team.counters.backend_num, 0);
        assert_eq!(detail.team.counters.frontend_num, 1);
        assert!(detail.team.is_recruited);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_both_succeed() {
        let fixture = Fixture::new().await;
        let leader = fixture.user("lead").await;

        for round in 0..5 {
            let mut request = team_request(&format!("Rush {}", round), leader);
            request.counters.frontend_num = 2;
            request.counters.backend_num = 0;
            let team_id = fixture.service.create_team(&request).await.unwrap().team.id;

            let first = fixture
                .service
                .apply(team_id, 100 + round, &apply_as(Role::Frontend))
                .await
                .unwrap();
            let second = fixture
                .service
                .apply(team_id, 200 + round, &apply_as(Role::Frontend))
                .await
                .unwrap();

            let (a, b) = tokio::join!(
                fixture.service.accept(team_id, first.id, leader),
                fixture.service.accept(team_id, second.id, leader)
            );
            assert_eq!(a.unwrap().status, MemberStatus::Approved);
            assert_eq!(b.unwrap().status, MemberStatus::Approved);

            let detail = fixture.service.get_team(team_id).await.unwrap();
            assert_eq!(detail.team.counters.frontend_num, 0);
            assert!(!detail.team.is_recruited);
            assert_eq!(detail.members.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_accept_past_quota_keeps_counter_at_zero() {
        let fixture = Fixture::new().await;
        let (team_id, leader) = recruiting_team(&fixture).await;
        let first = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();
        let second = fixture
            .service
            .apply(team_id, 6, &apply_as(Role::Backend))
            .await
            .unwrap();

        fixture.service.accept(team_id, first.id, leader).await.unwrap();
        let late = fixture
            .service
            .accept(team_id, second.id, leader)
            .await
            .unwrap();
        assert_eq!(late.status, MemberStatus::Approved);

        let detail = fixture.service.get_team(team_id).await.unwrap();
        assert_eq!(detail.team.counters.backend_num, 0);
        assert_eq!(detail.team.counters.frontend_num, 1);
    }

    #[tokio::test]
    async fn test_only_members_decide() {
        let fixture = Fixture::new().await;
        let (team_id, _) = recruiting_team(&fixture).await;
        let applicant = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();

        let err = fixture
            .service
            .accept(team_id, applicant.id, applicant.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotTeamMember { .. }));

        let err = fixture
            .service
            .reject(team_id, applicant.id, 999)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotTeamMember { .. }));
    }

    #[tokio::test]
    async fn test_reject_then_reapply_reuses_row() {
        let fixture = Fixture::new().await;
        let (team_id, leader) = recruiting_team(&fixture).await;
        let applicant = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();

        let rejected = fixture
            .service
            .reject(team_id, applicant.id, leader)
            .await
            .unwrap();
        assert_eq!(rejected.status, MemberStatus::Rejected);

        let err = fixture
            .service
            .accept(team_id, applicant.id, leader)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotPending(_)));

        let again = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Frontend))
            .await
            .unwrap();
        assert_eq!(again.id, applicant.id);
        assert_eq!(again.status, MemberStatus::Pending);
        assert_eq!(again.role, Role::Frontend);

        let detail = fixture.service.get_team(team_id).await.unwrap();
        assert_eq!(detail.team.counters.backend_num, 1);
    }

    #[tokio::test]
    async fn test_cancel_soft_deletes_and_allows_reapply() {
        let fixture = Fixture::new().await;
        let (team_id, _) = recruiting_team(&fixture).await;
        let applicant = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();

        fixture.service.cancel(team_id, 5).await.unwrap();

        let err = fixture.service.cancel(team_id, 5).await.unwrap_err();
        assert!(matches!(err, AppError::NoCancelableApplication { .. }));

        let detail = fixture.service.get_team(team_id).await.unwrap();
        assert!(detail.members.iter().all(|m| m.id != applicant.id));

        let again = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();
        assert_eq!(again.id, applicant.id);

        let leaders = fixture.notifier.leaders.lock().unwrap();
        let kinds: Vec<EventKind> = leaders.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ApplicationReceived,
                EventKind::ApplicationCancelled,
                EventKind::ApplicationReceived,
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_without_application() {
        let fixture = Fixture::new().await;
        let (team_id, leader) = recruiting_team(&fixture).await;

        let err = fixture.service.cancel(team_id, leader).await.unwrap_err();
        assert!(matches!(err, AppError::NoCancelableApplication { .. }));
    }

    #[tokio::test]
    async fn test_decide_on_applicant_of_other_team() {
        let fixture = Fixture::new().await;
        let (team_id, leader) = recruiting_team(&fixture).await;
        let other = fixture
            .service
            .create_team(&team_request("Elsewhere", 50))
            .await
            .unwrap();
        let stranger = fixture
            .service
            .apply(other.team.id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();

        let err = fixture
            .service
            .accept(team_id, stranger.id, leader)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ApplicantNotFound(_)));
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_fail_accept() {
        let fixture = Fixture::with_failing_side_channels().await;
        let (team_id, leader) = recruiting_team(&fixture).await;
        let applicant = fixture
            .service
            .apply(team_id, 5, &apply_as(Role::Backend))
            .await
            .unwrap();

        let approved = fixture
            .service
            .accept(team_id, applicant.id, leader)
            .await
            .unwrap();
        assert_eq!(approved.status, MemberStatus::Approved);
    }
}
