//! Team create/update: the aggregate write composed from the recruitment rules.

use sqlx::SqliteConnection;

use super::RecruitmentService;
use crate::db::queries::{self, TeamWrite};
use crate::errors::AppError;
use crate::models::{
    CreateTeamRequest, RequestedStack, ResolvedStack, TeamDetail, UpdateTeamRequest,
};
use crate::notify::{EventKind, NotificationPayload};
use crate::recruitment::stacks::StackSelection;
use crate::recruitment::{application, cover_image_change, ledger, reconcile};
use crate::search::{IndexDocument, IndexKind, MemberDocument, TeamDocument};

impl RecruitmentService {
    /// Create a team with its stacks and initial APPROVED members in one transaction.
    #[tracing::instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_team(&self, request: &CreateTeamRequest) -> Result<TeamDetail, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Team name is required".to_string()));
        }

        let recruitment = ledger::check_and_normalize(request.counters, request.is_recruited)?;

        let mut tx = self.repo.begin().await?;

        if queries::team_name_taken(&mut tx, name, None).await? {
            return Err(AppError::DuplicateTeamName(name.to_string()));
        }

        let roster = reconcile::reconcile(&[], &request.members, &[])?;

        let stacks = resolve_stacks(&mut tx, &request.stacks).await?;

        let team_id = queries::insert_team(
            &mut tx,
            &TeamWrite {
                name,
                description: request.description.as_deref(),
                recruitment,
                is_finished: false,
                cover_image: request.cover_image.as_deref(),
            },
        )
        .await?;
        queries::replace_team_stacks(&mut tx, team_id, &stacks).await?;
        for entry in &roster.to_insert {
            queries::insert_member(&mut tx, team_id, entry).await?;
        }

        tx.commit().await?;
        tracing::info!(team_id, members = roster.to_insert.len(), "Team created");

        let detail = self.load_detail(team_id).await?;
        self.index_roster(&detail, &[]).await;
        self.notify_channel(
            EventKind::TeamCreated,
            NotificationPayload {
                team_id,
                team_name: detail.team.name.clone(),
                candidate_id: None,
                candidate_contact: None,
                status: None,
            },
        )
        .await;

        Ok(detail)
    }

    /// Apply a roster diff, stack replacement and counter reset to an existing team.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_team(
        &self,
        team_id: i64,
        requester_id: i64,
        request: &UpdateTeamRequest,
    ) -> Result<TeamDetail, AppError> {
        let mut tx = self.repo.begin().await?;

        let team = queries::find_team(&mut tx, team_id)
            .await?
            .filter(|team| !team.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))?;

        let requester = queries::find_membership(&mut tx, team_id, requester_id).await?;
        application::check_requester(team_id, requester_id, requester.as_ref())?;

        let recruitment = ledger::check_and_normalize(request.counters, request.is_recruited)?;

        let existing = queries::list_all_members(&mut tx, team_id).await?;
        let roster =
            reconcile::reconcile(&existing, &request.members, &request.delete_member_ids)?;

        let stacks = resolve_stacks(&mut tx, &request.stacks).await?;

        let new_cover = cover_image_change(&request.cover_images, &request.delete_cover_images)?;

        let name = match request.name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::Validation("Team name is required".to_string())),
            Some(name) => name,
            None => team.name.as_str(),
        };
        if name != team.name && queries::team_name_taken(&mut tx, name, Some(team_id)).await? {
            return Err(AppError::DuplicateTeamName(name.to_string()));
        }

        queries::update_team(
            &mut tx,
            team_id,
            &TeamWrite {
                name,
                description: request
                    .description
                    .as_deref()
                    .or(team.description.as_deref()),
                recruitment,
                is_finished: request.is_finished.unwrap_or(team.is_finished),
                cover_image: new_cover
                    .map(String::as_str)
                    .or(team.cover_image.as_deref()),
            },
        )
        .await?;
        queries::replace_team_stacks(&mut tx, team_id, &stacks).await?;
        for member_id in &roster.to_deactivate {
            queries::deactivate_member(&mut tx, *member_id).await?;
        }
        for activation in &roster.to_activate {
            queries::activate_member(&mut tx, activation).await?;
        }
        for entry in &roster.to_insert {
            queries::insert_member(&mut tx, team_id, entry).await?;
        }

        tx.commit().await?;
        tracing::info!(
            active = roster.active_len(),
            activated = roster.to_activate.len(),
            deactivated = roster.to_deactivate.len(),
            inserted = roster.to_insert.len(),
            "Team updated"
        );

        let detail = self.load_detail(team_id).await?;
        self.index_roster(&detail, &roster.to_deactivate).await;

        Ok(detail)
    }

    /// Read-model of a live team.
    pub async fn get_team(&self, team_id: i64) -> Result<TeamDetail, AppError> {
        self.load_detail(team_id).await
    }

    async fn load_detail(&self, team_id: i64) -> Result<TeamDetail, AppError> {
        self.repo
            .get_team_detail(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))
    }

    /// Refresh the team posting and its approved members; drop removed members.
    async fn index_roster(&self, detail: &TeamDetail, removed: &[i64]) {
        self.index(IndexDocument::Team(TeamDocument::from(detail)))
            .await;
        for member in detail.members.iter().filter(|m| m.is_active()) {
            self.index(IndexDocument::Member(MemberDocument::new(
                member,
                &detail.team.name,
            )))
            .await;
        }
        for member_id in removed {
            self.unindex(IndexKind::Member, *member_id).await;
        }
    }
}

/// Validate requested stacks and resolve them against the catalog in one query.
async fn resolve_stacks(
    conn: &mut SqliteConnection,
    requested: &[RequestedStack],
) -> Result<Vec<ResolvedStack>, AppError> {
    let selection = StackSelection::from_requested(requested)?;
    if selection.is_empty() {
        return Ok(Vec::new());
    }
    let catalog = queries::find_stacks_by_names(conn, &selection.names()).await?;
    selection.resolve(&catalog)
}
