//! Recruitment service: runs the recruitment rules inside one transaction per
//! request, then fans out notifications and index updates.

mod applications;
mod teams;

use std::sync::Arc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::notify::{EventKind, NotificationPayload, Notifier};
use crate::search::{IndexDocument, IndexKind, SearchIndexer};

/// Entry point for team create/update and application transitions.
pub struct RecruitmentService {
    repo: Arc<Repository>,
    indexer: Arc<dyn SearchIndexer>,
    notifier: Arc<dyn Notifier>,
}

impl RecruitmentService {
    pub fn new(
        repo: Arc<Repository>,
        indexer: Arc<dyn SearchIndexer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repo,
            indexer,
            notifier,
        }
    }

    /// Post-commit: a failed index write is logged, never returned.
    async fn index(&self, document: IndexDocument) {
        if let Err(e) = self.indexer.upsert(&document).await {
            tracing::warn!(
                kind = document.kind().as_str(),
                id = document.id(),
                "Failed to index document: {}",
                e
            );
        }
    }

    async fn unindex(&self, kind: IndexKind, id: i64) {
        if let Err(e) = self.indexer.remove(kind, id).await {
            tracing::warn!(kind = kind.as_str(), id, "Failed to remove document: {}", e);
        }
    }

    async fn notify_leaders(&self, kind: EventKind, payload: NotificationPayload) {
        if let Err(e) = self
            .notifier
            .notify_team_leaders(payload.team_id, kind, &payload)
            .await
        {
            tracing::warn!(
                team_id = payload.team_id,
                event = kind.as_str(),
                "Failed to notify team leaders: {}",
                e
            );
        }
    }

    async fn notify_channel(&self, kind: EventKind, payload: NotificationPayload) {
        if let Err(e) = self.notifier.notify_channel(kind, &payload).await {
            tracing::warn!(
                team_id = payload.team_id,
                event = kind.as_str(),
                "Failed to notify channel: {}",
                e
            );
        }
    }
}
