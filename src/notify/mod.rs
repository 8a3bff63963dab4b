//! Outbound recruitment notifications.
//!
//! Delivery is best-effort: the service calls the notifier after commit and only
//! logs failures.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::MemberStatus;

/// What happened to a team or application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    TeamCreated,
    ApplicationReceived,
    ApplicationCancelled,
    ApplicationApproved,
    ApplicationRejected,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TeamCreated => "TEAM_CREATED",
            EventKind::ApplicationReceived => "APPLICATION_RECEIVED",
            EventKind::ApplicationCancelled => "APPLICATION_CANCELLED",
            EventKind::ApplicationApproved => "APPLICATION_APPROVED",
            EventKind::ApplicationRejected => "APPLICATION_REJECTED",
        }
    }
}

/// Body of every notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub team_id: i64,
    pub team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Reach the leaders of `team_id`.
    async fn notify_team_leaders(
        &self,
        team_id: i64,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError>;

    /// Post to the shared announcement channel.
    async fn notify_channel(
        &self,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError>;
}

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_team_leaders(
        &self,
        team_id: i64,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError> {
        tracing::info!(
            team_id,
            event = kind.as_str(),
            candidate_id = ?payload.candidate_id,
            status = ?payload.status,
            "Notify team leaders"
        );
        Ok(())
    }

    async fn notify_channel(
        &self,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError> {
        tracing::info!(
            team_id = payload.team_id,
            event = kind.as_str(),
            candidate_id = ?payload.candidate_id,
            status = ?payload.status,
            "Notify channel"
        );
        Ok(())
    }
}

/// Which recipients a webhook message is meant for.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
enum Audience {
    TeamLeaders,
    Channel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookMessage<'a> {
    audience: Audience,
    event: EventKind,
    payload: &'a NotificationPayload,
}

/// Posts notifications as JSON to a chat-bridge webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Every delivery, connect included, is abandoned after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn post(
        &self,
        audience: Audience,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError> {
        let message = WebhookMessage {
            audience,
            event: kind,
            payload,
        };
        self.client
            .post(&self.url)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_team_leaders(
        &self,
        _team_id: i64,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError> {
        self.post(Audience::TeamLeaders, kind, payload).await
    }

    async fn notify_channel(
        &self,
        kind: EventKind,
        payload: &NotificationPayload,
    ) -> Result<(), AppError> {
        self.post(Audience::Channel, kind, payload).await
    }
}
