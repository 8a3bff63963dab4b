//! Users referenced by memberships.

use serde::{Deserialize, Serialize};

/// A registered user. Only the contact details matter to recruitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request body for registering a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub nickname: String,
    #[serde(default)]
    pub email: Option<String>,
}
