//! Technology stack catalog entries.

use serde::{Deserialize, Serialize};

/// A canonical technology tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: i64,
    pub name: String,
}

/// Stack requested by name in a create/update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedStack {
    pub name: String,
    #[serde(default)]
    pub is_main: bool,
}

/// Stack resolved to its catalog id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolvedStack {
    pub id: i64,
    pub is_main: bool,
}
