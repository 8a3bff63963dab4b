//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::search::{IndexKind, SearchResult};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    pub q: String,
    /// `team` or `member`; both when absent.
    #[serde(default)]
    pub kind: Option<String>,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/search - Search team postings and member profiles.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let kind = match params.kind.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            IndexKind::from_str(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown search kind {}", raw)))?,
        ),
    };

    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);
    let results = state.search.search(&params.q, kind, limit, params.offset)?;
    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}
