//! Database repository owning the connection pool.
//!
//! Writes go through [`Repository::begin`] and the transaction-scoped functions in
//! [`super::queries`]; plain reads are served straight from the pool.

use chrono::Utc;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::queries;
use crate::errors::AppError;
use crate::models::{CreateUserRequest, Stack, TeamDetail, User};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the unit of work for one request. Dropping it without commit rolls back.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent units of work
    /// queue on the busy timeout instead of failing on a read-to-write upgrade.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Team with its stacks and live members; `None` for missing or deleted teams.
    pub async fn get_team_detail(&self, team_id: i64) -> Result<Option<TeamDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let team = match queries::find_team(&mut conn, team_id).await? {
            Some(team) if !team.is_deleted => team,
            _ => return Ok(None),
        };
        let stacks = queries::list_team_stacks(&mut conn, team_id).await?;
        let members = queries::list_all_members(&mut conn, team_id)
            .await?
            .into_iter()
            .filter(|member| !member.is_deleted)
            .collect();

        Ok(Some(TeamDetail {
            team,
            stacks,
            members,
        }))
    }

    // ==================== STACK OPERATIONS ====================

    /// List the stack catalog.
    pub async fn list_stacks(&self) -> Result<Vec<Stack>, AppError> {
        let rows = sqlx::query("SELECT id, name FROM stacks ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Stack {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    // ==================== USER OPERATIONS ====================

    /// Register a user.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("INSERT INTO users (nickname, email, created_at) VALUES (?, ?, ?)")
            .bind(&request.nickname)
            .bind(&request.email)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            nickname: request.nickname.clone(),
            email: request.email.clone(),
        })
    }
}
