//! Transaction-scoped queries.
//!
//! Every function takes the caller's connection, normally `&mut *tx`, so a service
//! operation composes them into one unit of work that commits or rolls back as a whole.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::errors::AppError;
use crate::models::{
    Member, MemberStatus, RecruitmentCounters, ResolvedStack, Role, Stack, Team, TeamStack, User,
};
use crate::recruitment::ledger::RecruitmentState;
use crate::recruitment::reconcile::{Activation, RosterEntry};

const TEAM_COLUMNS: &str = "id, name, description, frontend_num, backend_num, devops_num, \
     full_stack_num, data_engineer_num, is_recruited, is_finished, is_deleted, cover_image, \
     created_at, updated_at";

const MEMBER_COLUMNS: &str =
    "id, team_id, user_id, role, is_leader, status, is_deleted, summary, updated_at";

/// Fields written when a team row is created or updated.
#[derive(Debug, Clone)]
pub struct TeamWrite<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub recruitment: RecruitmentState,
    pub is_finished: bool,
    pub cover_image: Option<&'a str>,
}

// ==================== TEAMS ====================

pub async fn find_team(conn: &mut SqliteConnection, team_id: i64) -> Result<Option<Team>, AppError> {
    let sql = format!("SELECT {} FROM teams WHERE id = ?", TEAM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(team_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.as_ref().map(team_from_row))
}

/// Whether a live team other than `except` already uses `name`.
pub async fn team_name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    except: Option<i64>,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM teams WHERE name = ? AND is_deleted = 0 AND id != ?",
    )
    .bind(name)
    .bind(except.unwrap_or(-1))
    .fetch_one(&mut *conn)
    .await?;

    Ok(count > 0)
}

pub async fn insert_team(conn: &mut SqliteConnection, team: &TeamWrite<'_>) -> Result<i64, AppError> {
    let now = Utc::now().to_rfc3339();
    let counters = team.recruitment.counters;

    let result = sqlx::query(
        r#"INSERT INTO teams (
            name, description, frontend_num, backend_num, devops_num, full_stack_num,
            data_engineer_num, is_recruited, is_finished, is_deleted, cover_image,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)"#,
    )
    .bind(team.name)
    .bind(team.description)
    .bind(counters.frontend_num)
    .bind(counters.backend_num)
    .bind(counters.devops_num)
    .bind(counters.full_stack_num)
    .bind(counters.data_engineer_num)
    .bind(team.recruitment.is_recruited as i32)
    .bind(team.is_finished as i32)
    .bind(team.cover_image)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_team(
    conn: &mut SqliteConnection,
    team_id: i64,
    team: &TeamWrite<'_>,
) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    let counters = team.recruitment.counters;

    let result = sqlx::query(
        r#"UPDATE teams SET
            name = ?, description = ?, frontend_num = ?, backend_num = ?, devops_num = ?,
            full_stack_num = ?, data_engineer_num = ?, is_recruited = ?, is_finished = ?,
            cover_image = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0"#,
    )
    .bind(team.name)
    .bind(team.description)
    .bind(counters.frontend_num)
    .bind(counters.backend_num)
    .bind(counters.devops_num)
    .bind(counters.full_stack_num)
    .bind(counters.data_engineer_num)
    .bind(team.recruitment.is_recruited as i32)
    .bind(team.is_finished as i32)
    .bind(team.cover_image)
    .bind(&now)
    .bind(team_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Team {} not found", team_id)));
    }
    Ok(())
}

/// Take one slot of `role` for an approval.
///
/// The decrement never takes a counter below zero, and recruitment closes in the
/// same transaction once the total reaches zero. Returns whether a slot was taken.
pub async fn take_recruitment_slot(
    conn: &mut SqliteConnection,
    team_id: i64,
    role: Role,
) -> Result<bool, AppError> {
    let now = Utc::now().to_rfc3339();

    let decrement = format!(
        "UPDATE teams SET {col} = {col} - 1, updated_at = ? WHERE id = ? AND {col} > 0",
        col = role.counter_column()
    );
    let taken = sqlx::query(&decrement)
        .bind(&now)
        .bind(team_id)
        .execute(&mut *conn)
        .await?
        .rows_affected()
        > 0;

    let total = Role::ALL
        .iter()
        .map(|role| role.counter_column())
        .collect::<Vec<_>>()
        .join(" + ");
    let close = format!(
        "UPDATE teams SET is_recruited = 0 WHERE id = ? AND is_recruited = 1 AND ({}) <= 0",
        total
    );
    sqlx::query(&close).bind(team_id).execute(&mut *conn).await?;

    Ok(taken)
}

// ==================== STACKS ====================

/// Batch lookup of catalog stacks by name.
pub async fn find_stacks_by_names(
    conn: &mut SqliteConnection,
    names: &[String],
) -> Result<Vec<Stack>, AppError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "SELECT id, name FROM stacks WHERE name IN ({}) ORDER BY id",
        placeholders
    );
    let mut query = sqlx::query(&sql);
    for name in names {
        query = query.bind(name);
    }
    let rows = query.fetch_all(&mut *conn).await?;

    Ok(rows
        .iter()
        .map(|row| Stack {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

pub async fn replace_team_stacks(
    conn: &mut SqliteConnection,
    team_id: i64,
    stacks: &[ResolvedStack],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM team_stacks WHERE team_id = ?")
        .bind(team_id)
        .execute(&mut *conn)
        .await?;

    for stack in stacks {
        sqlx::query("INSERT INTO team_stacks (team_id, stack_id, is_main) VALUES (?, ?, ?)")
            .bind(team_id)
            .bind(stack.id)
            .bind(stack.is_main as i32)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn list_team_stacks(
    conn: &mut SqliteConnection,
    team_id: i64,
) -> Result<Vec<TeamStack>, AppError> {
    let rows = sqlx::query(
        r#"SELECT s.id, s.name, ts.is_main
           FROM team_stacks ts JOIN stacks s ON s.id = ts.stack_id
           WHERE ts.team_id = ?
           ORDER BY ts.is_main DESC, s.name"#,
    )
    .bind(team_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let is_main: i32 = row.get("is_main");
            TeamStack {
                stack_id: row.get("id"),
                name: row.get("name"),
                is_main: is_main != 0,
            }
        })
        .collect())
}

// ==================== MEMBERS ====================

/// Every membership row of a team, soft-deleted ones included.
pub async fn list_all_members(
    conn: &mut SqliteConnection,
    team_id: i64,
) -> Result<Vec<Member>, AppError> {
    let sql = format!(
        "SELECT {} FROM members WHERE team_id = ? ORDER BY id",
        MEMBER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(member_from_row).collect()
}

pub async fn find_member(
    conn: &mut SqliteConnection,
    member_id: i64,
) -> Result<Option<Member>, AppError> {
    let sql = format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(member_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(member_from_row).transpose()
}

pub async fn find_membership(
    conn: &mut SqliteConnection,
    team_id: i64,
    user_id: i64,
) -> Result<Option<Member>, AppError> {
    let sql = format!(
        "SELECT {} FROM members WHERE team_id = ? AND user_id = ?",
        MEMBER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(member_from_row).transpose()
}

/// Insert an APPROVED row for a roster entry.
pub async fn insert_member(
    conn: &mut SqliteConnection,
    team_id: i64,
    entry: &RosterEntry,
) -> Result<i64, AppError> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"INSERT INTO members (team_id, user_id, role, is_leader, status, is_deleted, summary, updated_at)
           VALUES (?, ?, ?, ?, ?, 0, ?, ?)"#,
    )
    .bind(team_id)
    .bind(entry.user_id)
    .bind(entry.role.as_str())
    .bind(entry.is_leader as i32)
    .bind(MemberStatus::Approved.as_str())
    .bind(&entry.summary)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Bring an existing row back as APPROVED with the roster entry's attributes.
pub async fn activate_member(
    conn: &mut SqliteConnection,
    activation: &Activation,
) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    let entry = &activation.entry;
    sqlx::query(
        r#"UPDATE members SET
            role = ?, is_leader = ?, status = ?, is_deleted = 0,
            summary = COALESCE(?, summary), updated_at = ?
        WHERE id = ?"#,
    )
    .bind(entry.role.as_str())
    .bind(entry.is_leader as i32)
    .bind(MemberStatus::Approved.as_str())
    .bind(&entry.summary)
    .bind(&now)
    .bind(activation.member_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn deactivate_member(conn: &mut SqliteConnection, member_id: i64) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE members SET is_deleted = 1, is_leader = 0, updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(member_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Create a PENDING application row.
pub async fn insert_application(
    conn: &mut SqliteConnection,
    team_id: i64,
    user_id: i64,
    role: Role,
    summary: Option<&str>,
) -> Result<i64, AppError> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"INSERT INTO members (team_id, user_id, role, is_leader, status, is_deleted, summary, updated_at)
           VALUES (?, ?, ?, 0, ?, 0, ?, ?)"#,
    )
    .bind(team_id)
    .bind(user_id)
    .bind(role.as_str())
    .bind(MemberStatus::Pending.as_str())
    .bind(summary)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite an earlier row of the same (team, user) pair with a fresh application.
pub async fn reapply(
    conn: &mut SqliteConnection,
    member_id: i64,
    role: Role,
    summary: Option<&str>,
) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"UPDATE members SET
            role = ?, is_leader = 0, status = ?, is_deleted = 0, summary = ?, updated_at = ?
        WHERE id = ?"#,
    )
    .bind(role.as_str())
    .bind(MemberStatus::Pending.as_str())
    .bind(summary)
    .bind(&now)
    .bind(member_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn cancel_application(
    conn: &mut SqliteConnection,
    member_id: i64,
) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "UPDATE members SET status = ?, is_deleted = 1, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(MemberStatus::Cancelled.as_str())
    .bind(&now)
    .bind(member_id)
    .bind(MemberStatus::Pending.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Move a live PENDING row to `status`. Returns false if the row was no longer pending.
pub async fn decide_pending(
    conn: &mut SqliteConnection,
    member_id: i64,
    status: MemberStatus,
) -> Result<bool, AppError> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE members SET status = ?, updated_at = ? WHERE id = ? AND status = ? AND is_deleted = 0",
    )
    .bind(status.as_str())
    .bind(&now)
    .bind(member_id)
    .bind(MemberStatus::Pending.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ==================== USERS ====================

pub async fn find_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<User>, AppError> {
    let row = sqlx::query("SELECT id, nickname, email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|row| User {
        id: row.get("id"),
        nickname: row.get("nickname"),
        email: row.get("email"),
    }))
}

// Helper functions for row conversion

fn team_from_row(row: &SqliteRow) -> Team {
    let is_recruited: i32 = row.get("is_recruited");
    let is_finished: i32 = row.get("is_finished");
    let is_deleted: i32 = row.get("is_deleted");
    Team {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        counters: RecruitmentCounters {
            frontend_num: row.get("frontend_num"),
            backend_num: row.get("backend_num"),
            devops_num: row.get("devops_num"),
            full_stack_num: row.get("full_stack_num"),
            data_engineer_num: row.get("data_engineer_num"),
        },
        is_recruited: is_recruited != 0,
        is_finished: is_finished != 0,
        is_deleted: is_deleted != 0,
        cover_image: row.get("cover_image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn member_from_row(row: &SqliteRow) -> Result<Member, AppError> {
    let role: String = row.get("role");
    let status: String = row.get("status");
    let is_leader: i32 = row.get("is_leader");
    let is_deleted: i32 = row.get("is_deleted");
    let id: i64 = row.get("id");

    Ok(Member {
        id,
        team_id: row.get("team_id"),
        user_id: row.get("user_id"),
        role: Role::from_str(&role)
            .ok_or_else(|| AppError::Internal(format!("Member {} has unknown role {}", id, role)))?,
        is_leader: is_leader != 0,
        status: MemberStatus::from_str(&status).ok_or_else(|| {
            AppError::Internal(format!("Member {} has unknown status {}", id, status))
        })?,
        is_deleted: is_deleted != 0,
        summary: row.get("summary"),
        updated_at: row.get("updated_at"),
    })
}
