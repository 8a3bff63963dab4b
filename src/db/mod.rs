//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for teams, memberships and the stack catalog.

pub mod queries;
mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Stacks available to every deployment.
const DEFAULT_STACKS: &[&str] = &[
    "React",
    "Vue",
    "Angular",
    "TypeScript",
    "Next.js",
    "Spring",
    "Django",
    "Node.js",
    "Rust",
    "Go",
    "Kotlin",
    "Swift",
    "Flutter",
    "Docker",
    "Kubernetes",
    "AWS",
    "PostgreSQL",
    "MySQL",
    "Spark",
    "Airflow",
];

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nickname TEXT NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            frontend_num INTEGER NOT NULL DEFAULT 0,
            backend_num INTEGER NOT NULL DEFAULT 0,
            devops_num INTEGER NOT NULL DEFAULT 0,
            full_stack_num INTEGER NOT NULL DEFAULT 0,
            data_engineer_num INTEGER NOT NULL DEFAULT 0,
            is_recruited INTEGER NOT NULL DEFAULT 0,
            is_finished INTEGER NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            cover_image TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stacks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS team_stacks (
            team_id INTEGER NOT NULL REFERENCES teams(id),
            stack_id INTEGER NOT NULL REFERENCES stacks(id),
            is_main INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (team_id, stack_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One row per (team, user): re-applications reuse it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL REFERENCES teams(id),
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            is_leader INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            summary TEXT,
            updated_at TEXT NOT NULL,
            UNIQUE (team_id, user_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_teams_name ON teams(name);
        CREATE INDEX IF NOT EXISTS idx_members_team ON members(team_id);
        "#,
    )
    .execute(pool)
    .await?;

    for name in DEFAULT_STACKS {
        sqlx::query("INSERT OR IGNORE INTO stacks (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_migrations_are_idempotent_and_seed_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stacks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, DEFAULT_STACKS.len() as i64);
    }
}
