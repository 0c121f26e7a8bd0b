//! # SQLite
//!
//! System of record for user conversation state, the product catalog and
//! contact submissions.
//!
//! ## Tables
//!
//! - `users`: one row per `user_id`. `conversations` and `search_history` are
//!   JSON arrays stored as TEXT, `selected_index` is the topic tag.
//! - `products`: uuid text id, title, tags, link, optional image url and
//!   optional image bytes (BLOB).
//! - `contacts`: autoincrement id plus the submitted form fields and an RFC 3339
//!   timestamp.
//!
//! ## Pool
//!
//! - Bounded by `DB_MAX_CONNECTIONS`, opened at startup and closed after
//!   graceful shutdown
//! - An in-memory database lives only as long as its single connection, so
//!   `sqlite::memory:` pools are pinned to one connection that never expires
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::AppError;

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;

    run_migrations(&pool).await?;
    info!("Database ready at {database_url}");

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            conversations TEXT NOT NULL DEFAULT '[]',
            search_history TEXT NOT NULL DEFAULT '[]',
            selected_index TEXT NOT NULL DEFAULT 'bents'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            image_data BLOB
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    init_pool("sqlite::memory:", 1).await.unwrap()
}
