//! User conversation records.
//!
//! `upsert` is a full replace of the mutable fields: callers send the complete
//! desired state, never a delta. Concurrent writers for the same user resolve
//! as last-write-wins.
use shared::{SavedChat, UserState};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::error::AppError;

const USER_COLUMNS: &str = "user_id, conversations, search_history, selected_index";

pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<UserState>, AppError> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.map(|row| from_row(&row)).transpose()
}

pub async fn upsert(pool: &SqlitePool, user_id: &str, chat: &SavedChat) -> Result<UserState, AppError> {
    let conversations = serde_json::to_string(&chat.conversations)?;
    let search_history = serde_json::to_string(&chat.search_history)?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (user_id) DO UPDATE SET
            conversations = excluded.conversations,
            search_history = excluded.search_history,
            selected_index = excluded.selected_index
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(conversations)
    .bind(search_history)
    .bind(chat.selected_index.as_str())
    .fetch_one(pool)
    .await?;

    from_row(&row)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<UserState>, AppError> {
    let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id"))
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

fn from_row(row: &SqliteRow) -> Result<UserState, AppError> {
    let conversations: String = row.try_get("conversations")?;
    let search_history: String = row.try_get("search_history")?;
    let selected_index: String = row.try_get("selected_index")?;

    Ok(UserState {
        user_id: row.try_get("user_id")?,
        conversations: serde_json::from_str(&conversations)?,
        search_history: serde_json::from_str(&search_history)?,
        selected_index: selected_index.into(),
    })
}
