//! SQLite-backed history store.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::paths;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}?mode=rwc", out)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// One history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: i64,
    pub title: String,
    pub url: String,
    /// Unix seconds.
    pub created_at: i64,
}

/// Handle to the history database (`~/.local/state/mqd/history.db`).
#[derive(Clone)]
pub struct HistoryDb {
    pool: Pool<Sqlite>,
}

impl HistoryDb {
    /// Open (or create) the default history database.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(paths::history_db()?).await
    }

    /// Open (or create) the database at `path`, creating parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&path_to_sqlite_uri(path))
            .await?;
        let db = HistoryDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = HistoryDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append an entry and trim the table to the `limit` newest entries.
    pub async fn record(&self, title: &str, url: &str, limit: u32) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO history (title, url, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(title)
        .bind(url)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let trimmed = self.trim(limit).await?;
        if trimmed > 0 {
            tracing::debug!(trimmed, "history trimmed to {} entries", limit);
        }
        Ok(id)
    }

    /// Delete all but the `limit` newest entries. Returns the number deleted.
    pub async fn trim(&self, limit: u32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM history
            WHERE id NOT IN (
                SELECT id FROM history ORDER BY id DESC LIMIT ?1
            )
            "#,
        )
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Newest first, at most `limit` entries.
    pub async fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, url, created_at
            FROM history
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                id: row.get("id"),
                title: row.get("title"),
                url: row.get("url"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
