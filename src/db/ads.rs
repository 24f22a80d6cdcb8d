//! Ad listing storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct AdStore {
    pool: SqlitePool,
}

/// A single ad as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ad {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub contact: String,
    pub last_modified: String,
}

/// An ad joined with its author, as shown in listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdListing {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub avatar: Option<String>,
    pub text: String,
    pub contact: String,
    pub last_modified: String,
}

impl AdStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all ads with their authors, newest first.
    pub async fn list(&self) -> Result<Vec<AdListing>, sqlx::Error> {
        sqlx::query_as(
            "SELECT a.id, a.user_id, u.username, u.avatar, a.text, a.contact, a.last_modified
             FROM ads a INNER JOIN users u ON a.user_id = u.id
             ORDER BY a.last_modified DESC, a.id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Create an ad. Returns the ad ID.
    pub async fn create(&self, user_id: i64, text: &str, contact: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO ads (user_id, text, contact) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(text)
            .bind(contact)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get an ad by ID.
    pub async fn get(&self, id: i64) -> Result<Option<Ad>, sqlx::Error> {
        sqlx::query_as("SELECT id, user_id, text, contact, last_modified FROM ads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Replace an ad's text and contact. Returns false if no such ad exists.
    pub async fn update(&self, id: i64, text: &str, contact: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ads SET text = ?, contact = ?, last_modified = datetime('now') WHERE id = ?",
        )
        .bind(text)
        .bind(contact)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an ad. Returns false if no such ad exists.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
