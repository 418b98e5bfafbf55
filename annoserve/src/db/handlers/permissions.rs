//! Store repository for per-document group permissions.

use crate::db::errors::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// A row in the `doc_permissions` table. `doc_path` is a data-root-relative
/// path; a trailing `/` marks a directory grant covering everything below it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocPermission {
    pub doc_path: String,
    pub group_name: String,
    pub can_write: bool,
}

pub struct Permissions<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Permissions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Grant a group access to a document path. Duplicate grants surface as
    /// a unique violation from the store.
    #[instrument(skip(self), fields(doc_path = %doc_path, group_name = %group_name, can_write), err)]
    pub async fn grant(&mut self, doc_path: &str, group_name: &str, can_write: bool) -> Result<()> {
        sqlx::query("INSERT INTO doc_permissions (doc_path, group_name, can_write) VALUES (?1, ?2, ?3)")
            .bind(doc_path)
            .bind(group_name)
            .bind(can_write)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    /// Revoke every permission held by a group, returning the number of rows
    /// dropped. Zero is not an error.
    #[instrument(skip(self), fields(group_name = %group_name), err)]
    pub async fn revoke(&mut self, group_name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM doc_permissions WHERE group_name = ?1")
            .bind(group_name)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// All permission rows governing a data path: exact matches, plus
    /// directory grants (rows ending in `/`) that prefix the path.
    #[instrument(skip(self), fields(doc_path = %doc_path), err)]
    pub async fn governing(&mut self, doc_path: &str) -> Result<Vec<DocPermission>> {
        let rows = sqlx::query_as::<_, DocPermission>(
            r#"
            SELECT doc_path, group_name, can_write FROM doc_permissions
            WHERE doc_path = ?1
               OR (substr(doc_path, -1) = '/' AND substr(?1, 1, length(doc_path)) = doc_path)
            ORDER BY length(doc_path) DESC
            "#,
        )
        .bind(doc_path)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}
