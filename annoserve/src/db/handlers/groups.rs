//! Store repository for groups and memberships.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// A row in the `groups` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupRecord {
    pub group_name: String,
}

/// Request to insert a new group row.
#[derive(Debug, Clone)]
pub struct GroupCreateRequest {
    pub group_name: String,
}

pub struct Groups<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Groups<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Add a membership row. The store enforces both uniqueness (already a
    /// member) and referential integrity (user/group must exist).
    #[instrument(skip(self), fields(user_name = %user_name, group_name = %group_name), err)]
    pub async fn add_member(&mut self, user_name: &str, group_name: &str) -> Result<()> {
        sqlx::query("INSERT INTO group_memberships (user_name, group_name) VALUES (?1, ?2)")
            .bind(user_name)
            .bind(group_name)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    /// Remove a user from every group, returning the number of memberships
    /// dropped. Zero is not an error.
    #[instrument(skip(self), fields(user_name = %user_name), err)]
    pub async fn remove_member(&mut self, user_name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM group_memberships WHERE user_name = ?1")
            .bind(user_name)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// The group names a user belongs to.
    #[instrument(skip(self), fields(user_name = %user_name), err)]
    pub async fn memberships_for_user(&mut self, user_name: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT group_name FROM group_memberships WHERE user_name = ?1 ORDER BY group_name")
                .bind(user_name)
                .fetch_all(&mut *self.db)
                .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Groups<'c> {
    type CreateRequest = GroupCreateRequest;
    type Response = GroupRecord;

    #[instrument(skip(self, request), fields(group_name = %request.group_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, GroupRecord>(
            "INSERT INTO groups (group_name) VALUES (?1) RETURNING group_name",
        )
        .bind(&request.group_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(group)
    }

    #[instrument(skip(self), fields(group_name = %name), err)]
    async fn get_by_name(&mut self, name: &str) -> Result<Option<Self::Response>> {
        let group = sqlx::query_as::<_, GroupRecord>("SELECT group_name FROM groups WHERE group_name = ?1")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let groups = sqlx::query_as::<_, GroupRecord>("SELECT group_name FROM groups ORDER BY group_name")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups)
    }

    /// Delete the group row. Memberships and document permissions for the
    /// group cascade at the store level.
    #[instrument(skip(self), fields(group_name = %name), err)]
    async fn delete(&mut self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE group_name = ?1")
            .bind(name)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
