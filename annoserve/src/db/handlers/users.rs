//! Store repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

/// A row in the `users` table. The password hash is the hex digest of the
/// password; plaintext is never stored. The id is an opaque token, stored
/// as text so the standalone administration tools can read it directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub user_id: String,
    pub user_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Request to insert a new user row.
#[derive(Debug, Clone)]
pub struct UserCreateRequest {
    pub user_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Overwrite the stored password digest for a user.
    #[instrument(skip(self, password_hash), fields(user_name = %user_name), err)]
    pub async fn set_password_hash(&mut self, user_name: &str, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE user_name = ?2")
            .bind(password_hash)
            .bind(user_name)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateRequest;
    type Response = UserRecord;

    #[instrument(skip(self, request), fields(user_name = %request.user_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Always generate a fresh opaque id; the UNIQUE constraint on
        // user_name turns a concurrent duplicate insert into a clean
        // UniqueViolation instead of a race.
        let user_id = Uuid::new_v4().simple().to_string();

        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (user_id, user_name, password_hash, is_admin)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING user_id, user_name, password_hash, is_admin
            "#,
        )
        .bind(user_id)
        .bind(&request.user_name)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_name = %name), err)]
    async fn get_by_name(&mut self, name: &str) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, user_name, password_hash, is_admin FROM users WHERE user_name = ?1",
        )
        .bind(name)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, user_name, password_hash, is_admin FROM users ORDER BY user_name",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    /// Delete the user row. Group memberships cascade at the store level.
    /// Prior annotation contributions are intentionally not purged.
    #[instrument(skip(self), fields(user_name = %name), err)]
    async fn delete(&mut self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_name = ?1")
            .bind(name)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn create_and_fetch_roundtrip(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo
            .create(&UserCreateRequest {
                user_name: "alice".to_string(),
                password_hash: "a".repeat(64),
                is_admin: false,
            })
            .await
            .unwrap();

        let fetched = repo.get_by_name("alice").await.unwrap().unwrap();
        assert_eq!(fetched.user_id, created.user_id);
        assert_eq!(fetched.password_hash, "a".repeat(64));
        assert!(!fetched.is_admin);

        assert!(repo.get_by_name("bob").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn duplicate_user_name_is_a_unique_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let request = UserCreateRequest {
            user_name: "alice".to_string(),
            password_hash: "a".repeat(64),
            is_admin: false,
        };
        repo.create(&request).await.unwrap();

        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn set_password_hash_on_missing_user_is_not_found(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let err = repo.set_password_hash("nobody", &"b".repeat(64)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn delete_reports_whether_a_row_was_removed(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&UserCreateRequest {
            user_name: "alice".to_string(),
            password_hash: "a".repeat(64),
            is_admin: true,
        })
        .await
        .unwrap();

        assert!(repo.delete("alice").await.unwrap());
        assert!(!repo.delete("alice").await.unwrap());
    }
}
