use thiserror::Error;

/// Unified error type for store operations that application code can handle.
///
/// Store-specific failures are classified here, at the adapter boundary,
/// instead of leaking raw `sqlx::Error` values into handlers.
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation (referenced user or group is absent)
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation { message: String },

    /// The store file is missing or no connection could be established
    #[error("Credential store unavailable")]
    Unavailable,

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using sqlx's own error categorization.
///
/// SQLite reports both kinds of constraint failure with sparse metadata, so
/// the table name is recovered from the message where possible.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        table: db_err.table().map(|s| s.to_string()).or_else(|| table_from_message(db_err.message())),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => DbError::Unavailable,
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// SQLite unique violations look like "UNIQUE constraint failed: users.user_name".
fn table_from_message(message: &str) -> Option<String> {
    let (_, columns) = message.split_once("constraint failed: ")?;
    let (table, _) = columns.split_once('.')?;
    Some(table.trim().to_string())
}

/// Type alias for store operation results
pub type Result<T> = std::result::Result<T, DbError>;
