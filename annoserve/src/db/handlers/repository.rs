//! Base repository trait for store operations.

use crate::db::errors::Result;

/// Base repository trait providing the operations shared by name-keyed
/// entities (users, groups).
///
/// A repository wraps a single SQLite connection and provides strongly-typed
/// operations over one table family. Rows here are keyed by their unique
/// name rather than a surrogate id, because the store schema is a stable
/// external interface for the standalone administration tools.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// Create a new entity. A single insert attempt: uniqueness is enforced
    /// by the store, not by a check-then-insert sequence.
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by its unique name
    async fn get_by_name(&mut self, name: &str) -> Result<Option<Self::Response>>;

    /// List all entities
    async fn list(&mut self) -> Result<Vec<Self::Response>>;

    /// Delete an entity by name, returning whether a row was removed
    async fn delete(&mut self, name: &str) -> Result<bool>;
}
