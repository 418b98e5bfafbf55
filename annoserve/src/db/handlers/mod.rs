//! Repository implementations for store access.
//!
//! Each repository wraps a single SQLite connection (or a connection inside a
//! transaction), provides strongly-typed operations for one table family, and
//! returns classified [`crate::db::errors::DbError`] values. Name-keyed
//! entities (users, groups) implement the [`Repository`] trait; the
//! membership and permission relations hang off [`Groups`] and
//! [`Permissions`] as dedicated methods.

pub mod groups;
pub mod permissions;
pub mod repository;
pub mod users;

pub use groups::Groups;
pub use permissions::Permissions;
pub use repository::Repository;
pub use users::Users;
