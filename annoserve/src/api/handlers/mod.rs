//! HTTP request handlers.

pub mod auth;
pub mod downloads;
pub mod groups;
pub mod permissions;
pub mod users;
