//! Authentication: password digests, session tokens, and per-request
//! identity resolution.

pub mod identity;
pub mod password;
pub mod session;

pub use identity::CurrentIdentity;
