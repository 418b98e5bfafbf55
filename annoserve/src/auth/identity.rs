//! Per-request identity resolution.
//!
//! The identity is explicit context threaded into every handler via an
//! extractor, not ambient global state. An absent or invalid session cookie
//! resolves to the anonymous principal, never to an error; operations that
//! need more than "guest" gate themselves with [`Identity::require_admin`]
//! or [`Identity::require_user`].

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    auth::session,
    config::Config,
    errors::{Error, Result},
    types::{Identity, SessionUser},
};

/// The identity resolved from the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

/// Extract the session user from the cookie header, if present and valid.
fn try_session_cookie(parts: &Parts, config: &Config) -> Option<SessionUser> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    let cookie_name = &config.session.cookie_name;

    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name == cookie_name {
                // Expired or otherwise invalid tokens mean "anonymous", so
                // keep scanning rather than failing the request.
                if let Ok(user) = session::verify_session_token(value, config) {
                    return Some(user);
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let identity = match try_session_cookie(parts, &state.config) {
            Some(user) => Identity::User(user),
            None => Identity::Guest,
        };
        Ok(Self(identity))
    }
}

impl Identity {
    /// Require any logged-in identity, or fail with `NotAuthorized`.
    pub fn require_user(&self, action: &str) -> Result<&SessionUser> {
        match self {
            Identity::User(user) => Ok(user),
            Identity::Guest => Err(Error::NotAuthorized {
                action: action.to_string(),
            }),
        }
    }

    /// Require an admin-privileged identity, or fail with `NotAuthorized`.
    /// Every mutating administration operation goes through here.
    pub fn require_admin(&self, action: &str) -> Result<&SessionUser> {
        let user = self.require_user(action)?;
        if !user.is_admin {
            return Err(Error::NotAuthorized {
                action: action.to_string(),
            });
        }
        Ok(user)
    }
}
