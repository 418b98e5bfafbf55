//! Session token creation and verification.
//!
//! A session binds at most one authenticated user name. The binding lives in
//! a signed JWT carried by an HttpOnly cookie; no server-side session table
//! exists.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, errors::Error, types::SessionUser};

/// Session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,    // Bound user name
    pub is_admin: bool, // Admin flag
    pub exp: i64,       // Expiration time
    pub iat: i64,       // Issued at
}

impl SessionClaims {
    fn new(user: &SessionUser, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.session.timeout;

        Self {
            sub: user.user_name.clone(),
            is_admin: user.is_admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_name: claims.sub,
            is_admin: claims.is_admin,
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign sessions: secret_key is required".to_string(),
    })
}

/// Create a session token binding a user name.
pub fn create_session_token(user: &SessionUser, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(user, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create session token: {e}"),
    })
}

/// Verify and decode a session token.
///
/// Any verification failure (expiry, bad signature, malformed token) is an
/// invalid session; the caller treats it as anonymous rather than an error.
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionUser, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|_| Error::NotAuthorized {
        action: "resume session".to_string(),
    })?;

    Ok(SessionUser::from(token_data.claims))
}

fn secure_attribute(config: &Config) -> &'static str {
    if config.session.cookie_secure { "; Secure" } else { "" }
}

/// Cookie binding a freshly created session token.
pub fn create_session_cookie(token: &str, config: &Config) -> String {
    let session = &config.session;
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}{}",
        session.cookie_name,
        token,
        session.timeout.as_secs(),
        secure_attribute(config)
    )
}

/// Expired cookie clearing any session binding.
pub fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0{}",
        config.session.cookie_name,
        secure_attribute(config)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-sessions".to_string()),
            ..Default::default()
        }
    }

    fn test_user() -> SessionUser {
        SessionUser {
            user_name: "bob".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn create_and_verify_roundtrip() {
        let config = test_config();
        let user = test_user();

        let token = create_session_token(&user, &config).unwrap();
        assert!(!token.is_empty());

        let verified = verify_session_token(&token, &config).unwrap();
        assert_eq!(verified, user);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let mut config = test_config();
        let token = create_session_token(&test_user(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        assert!(verify_session_token(&token, &config).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        config.session.timeout = Duration::ZERO;
        let token = create_session_token(&test_user(), &config).unwrap();

        // Default validation has 60s leeway; disable it to observe expiry.
        let key = DecodingKey::from_secret("test-secret-key-for-sessions".as_bytes());
        let mut validation = Validation::default();
        validation.leeway = 0;
        std::thread::sleep(Duration::from_millis(1100));
        assert!(decode::<SessionClaims>(&token, &key, &validation).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let config = test_config();
        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            assert!(verify_session_token(token, &config).is_err(), "token: {token}");
        }
    }

    #[test]
    fn missing_secret_is_an_internal_error() {
        let mut config = test_config();
        config.secret_key = None;
        assert!(create_session_token(&test_user(), &config).is_err());
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let config = test_config();
        let cookie = clear_session_cookie(&config);
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.starts_with("annoserve_session=;"));
    }
}
