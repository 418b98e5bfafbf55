//! Access control for document reads and writes.
//!
//! Decisions combine two sources, in order of authority:
//!
//! 1. The `doc_permissions` table. When any grant governs the requested
//!    path, group membership decides; anonymous requests are denied.
//! 2. A robots.txt-style rule file found in the nearest governing directory,
//!    consulted only when no permission row governs the path. Absence of a
//!    rule file means allow.

pub mod rules;

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::{
    config::Config,
    db::{
        Store,
        handlers::{Groups, Permissions},
    },
    errors::{Error, Result},
    types::Identity,
};
use rules::RuleFile;

/// Resolve request path segments against the data root.
///
/// Segments come straight from the URL, so anything that could escape the
/// root (absolute segments, `..`, embedded separators) is rejected outright.
pub fn resolve(data_dir: &Path, segments: &[&str]) -> Result<PathBuf> {
    let mut path = data_dir.to_path_buf();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        let part = Path::new(segment);
        let safe = part.components().all(|c| matches!(c, Component::Normal(_)))
            && !segment.contains('/')
            && !segment.contains('\\');
        if !safe {
            return Err(Error::AccessDenied);
        }
        path.push(part);
    }
    Ok(path)
}

/// Whether `identity` may read the document or directory at `real_path`.
pub async fn can_read(store: &Store, config: &Config, identity: &Identity, real_path: &Path) -> Result<bool> {
    decide(store, config, identity, real_path, false).await
}

/// Whether `identity` may write the document or directory at `real_path`.
/// Mirrors [`can_read`] but requires grants to carry the write flag.
pub async fn can_write(store: &Store, config: &Config, identity: &Identity, real_path: &Path) -> Result<bool> {
    decide(store, config, identity, real_path, true).await
}

async fn decide(
    store: &Store,
    config: &Config,
    identity: &Identity,
    real_path: &Path,
    write: bool,
) -> Result<bool> {
    let data_path = rooted_data_path(&config.data_dir, real_path).await?;

    let mut conn = store.acquire().await?;
    let governing = Permissions::new(&mut conn).governing(&data_path).await?;
    if !governing.is_empty() {
        let Some(user_name) = identity.user_name() else {
            debug!(%data_path, "permission rows govern path; anonymous access denied");
            return Ok(false);
        };
        let memberships = Groups::new(&mut conn).memberships_for_user(user_name).await?;
        let allowed = governing
            .iter()
            .any(|grant| memberships.contains(&grant.group_name) && (!write || grant.can_write));
        debug!(%data_path, user_name, allowed, "decided from permission table");
        return Ok(allowed);
    }
    drop(conn);

    match nearest_rule_file(config, real_path).await? {
        Some(rule_file) => {
            let allowed = rule_file.is_allowed(identity.principal(), &data_path);
            debug!(%data_path, principal = identity.principal(), allowed, "decided from rule file");
            Ok(allowed)
        }
        None => Ok(true),
    }
}

/// Rewrite a filesystem path as a rooted data path (`/collection/doc`).
/// Directories get a trailing slash, the convention rule files expect.
async fn rooted_data_path(data_dir: &Path, real_path: &Path) -> Result<String> {
    let relative = real_path.strip_prefix(data_dir).map_err(|_| Error::AccessDenied)?;

    let mut data_path = String::from("/");
    let mut first = true;
    for component in relative.components() {
        let Component::Normal(part) = component else {
            return Err(Error::AccessDenied);
        };
        if !first {
            data_path.push('/');
        }
        data_path.push_str(&part.to_string_lossy());
        first = false;
    }

    let is_dir = fs::metadata(real_path).await.map(|m| m.is_dir()).unwrap_or(false);
    if is_dir && !data_path.ends_with('/') {
        data_path.push('/');
    }
    Ok(data_path)
}

/// Find and parse the rule file in the nearest governing directory, walking
/// up from the document's directory to the data root.
async fn nearest_rule_file(config: &Config, real_path: &Path) -> Result<Option<RuleFile>> {
    let start = if fs::metadata(real_path).await.map(|m| m.is_dir()).unwrap_or(false) {
        real_path
    } else {
        real_path.parent().unwrap_or(&config.data_dir)
    };

    let mut dir = start;
    loop {
        let candidate = dir.join(&config.access.rule_file);
        match fs::read_to_string(&candidate).await {
            Ok(text) => return Ok(Some(RuleFile::parse(&text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Internal {
                    operation: format!("read rule file {}: {e}", candidate.display()),
                });
            }
        }
        if dir == config.data_dir {
            return Ok(None);
        }
        match dir.parent() {
            Some(parent) if dir.starts_with(&config.data_dir) => dir = parent,
            _ => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::groups::GroupCreateRequest;
    use crate::db::handlers::users::{UserCreateRequest, Users};
    use crate::db::handlers::Repository;
    use crate::types::SessionUser;
    use sqlx::SqlitePool;

    fn user(name: &str) -> Identity {
        Identity::User(SessionUser {
            user_name: name.to_string(),
            is_admin: false,
        })
    }

    fn config_for(data_dir: &Path) -> Config {
        Config {
            data_dir: data_dir.to_path_buf(),
            ..Default::default()
        }
    }

    async fn seed_membership(pool: &SqlitePool, user_name: &str, group_name: &str) {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateRequest {
                user_name: user_name.to_string(),
                password_hash: "x".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();
        let mut groups = Groups::new(&mut conn);
        groups
            .create(&GroupCreateRequest {
                group_name: group_name.to_string(),
            })
            .await
            .unwrap();
        groups.add_member(user_name, group_name).await.unwrap();
    }

    #[test]
    fn resolve_rejects_traversal() {
        let data_dir = Path::new("/srv/data");
        assert!(resolve(data_dir, &["corpus", "doc1"]).is_ok());
        assert!(resolve(data_dir, &["..", "etc"]).is_err());
        assert!(resolve(data_dir, &["corpus", "../../etc/passwd"]).is_err());
        assert!(resolve(data_dir, &["/etc"]).is_err());
    }

    #[sqlx::test]
    async fn no_rules_no_permissions_defaults_to_allow(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let store = Store::from_pool(pool);

        let doc = dir.path().join("corpus").join("doc1");
        assert!(can_read(&store, &config, &Identity::Guest, &doc).await.unwrap());
    }

    #[sqlx::test]
    async fn permission_rows_deny_guests_and_non_members(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        seed_membership(&pool, "alice", "annotators").await;
        {
            let mut conn = pool.acquire().await.unwrap();
            Permissions::new(&mut conn).grant("/corpus/", "annotators", false).await.unwrap();
        }
        let store = Store::from_pool(pool);

        let doc = dir.path().join("corpus").join("doc1");
        assert!(can_read(&store, &config, &user("alice"), &doc).await.unwrap());
        assert!(!can_read(&store, &config, &user("mallory"), &doc).await.unwrap());
        assert!(!can_read(&store, &config, &Identity::Guest, &doc).await.unwrap());
    }

    #[sqlx::test]
    async fn write_requires_the_write_flag(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        seed_membership(&pool, "alice", "annotators").await;
        {
            let mut conn = pool.acquire().await.unwrap();
            Permissions::new(&mut conn).grant("/corpus/", "annotators", false).await.unwrap();
        }
        let store = Store::from_pool(pool);

        let doc = dir.path().join("corpus").join("doc1");
        assert!(can_read(&store, &config, &user("alice"), &doc).await.unwrap());
        assert!(!can_write(&store, &config, &user("alice"), &doc).await.unwrap());
    }

    #[sqlx::test]
    async fn permission_rows_outrank_the_rule_file(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        // The rule file would allow everyone; the permission table still wins.
        std::fs::write(corpus.join("robots.txt"), "User-agent: *\nAllow: /\n").unwrap();

        let config = config_for(dir.path());
        seed_membership(&pool, "alice", "annotators").await;
        {
            let mut conn = pool.acquire().await.unwrap();
            Permissions::new(&mut conn).grant("/corpus/", "annotators", false).await.unwrap();
        }
        let store = Store::from_pool(pool);

        let doc = corpus.join("doc1");
        assert!(!can_read(&store, &config, &Identity::Guest, &doc).await.unwrap());
        assert!(can_read(&store, &config, &user("alice"), &doc).await.unwrap());
    }

    #[sqlx::test]
    async fn rule_file_is_found_walking_up_to_the_data_root(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("corpus").join("sub");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join("robots.txt"),
            "User-agent: guest\nDisallow: /corpus/\n",
        )
        .unwrap();

        let config = config_for(dir.path());
        let store = Store::from_pool(pool);

        let doc = nested.join("doc1");
        assert!(!can_read(&store, &config, &Identity::Guest, &doc).await.unwrap());
        assert!(can_read(&store, &config, &user("alice"), &doc).await.unwrap());
    }

    #[sqlx::test]
    async fn directories_match_rules_with_a_trailing_slash(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *\nDisallow: /corpus/\n").unwrap();

        let config = config_for(dir.path());
        let store = Store::from_pool(pool);

        assert!(!can_read(&store, &config, &Identity::Guest, &corpus).await.unwrap());
    }

    #[sqlx::test]
    async fn paths_outside_the_data_root_are_denied(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let store = Store::from_pool(pool);

        let outside = Path::new("/etc/passwd");
        let err = can_read(&store, &config, &Identity::Guest, outside).await.unwrap_err();
        assert!(matches!(err, Error::AccessDenied));
    }
}
