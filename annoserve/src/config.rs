//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` but can be specified
//! via `-f` flag or the `ANNOSERVE_CONFIG` environment variable.
//!
//! Sources are merged in order (later overrides earlier):
//!
//! 1. **YAML config file** - base configuration
//! 2. **Environment variables** - `ANNOSERVE_` prefixed, `__` for nesting
//!
//! ```bash
//! ANNOSERVE_PORT=8080
//! ANNOSERVE_DATABASE__PATH=/var/lib/annoserve/users.db
//! ANNOSERVE_SESSION__COOKIE_NAME=annoserve_session
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Simple CLI args - just for specifying the config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ANNOSERVE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Root directory holding annotation collections
    pub data_dir: PathBuf,
    /// Credential/permission store location
    pub database: DatabaseConfig,
    /// Secret key for signing session tokens (required for production)
    pub secret_key: Option<String>,
    /// User name for the initial admin user (created on first startup)
    pub admin_user: String,
    /// Password for the initial admin user (optional, can be set via environment)
    pub admin_password: Option<String>,
    /// Session cookie settings
    pub session: SessionConfig,
    /// Access-control rule file settings
    pub access: AccessConfig,
    /// Collection archive settings
    pub archive: ArchiveConfig,
    /// Optional triplestore sync endpoints; sync is disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triplestore: Option<TriplestoreConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8125,
            data_dir: PathBuf::from("data"),
            database: DatabaseConfig::default(),
            secret_key: None,
            admin_user: "admin".to_string(),
            admin_password: None,
            session: SessionConfig::default(),
            access: AccessConfig::default(),
            archive: ArchiveConfig::default(),
            triplestore: None,
        }
    }
}

/// Location of the SQLite credential store file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the store file. The file is never created implicitly; a
    /// missing store fails each request closed.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("users.db"),
        }
    }
}

/// Session token and cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Mark the cookie Secure (disable for plain-HTTP development setups)
    pub cookie_secure: bool,
    /// Session token lifetime
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "annoserve_session".to_string(),
            cookie_secure: true,
            timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Rule-file lookup settings for the access controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// File name of the robots.txt-style rule file searched for in the
    /// nearest governing directory
    pub rule_file: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            rule_file: "robots.txt".to_string(),
        }
    }
}

/// Collection archive settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Project configuration files excluded from archives unless the
    /// download explicitly asks for them
    pub config_files: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            config_files: vec![
                "annotation.conf".to_string(),
                "visual.conf".to_string(),
                "tools.conf".to_string(),
                "kb_shortcuts.conf".to_string(),
            ],
        }
    }
}

/// SPARQL triplestore endpoints for annotation sync.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriplestoreConfig {
    /// Graph store endpoint accepting DELETE with a `graph` parameter
    pub data_url: Url,
    /// Update endpoint accepting POSTed SPARQL `update` statements
    pub update_url: Url,
    /// Base URI under which per-(user, document) graphs are named
    #[serde(default = "default_graph_base")]
    pub graph_base: Url,
}

fn default_graph_base() -> Url {
    // Fixed namespace of the annotation project; see export::rdf.
    Url::parse("http://contextus.net/user/").expect("static graph base URL")
}

impl Config {
    /// Load configuration from the YAML file and environment overrides.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("ANNOSERVE_").split("__"))
            .extract()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
