//! Collection archive packaging.
//!
//! Archives are produced by spawning the system `tar`, matching what the
//! annotation tool shipped with; there is no in-process tar implementation.
//! The `.stats_cache` directory never ships, and project configuration files
//! only ship on request. When configs are inherited from parent directories
//! they are folded into the archive under the collection directory name.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::{fs, process::Command};
use tracing::{debug, instrument};

use crate::{
    config::Config,
    errors::{Error, Result},
};

/// A packaged collection archive, gzip-compressed tar bytes plus the file
/// name to serve it under.
#[derive(Debug)]
pub struct Archive {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Locate `file_name` walking up from `start` to `root`, returning the
/// directory holding it and how many levels up it sits.
async fn find_in_directory_tree(root: &Path, start: &Path, file_name: &str) -> Option<(PathBuf, usize)> {
    let mut dir = start.to_path_buf();
    let mut depth = 0;
    loop {
        if fs::metadata(dir.join(file_name)).await.is_ok() {
            return Some((dir, depth));
        }
        if dir == root || !dir.starts_with(root) {
            return None;
        }
        dir = dir.parent()?.to_path_buf();
        depth += 1;
    }
}

/// Package the collection directory at `real_dir` as `<dir>.tar.gz`.
#[instrument(skip(config), fields(real_dir = %real_dir.display(), include_conf), err)]
pub async fn create_archive(config: &Config, real_dir: &Path, include_conf: bool) -> Result<Archive> {
    let dir_name = real_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(Error::AccessDenied)?;
    let parent = real_dir.parent().ok_or(Error::AccessDenied)?;
    let file_name = format!("{dir_name}.tar.gz");

    let tmp_file = NamedTempFile::new().map_err(|e| Error::Internal {
        operation: format!("create archive scratch file: {e}"),
    })?;

    let mut cmd = Command::new("tar");
    cmd.current_dir(parent);
    cmd.arg("--exclude=.stats_cache");

    let mut conf_names: Vec<String> = Vec::new();
    if !include_conf {
        for conf in &config.archive.config_files {
            cmd.arg(format!("--exclude={conf}"));
        }
    } else {
        // Configs inherited from parent directories get pulled in under the
        // collection directory name.
        for conf in &config.archive.config_files {
            if let Some((_, depth)) = find_in_directory_tree(&config.data_dir, real_dir, conf).await {
                if depth > 0 {
                    let mut rel = PathBuf::from(&dir_name);
                    for _ in 0..depth {
                        rel.push("..");
                    }
                    rel.push(conf);
                    conf_names.push(rel.to_string_lossy().into_owned());
                }
            }
        }
        if !conf_names.is_empty() {
            cmd.arg("--absolute-names");
            cmd.arg("--transform");
            cmd.arg(format!("s|.*\\.\\.|{dir_name}|"));
        }
    }

    cmd.args(["-c", "-z", "-f"]);
    cmd.arg(tmp_file.path());
    cmd.arg(&dir_name);
    cmd.args(&conf_names);

    debug!(?conf_names, "packaging collection archive");
    let status = cmd.status().await.map_err(|e| Error::Upstream {
        operation: "archive collection".to_string(),
        detail: format!("failed to spawn tar: {e}"),
    })?;
    if !status.success() {
        return Err(Error::Upstream {
            operation: "archive collection".to_string(),
            detail: format!("tar exited with {status}"),
        });
    }

    let data = fs::read(tmp_file.path()).await.map_err(|e| Error::Internal {
        operation: format!("read archive scratch file: {e}"),
    })?;
    // tmp_file drops here, removing the scratch file on every exit path.

    Ok(Archive { file_name, data })
}
