//! Files retrieved through an inclusion, and saving them locally.

use crate::Result;
use log::debug;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFile {
    /// Remote path that was included, e.g. `/etc/passwd`.
    pub path: String,
    pub body: String,
}

impl IncludedFile {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
        }
    }

    /// Writes the body to `destination` and returns that path.
    pub async fn save(&self, destination: &Path) -> Result<PathBuf> {
        fs::write(destination, self.body.as_bytes()).await?;
        debug!("Saved {} to {}", self.path, destination.display());
        Ok(destination.to_path_buf())
    }

    /// Saves the body under `base`, mirroring the remote path
    /// (`/etc/passwd` lands in `base/etc/passwd`).
    pub async fn mirror(&self, base: &Path) -> Result<PathBuf> {
        let destination = base.join(mirror_relative_path(&self.path));

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        self.save(&destination).await
    }
}

impl fmt::Display for IncludedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

/// Relative form of a remote path that cannot climb out of the mirror root.
/// Backslash separators from Windows paths are treated as `/`.
pub fn mirror_relative_path(remote: &str) -> PathBuf {
    let normalized = remote.replace('\\', "/");
    Path::new(&normalized)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
