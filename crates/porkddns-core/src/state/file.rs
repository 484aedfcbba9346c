// # File State Store
//
// Plain-text implementation of StateStore.
//
// ## File Format
//
// The file holds the last applied IP and nothing else, e.g.
//
// ```text
// 203.0.113.7
// ```
//
// Surrounding whitespace is ignored on read. A missing or blank file means the
// updater has never completed a pass.
//
// ## Crash Safety
//
// - Atomic writes: new content is written to `<path>.tmp`, flushed, then renamed
// - A failed write or rename removes the temp file
// - Parent directories are created on first write

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::ip_source::PublicIp;
use crate::traits::state_store::StateStore;

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use porkddns_core::state::FileStateStore;
/// use porkddns_core::traits::{PublicIp, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/porkddns/last_ip.txt");
///
///     store.commit_ip(&PublicIp::new("203.0.113.7")).await?;
///     assert_eq!(store.last_ip().await?, Some(PublicIp::new("203.0.113.7")));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store backed by `path`
    ///
    /// Nothing is read or created until the first call.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    async fn ensure_parent_dir(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !fs::try_exists(parent).await.unwrap_or(false)
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn last_ip(&self) -> Result<Option<PublicIp>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("State file does not exist: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::state_store(format!(
                    "Failed to read state file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let ip = PublicIp::new(&content);
        if ip.is_empty() {
            tracing::debug!("State file is empty: {}", self.path.display());
            return Ok(None);
        }
        Ok(Some(ip))
    }

    async fn commit_ip(&self, ip: &PublicIp) -> Result<(), Error> {
        self.ensure_parent_dir().await?;

        let temp_path = self.temp_path();
        let written = match write_temp(&temp_path, ip).await {
            // Atomic rename (temp -> actual)
            Ok(()) => fs::rename(&temp_path, &self.path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to rename {} to {}: {}",
                    temp_path.display(),
                    self.path.display(),
                    e
                ))
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(
                    "Failed to remove temp file {}: {}",
                    temp_path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

/// Write and flush `ip` to the temp file
async fn write_temp(temp_path: &Path, ip: &PublicIp) -> Result<(), Error> {
    let mut file = fs::File::create(temp_path).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.write_all(ip.as_str().as_bytes()).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to write to temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.sync_all().await.map_err(|e| {
        Error::state_store(format!(
            "Failed to flush temp file {}: {}",
            temp_path.display(),
            e
        ))
    })
}
