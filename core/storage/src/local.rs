//! Local filesystem profile store.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::store::ProfileStore;
use finvault_common::{Error, ProfileId, Result};

const RECORD_EXTENSION: &str = "profile";

/// Local filesystem profile store.
///
/// Stores one record file per profile under a root directory. Replacement
/// is atomic: the new record is written to a temporary file and renamed
/// over the old one, so a crash mid-write leaves the previous record
/// intact.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a new local store with the given root directory.
    ///
    /// # Postconditions
    /// - Root directory is created if it doesn't exist
    ///
    /// # Errors
    /// - Invalid path
    /// - Permission denied
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        // Create root if it doesn't exist (sync for constructor)
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root })
    }

    /// Filesystem path for a profile record.
    ///
    /// The id is base64-encoded so arbitrary profile ids cannot escape the
    /// root directory.
    fn record_path(&self, id: &ProfileId) -> PathBuf {
        let encoded = URL_SAFE_NO_PAD.encode(id.as_str());
        self.root.join(format!("{}.{}", encoded, RECORD_EXTENSION))
    }
}

#[async_trait]
impl ProfileStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn insert(&self, id: &ProfileId, record: Vec<u8>) -> Result<()> {
        let path = self.record_path(id);
        let staging = path.with_extension("new");

        // Stage the full record, then hard-link it into place. The link
        // fails if the destination exists, so the existence check and the
        // create are one atomic step, and a crash mid-write leaves no
        // half-written record.
        fs::write(&staging, &record).await?;
        let linked = fs::hard_link(&staging, &path).await;
        let _ = fs::remove_file(&staging).await;

        match linked {
            Ok(()) => {
                debug!(profile = %id, "Profile record created");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(
                Error::AlreadyExists(format!("Profile already exists: {}", id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, id: &ProfileId, record: Vec<u8>) -> Result<()> {
        let path = self.record_path(id);

        if !path.exists() {
            return Err(Error::ProfileNotFound(format!("Profile not found: {}", id)));
        }

        // Write-then-rename keeps the old record until the new one is
        // fully on disk.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &record).await?;
        fs::rename(&tmp, &path).await?;

        debug!(profile = %id, "Profile record replaced");
        Ok(())
    }

    async fn load(&self, id: &ProfileId) -> Result<Vec<u8>> {
        let path = self.record_path(id);

        if !path.exists() {
            return Err(Error::ProfileNotFound(format!("Profile not found: {}", id)));
        }

        Ok(fs::read(&path).await?)
    }

    async fn delete(&self, id: &ProfileId) -> Result<()> {
        let path = self.record_path(id);

        if !path.exists() {
            return Err(Error::ProfileNotFound(format!("Profile not found: {}", id)));
        }

        fs::remove_file(&path).await?;
        debug!(profile = %id, "Profile record deleted");
        Ok(())
    }

    async fn exists(&self, id: &ProfileId) -> Result<bool> {
        Ok(self.record_path(id).exists())
    }

    async fn list(&self) -> Result<Vec<ProfileId>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(decoded) = URL_SAFE_NO_PAD.decode(stem) else {
                continue;
            };
            if let Ok(id) = String::from_utf8(decoded) {
                ids.push(ProfileId::new(id)?);
            }
        }

        Ok(ids)
    }
}
