//! JSON file membership store
//!
//! Reads and writes the host server's whitelist file: a JSON array of
//! `{"uuid": ..., "name": ...}` objects. The file is rewritten in full after
//! every mutation (write to a sibling temp file, then rename). The in-memory
//! copy only changes once the write succeeded.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    check_name, AddOutcome, MembershipEntry, MembershipStore, RemoveOutcome, StoreError,
    StoreResult,
};

pub struct FileMembershipStore {
    path: PathBuf,
    entries: Mutex<Vec<MembershipEntry>>,
}

impl FileMembershipStore {
    /// Open the whitelist file; a missing file is an empty whitelist
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            "Opened whitelist {} with {} entries",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &[MembershipEntry]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for FileMembershipStore {
    async fn add(&self, name: &str) -> StoreResult<AddOutcome> {
        check_name(name)?;
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|e| e.has_name(name)) {
            return Ok(AddOutcome {
                already_present: true,
            });
        }

        let mut updated = entries.clone();
        updated.push(MembershipEntry::new(Uuid::new_v4().to_string(), name));
        self.persist(&updated).await?;
        *entries = updated;

        info!("{} has been added to server whitelist.", name);
        Ok(AddOutcome {
            already_present: false,
        })
    }

    async fn remove(&self, name: &str) -> StoreResult<RemoveOutcome> {
        check_name(name)?;
        let mut entries = self.entries.lock().await;
        if !entries.iter().any(|e| e.has_name(name)) {
            return Ok(RemoveOutcome { was_present: false });
        }

        let updated: Vec<_> = entries
            .iter()
            .filter(|e| !e.has_name(name))
            .cloned()
            .collect();
        self.persist(&updated).await?;
        *entries = updated;

        info!("{} has been removed from server whitelist.", name);
        Ok(RemoveOutcome { was_present: true })
    }

    async fn list_all(&self) -> StoreResult<Vec<MembershipEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}
