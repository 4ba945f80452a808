//! In-memory membership store

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    check_name, AddOutcome, MembershipEntry, MembershipStore, RemoveOutcome, StoreResult,
};

/// Whitelist held in memory; used by tests
#[derive(Debug, Default)]
pub struct MemoryMembershipStore {
    entries: Mutex<Vec<MembershipEntry>>,
}

impl MemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing entries, including nameless ones
    pub fn with_entries(entries: Vec<MembershipEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn add(&self, name: &str) -> StoreResult<AddOutcome> {
        check_name(name)?;
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|e| e.has_name(name)) {
            return Ok(AddOutcome {
                already_present: true,
            });
        }
        entries.push(MembershipEntry::new(Uuid::new_v4().to_string(), name));
        Ok(AddOutcome {
            already_present: false,
        })
    }

    async fn remove(&self, name: &str) -> StoreResult<RemoveOutcome> {
        check_name(name)?;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| !e.has_name(name));
        Ok(RemoveOutcome {
            was_present: entries.len() != before,
        })
    }

    async fn list_all(&self) -> StoreResult<Vec<MembershipEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}
