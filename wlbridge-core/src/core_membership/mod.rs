//! Membership store
//!
//! The authoritative whitelist belongs to the host server; the bridge only
//! asks it to add, remove and list. Every call is idempotent and reports
//! whether it changed anything, which is what decides whether an audit
//! record is written. Implementations must serialize their own mutations so
//! that report stays accurate when two dispatches race on the same name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod file_store;
mod memory_store;

pub use file_store::FileMembershipStore;
pub use memory_store::MemoryMembershipStore;

/// One whitelisted identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    #[serde(rename = "uuid")]
    pub id: String,

    /// Display name; entries written by other tools may lack one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MembershipEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Names compare case-insensitively, like the host server does
    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .map_or(false, |own| own.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub already_present: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub was_present: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt whitelist file: {0}")]
    Corrupt(String),

    #[error("Invalid username: {0:?}")]
    InvalidName(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn add(&self, name: &str) -> StoreResult<AddOutcome>;

    async fn remove(&self, name: &str) -> StoreResult<RemoveOutcome>;

    async fn list_all(&self) -> StoreResult<Vec<MembershipEntry>>;

    async fn contains(&self, name: &str) -> StoreResult<bool> {
        Ok(self.list_all().await?.iter().any(|e| e.has_name(name)))
    }
}

pub(crate) fn check_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_name_ignores_case() {
        let entry = MembershipEntry::new("id-1", "Steve");
        assert!(entry.has_name("steve"));
        assert!(!entry.has_name("alex"));

        let nameless = MembershipEntry {
            id: "id-2".to_string(),
            name: None,
        };
        assert!(!nameless.has_name(""));
    }

    #[test]
    fn test_entry_json_layout() {
        let entry = MembershipEntry::new("abc", "Steve");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"uuid":"abc","name":"Steve"}"#);

        let nameless: MembershipEntry = serde_json::from_str(r#"{"uuid":"xyz"}"#).unwrap();
        assert_eq!(nameless.name, None);
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("Steve").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("two words").is_err());
    }
}
