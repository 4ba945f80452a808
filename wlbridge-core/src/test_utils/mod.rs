//! Test helpers shared by the unit tests

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core_command::{ChannelHandle, ChatSink, TransportError};
use crate::core_membership::{
    AddOutcome, MembershipEntry, MembershipStore, RemoveOutcome, StoreError, StoreResult,
};

/// Chat sink that keeps every message it was asked to send
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingSink {
    /// Records like the default sink but reports every send as failed
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// `(channel, text)` pairs in send order
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .await
            .push((channel.to_string(), text.to_string()));
        if self.fail {
            return Err(TransportError::Unavailable(channel.to_string()));
        }
        Ok(())
    }
}

/// Membership store whose every call fails with an I/O error
#[derive(Default)]
pub struct FailingStore;

impl FailingStore {
    fn error() -> StoreError {
        StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "whitelist is read-only",
        ))
    }
}

#[async_trait]
impl MembershipStore for FailingStore {
    async fn add(&self, _name: &str) -> StoreResult<AddOutcome> {
        Err(Self::error())
    }

    async fn remove(&self, _name: &str) -> StoreResult<RemoveOutcome> {
        Err(Self::error())
    }

    async fn list_all(&self) -> StoreResult<Vec<MembershipEntry>> {
        Err(Self::error())
    }
}
