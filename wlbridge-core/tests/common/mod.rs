//! Shared harness for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;
use wlbridge_core::bridge::Bridge;
use wlbridge_core::config::Config;
use wlbridge_core::core_audit::AuditLog;
use wlbridge_core::core_command::{
    ChannelHandle, ChatSink, DispatchOutcome, InboundMessage, Sender, TransportError,
};
use wlbridge_core::core_membership::MemoryMembershipStore;

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub async fn texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|(_, t)| t.clone()).collect()
    }

    pub async fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .await
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

/// A bridge over an in-memory store, configured with prefix `!` and `U1`
pub struct TestBridge {
    pub bridge: Arc<Bridge>,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<MemoryMembershipStore>,
    pub audit: Arc<AuditLog>,
    pub dir: TempDir,
}

pub fn write_config(dir: &Path, prefix: &str, users: &[&str]) -> Config {
    let mut config = Config::default();
    config.discord.prefix = prefix.to_string();
    config.discord.authorized_users = users.iter().map(|u| u.to_string()).collect();
    config.discord.bot_id = Some("BOT".to_string());
    config.storage.data_dir = dir.to_path_buf();
    config.save_to_file(dir.join("config.toml")).unwrap();
    config
}

impl TestBridge {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "!", &["U1"]);

        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(MemoryMembershipStore::new());
        let audit = Arc::new(AuditLog::new(config.storage.audit_path()));
        let bridge = Bridge::with_parts(
            dir.path().join("config.toml"),
            config,
            store.clone(),
            audit.clone(),
            sink.clone(),
        )
        .unwrap();

        Self {
            bridge: Arc::new(bridge),
            sink,
            store,
            audit,
            dir,
        }
    }

    pub async fn say(&self, sender: &str, text: &str) -> DispatchOutcome {
        let message = InboundMessage::new(
            text,
            Sender::user(sender, format!("{}-name", sender.to_lowercase())),
            ChannelHandle::new("general"),
        );
        self.bridge.handle(&message).await
    }

    pub async fn audit_lines(&self) -> Vec<String> {
        self.audit.read_lines().await.unwrap()
    }
}
