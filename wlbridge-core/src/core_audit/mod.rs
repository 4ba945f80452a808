//! Append-only audit log of whitelist mutations
//!
//! One line per record:
//!
//! ```text
//! [2024-05-01T18:22:03.114] ADD Steve by alice (123456789)
//! ```
//!
//! The log is best-effort. A failed append is logged and counted but never
//! reaches the chat reply and never undoes the mutation it describes.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::metrics;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Add,
    Remove,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Add => "ADD",
            AuditAction::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who changed what, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Local>,
    pub action: AuditAction,
    pub target: String,
    pub actor_display_name: String,
    pub actor_id: String,
}

impl AuditRecord {
    /// Record stamped with the current local time
    pub fn now(
        action: AuditAction,
        target: impl Into<String>,
        actor_display_name: impl Into<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            action,
            target: target.into(),
            actor_display_name: actor_display_name.into(),
            actor_id: actor_id.into(),
        }
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} by {} ({})",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.action,
            self.target,
            self.actor_display_name,
            self.actor_id
        )
    }
}

/// Owns the audit file handle; appends are serialized by a mutex
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
    failures: AtomicU64,
}

impl AuditLog {
    /// The file is not touched until [`AuditLog::prepare`] or the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
            failures: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends that failed since startup
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Create the file eagerly so permission problems show up at startup
    pub async fn prepare(&self) {
        let mut file = self.file.lock().await;
        match self.open_handle(&mut file).await {
            Ok(_) => info!("Whitelist logging has been set up successfully"),
            Err(e) => error!(
                "Could not create {}: {}",
                self.path.display(),
                e
            ),
        }
    }

    /// Append one record, logging instead of returning any failure
    pub async fn append(&self, record: &AuditRecord) {
        if let Err(e) = self.try_append(record).await {
            self.failures.fetch_add(1, Ordering::Relaxed);
            metrics::record_counter(metrics::AUDIT_WRITE_FAILURES, 1);
            error!(action = %record.action, target = %record.target, "{}", e);
        }
    }

    /// Append one record, surfacing the I/O error
    pub async fn try_append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = format!("{}\n", record);
        let mut guard = self.file.lock().await;

        let result = async {
            let file = self.open_handle(&mut guard).await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(source) = result {
            // Drop the handle so the next append reopens the file.
            *guard = None;
            return Err(AuditError::Write {
                path: self.path.display().to_string(),
                source,
            });
        }
        Ok(())
    }

    /// Every line written so far, oldest first
    pub async fn read_lines(&self) -> Result<Vec<String>, AuditError> {
        let _guard = self.file.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents.lines().map(String::from).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(AuditError::Write {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    async fn open_handle<'a>(
        &self,
        slot: &'a mut Option<File>,
    ) -> Result<&'a mut File, std::io::Error> {
        if slot.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *slot = Some(file);
        }
        slot.as_mut()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "audit handle closed"))
    }
}
