//! Bridge service
//!
//! Owns the long-lived pieces (membership store, audit log, metrics, sink)
//! and the dispatcher whose snapshot is rebuilt from configuration on every
//! reload. Storage locations are fixed at startup; a reload that changes them
//! is applied for everything else and logged.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigError};
use crate::core_audit::AuditLog;
use crate::core_command::{
    whitelist::WhitelistCommand, AuthorizationPolicy, ChannelHandle, ChatSink, CommandDispatcher,
    CommandHandler, CommandRegistry, DispatchOutcome, Identity, InboundMessage, MessageParser,
    RegistryError, Snapshot,
};
use crate::core_membership::{FileMembershipStore, MembershipStore, StoreError};
use crate::core_text::{defaults as msg, CatalogError, LocaleCatalog, TextCatalog};
use crate::metrics::{MetricsCollector, MetricsSnapshot};

mod console;

pub use console::{run_console, ConsoleSink, CONSOLE_CHANNEL};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Point-in-time view for the `/status` admin command
#[derive(Debug, Clone)]
pub struct BridgeStatus {
    pub prefix: String,
    pub locale: String,
    pub authorized: usize,
    pub commands: Vec<String>,
    /// `None` when the store could not be listed
    pub whitelisted: Option<usize>,
    pub audit_path: PathBuf,
    pub audit_failures: u64,
    pub metrics: MetricsSnapshot,
}

impl BridgeStatus {
    pub fn render(&self, text: &dyn TextCatalog) -> String {
        let authorized = self.authorized.to_string();
        let commands = self.commands.join(",");
        let whitelisted = self
            .whitelisted
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        let audit = self.audit_path.display().to_string();
        text.resolve(
            msg::GAME_BOT_STATUS,
            &[
                ("prefix", self.prefix.as_str()),
                ("locale", self.locale.as_str()),
                ("authorized", authorized.as_str()),
                ("commands", commands.as_str()),
                ("whitelisted", whitelisted.as_str()),
                ("audit", audit.as_str()),
            ],
        )
    }
}

pub struct Bridge {
    config_path: PathBuf,
    config: RwLock<Config>,
    dispatcher: CommandDispatcher,
    store: Arc<dyn MembershipStore>,
    audit: Arc<AuditLog>,
    metrics: Arc<MetricsCollector>,
    sink: Arc<dyn ChatSink>,
}

impl Bridge {
    /// Load configuration from `config_path` and open the configured storage
    pub async fn start(
        config_path: impl Into<PathBuf>,
        sink: Arc<dyn ChatSink>,
    ) -> Result<Self, BridgeError> {
        let config_path = config_path.into();
        let config = Config::load(&config_path)?;

        let store = FileMembershipStore::open(config.storage.whitelist_path()).await?;
        let audit = AuditLog::new(config.storage.audit_path());
        audit.prepare().await;

        Self::with_parts(config_path, config, Arc::new(store), Arc::new(audit), sink)
    }

    /// Assemble a bridge around an already loaded config and storage
    pub fn with_parts(
        config_path: impl Into<PathBuf>,
        config: Config,
        store: Arc<dyn MembershipStore>,
        audit: Arc<AuditLog>,
        sink: Arc<dyn ChatSink>,
    ) -> Result<Self, BridgeError> {
        let metrics = Arc::new(MetricsCollector::new());
        let snapshot = build_snapshot(&config, store.clone(), audit.clone(), metrics.clone())?;
        info!(
            "Bridge configured: prefix {:?}, {} authorized users, commands [{}]",
            snapshot.prefix(),
            snapshot.policy.len(),
            snapshot.registry.names().join(", ")
        );

        Ok(Self {
            config_path: config_path.into(),
            config: RwLock::new(config),
            dispatcher: CommandDispatcher::new(snapshot, sink.clone(), metrics.clone()),
            store,
            audit,
            metrics,
            sink,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Dispatch one chat message
    pub async fn handle(&self, message: &InboundMessage) -> DispatchOutcome {
        self.dispatcher.handle_inbound_message(message).await
    }

    /// Re-read configuration and publish a new snapshot
    ///
    /// Nothing changes unless config, catalog and registry all build.
    pub async fn reload(&self) -> Result<(), BridgeError> {
        // Held for the whole rebuild so reloads never interleave.
        let mut current = self.config.write().await;

        let next = match Config::load(&self.config_path)
            .map_err(BridgeError::from)
            .and_then(|config| {
                let snapshot = build_snapshot(
                    &config,
                    self.store.clone(),
                    self.audit.clone(),
                    self.metrics.clone(),
                )?;
                Ok((config, snapshot))
            }) {
            Ok(next) => next,
            Err(e) => {
                warn!("Reload of {} rejected: {}", self.config_path.display(), e);
                return Err(e);
            }
        };
        let (config, snapshot) = next;

        if config.storage.whitelist_path() != current.storage.whitelist_path()
            || config.storage.audit_path() != current.storage.audit_path()
        {
            warn!("Storage paths changed; restart to apply them");
        }

        let previous = self.dispatcher.publish(snapshot).await;
        info!(
            "Configuration reloaded: prefix {:?} -> {:?}",
            previous.prefix(),
            config.discord.prefix
        );
        *current = config;
        Ok(())
    }

    pub async fn status(&self) -> BridgeStatus {
        let snapshot = self.dispatcher.snapshot().await;
        let locale = self.config.read().await.locale().to_string();

        let whitelisted = match self.store.list_all().await {
            Ok(entries) => Some(entries.len()),
            Err(e) => {
                error!("Could not list whitelist for status: {}", e);
                None
            }
        };

        BridgeStatus {
            prefix: snapshot.prefix().to_string(),
            locale,
            authorized: snapshot.policy.len(),
            commands: snapshot
                .registry
                .names()
                .into_iter()
                .map(String::from)
                .collect(),
            whitelisted,
            audit_path: self.audit.path().to_path_buf(),
            audit_failures: self.audit.failures(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Answer a local `/reload`, `/status` or `/help` line
    pub async fn handle_admin_line(&self, line: &str) -> String {
        let command = line
            .trim()
            .trim_start_matches('/')
            .split_whitespace()
            .next()
            .map(str::to_lowercase);

        match command.as_deref() {
            Some("reload") => match self.reload().await {
                Ok(()) => self.text().await.text(msg::GAME_RELOAD_SUCCESS),
                Err(e) => {
                    let error = e.to_string();
                    self.text()
                        .await
                        .resolve(msg::GAME_RELOAD_FAILED, &[("error", error.as_str())])
                }
            },
            Some("status") => {
                let status = self.status().await;
                status.render(self.text().await.as_ref())
            }
            Some("help") | None => self.text().await.text(msg::GAME_COMMAND_USAGE),
            Some(_) => self.text().await.text(msg::GAME_UNKNOWN_SUBCOMMAND),
        }
    }

    /// Send text outside of a dispatch, logging a failed delivery
    pub async fn reply(&self, channel: &ChannelHandle, text: &str) {
        if let Err(e) = self.sink.send_message(channel, text).await {
            warn!(%channel, "Failed to deliver reply: {}", e);
        }
    }

    async fn text(&self) -> Arc<dyn TextCatalog> {
        self.dispatcher.snapshot().await.text.clone()
    }
}

/// Build everything a dispatch needs from one configuration
pub fn build_snapshot(
    config: &Config,
    store: Arc<dyn MembershipStore>,
    audit: Arc<AuditLog>,
    metrics: Arc<MetricsCollector>,
) -> Result<Snapshot, BridgeError> {
    let text = LocaleCatalog::load(config)?;

    let whitelist: Arc<dyn CommandHandler> = Arc::new(WhitelistCommand::new(store, audit, metrics));
    let spec = config
        .discord
        .aliases
        .iter()
        .fold(whitelist.spec(), |spec, alias| spec.alias(alias.as_str()));

    let mut registry = CommandRegistry::new();
    registry.register(spec, whitelist)?;

    Ok(Snapshot {
        parser: MessageParser::new(config.discord.prefix.as_str()),
        registry,
        policy: AuthorizationPolicy::from_ids(config.discord.authorized_users.iter().cloned()),
        text: Arc::new(text),
        bot_id: config.discord.bot_id.clone().map(Identity::from),
    })
}
