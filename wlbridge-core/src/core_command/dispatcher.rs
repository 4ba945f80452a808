//! Inbound message dispatch
//!
//! The dispatcher is the fault barrier between one chat message and the
//! event loop: whatever a handler does, including panicking, ends up as at
//! most one reply to that message's channel and a log line.
//!
//! Prefix, registry, policy and text catalog live together in an immutable
//! [`Snapshot`]. Each dispatch takes the current snapshot once, so a reload
//! that publishes a new one mid-dispatch is invisible to it.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::auth::AuthorizationPolicy;
use super::handler::{CommandContext, CommandError};
use super::parser::{MessageParser, ParseOutcome};
use super::registry::CommandRegistry;
use super::types::{ChannelHandle, Identity, InboundMessage};
use crate::core_text::{defaults as msg, TextCatalog};
use crate::metrics::{MetricsCollector, Timer, DISPATCH_DURATION_MS};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of the chat transport
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Fire and forget; the dispatcher only logs a failure
    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> Result<(), TransportError>;
}

/// Everything a reload replaces, published as one value
pub struct Snapshot {
    pub parser: MessageParser,
    pub registry: CommandRegistry,
    pub policy: AuthorizationPolicy,
    pub text: Arc<dyn TextCatalog>,
    /// Messages from this identity are never dispatched
    pub bot_id: Option<Identity>,
}

impl Snapshot {
    pub fn prefix(&self) -> &str {
        self.parser.prefix()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    FromBot,
    NotACommand,
    UnknownCommand,
}

/// What happened to one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing was sent
    Ignored(IgnoreReason),
    /// Sender lacks permission; denial sent
    Denied,
    /// Usage text sent
    InvalidUsage,
    /// Handler reply sent
    Replied,
    /// Handler failed; generic error sent
    Failed,
}

pub struct CommandDispatcher {
    snapshot: RwLock<Arc<Snapshot>>,
    sink: Arc<dyn ChatSink>,
    metrics: Arc<MetricsCollector>,
}

impl CommandDispatcher {
    pub fn new(snapshot: Snapshot, sink: Arc<dyn ChatSink>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            sink,
            metrics,
        }
    }

    /// The snapshot new dispatches will use
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Atomically replace the snapshot, returning the previous one
    pub async fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut current = self.snapshot.write().await;
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Parse, resolve, authorize, run, reply
    pub async fn handle_inbound_message(&self, message: &InboundMessage) -> DispatchOutcome {
        let snapshot = self.snapshot().await;
        let sender = &message.sender;

        if sender.is_bot || snapshot.bot_id.as_ref() == Some(&sender.id) {
            return DispatchOutcome::Ignored(IgnoreReason::FromBot);
        }

        let parsed = match snapshot.parser.parse(&message.text, &sender.id) {
            ParseOutcome::NoMatch => return DispatchOutcome::Ignored(IgnoreReason::NotACommand),
            ParseOutcome::Command(parsed) => parsed,
        };

        let Ok(command) = snapshot.registry.resolve(&parsed.command_token) else {
            debug!(token = %parsed.command_token, "Ignoring unknown command");
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand);
        };
        let name = command.spec.name.as_str();
        self.metrics.inc_received();

        if !snapshot.policy.is_authorized(&sender.id, name) {
            debug!(command = name, sender = %sender.id, "Denied unauthorized sender");
            self.metrics.inc_denied();
            self.send(&message.channel, &snapshot.text.text(msg::NO_PERMISSION))
                .await;
            return DispatchOutcome::Denied;
        }

        let usage = || {
            snapshot.text.resolve(
                msg::INVALID_COMMAND,
                &[("prefix", snapshot.prefix()), ("usage", command.spec.usage.as_str())],
            )
        };

        if !command.spec.accepts(parsed.args.len()) {
            self.send(&message.channel, &usage()).await;
            return DispatchOutcome::InvalidUsage;
        }

        let ctx = CommandContext {
            args: &parsed.args,
            sender,
            channel: &message.channel,
            prefix: snapshot.prefix(),
            text: snapshot.text.as_ref(),
        };

        let timer = Timer::new(DISPATCH_DURATION_MS);
        let result = AssertUnwindSafe(command.handler.execute(ctx))
            .catch_unwind()
            .await;
        timer.stop();

        match result {
            Ok(Ok(reply)) => {
                self.send(&message.channel, &reply).await;
                DispatchOutcome::Replied
            }
            Ok(Err(CommandError::InvalidUsage)) => {
                self.send(&message.channel, &usage()).await;
                DispatchOutcome::InvalidUsage
            }
            Ok(Err(e)) => {
                error!("Error executing command '{}': {}", name, e);
                self.fail(&message.channel, &snapshot).await
            }
            Err(panic) => {
                error!(
                    "Command '{}' panicked: {}",
                    name,
                    panic_message(panic.as_ref())
                );
                self.fail(&message.channel, &snapshot).await
            }
        }
    }

    async fn fail(&self, channel: &ChannelHandle, snapshot: &Snapshot) -> DispatchOutcome {
        self.metrics.inc_failed();
        self.send(channel, &snapshot.text.text(msg::COMMAND_ERROR))
            .await;
        DispatchOutcome::Failed
    }

    async fn send(&self, channel: &ChannelHandle, text: &str) {
        if let Err(e) = self.sink.send_message(channel, text).await {
            warn!(%channel, "Failed to deliver reply: {}", e);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
