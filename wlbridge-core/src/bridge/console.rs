//! Line-oriented console transport
//!
//! Each input line is either a local admin command (leading `/`) or a chat
//! message from the configured console identity. Chat lines are dispatched
//! concurrently; replies are written as `[channel] text`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::Bridge;
use crate::core_command::{ChannelHandle, ChatSink, InboundMessage, Sender, TransportError};
use crate::shutdown::ShutdownCoordinator;

pub const CONSOLE_CHANNEL: &str = "console";

/// Writes replies to any async writer, one line per message
pub struct ConsoleSink<W> {
    out: Mutex<W>,
}

impl<W> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl ConsoleSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> ChatSink for ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> Result<(), TransportError> {
        let line = format!("[{}] {}\n", channel, text);
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// Feed `input` to the bridge until EOF or shutdown, then drain dispatches
pub async fn run_console<R>(
    bridge: Arc<Bridge>,
    input: R,
    sender: Sender,
    coordinator: &ShutdownCoordinator,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let channel = ChannelHandle::new(CONSOLE_CHANNEL);
    let mut lines = input.lines();
    let mut shutdown = coordinator.subscribe();
    let mut tasks = JoinSet::new();

    info!(
        "Bot is ready! Reading chat as {} ({})",
        sender.display_name, sender.id
    );

    let result = loop {
        if coordinator.is_shutting_down().await {
            break Ok(());
        }
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Console stopped taking input");
                break Ok(());
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                match joined {
                    Ok(outcome) => debug!(?outcome, "Dispatch finished"),
                    Err(e) => warn!("Dispatch task ended abnormally: {}", e),
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                };
                if line.trim().is_empty() {
                    continue;
                }

                if line.trim_start().starts_with('/') {
                    let reply = bridge.handle_admin_line(&line).await;
                    bridge.reply(&channel, &reply).await;
                    continue;
                }

                let message = InboundMessage::new(line, sender.clone(), channel.clone());
                let bridge = bridge.clone();
                tasks.spawn(async move { bridge.handle(&message).await });
            }
        }
    };

    coordinator.drain(&mut tasks).await;
    result
}
