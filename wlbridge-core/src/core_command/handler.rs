//! Command handler interface

use async_trait::async_trait;
use thiserror::Error;

use super::registry::CommandSpec;
use super::types::{ChannelHandle, Sender};
use crate::core_membership::StoreError;
use crate::core_text::TextCatalog;

/// Why a handler did not produce a reply
#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong arity or unknown sub-action; answered with the usage text
    #[error("invalid usage")]
    InvalidUsage,

    #[error("membership store failed: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Failed(String),
}

/// Everything a handler may look at for one invocation
pub struct CommandContext<'a> {
    pub args: &'a [String],
    pub sender: &'a Sender,
    pub channel: &'a ChannelHandle,
    /// Prefix in effect for this dispatch, for help and usage texts
    pub prefix: &'a str,
    pub text: &'a dyn TextCatalog,
}

/// A registered command
///
/// Returns the reply text; the dispatcher delivers it.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn spec(&self) -> CommandSpec;

    async fn execute(&self, ctx: CommandContext<'_>) -> Result<String, CommandError>;
}
