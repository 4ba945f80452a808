//! Chat command gateway: parse, resolve, authorize, dispatch

pub mod auth;
pub mod dispatcher;
pub mod handler;
pub mod parser;
pub mod registry;
pub mod types;
pub mod whitelist;

pub use auth::{AuthorizationPolicy, AuthorizationSet};
pub use dispatcher::{
    ChatSink, CommandDispatcher, DispatchOutcome, IgnoreReason, Snapshot, TransportError,
};
pub use handler::{CommandContext, CommandError, CommandHandler};
pub use parser::{MessageParser, ParseOutcome, ParsedCommand};
pub use registry::{CommandRegistry, CommandSpec, RegisteredCommand, RegistryError};
pub use types::{ChannelHandle, Identity, InboundMessage, Sender};
pub use whitelist::WhitelistCommand;
