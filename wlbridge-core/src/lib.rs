pub mod bridge;
pub mod config;
pub mod core_audit;
pub mod core_command;
pub mod core_membership;
pub mod core_text;
pub mod logging;
pub mod metrics;
pub mod shutdown;

#[cfg(test)]
mod test_utils;

pub use bridge::{Bridge, BridgeError, BridgeStatus};
pub use config::Config;
pub use core_command::{CommandDispatcher, DispatchOutcome, InboundMessage};
pub use logging::{init_logging, LogLevel};
