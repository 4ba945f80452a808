//! Chat-side identifiers and the inbound event

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network-assigned user id; opaque and stable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Identity(id.to_string())
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Identity(id)
    }
}

/// Where a reply goes; only the transport knows what is inside
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelHandle(pub String);

impl ChannelHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        ChannelHandle(handle.into())
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: Identity,
    pub display_name: String,
    pub is_bot: bool,
}

impl Sender {
    pub fn user(id: impl Into<Identity>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_bot: false,
        }
    }

    pub fn bot(id: impl Into<Identity>, display_name: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            ..Self::user(id, display_name)
        }
    }
}

/// One chat message as delivered by the transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    pub sender: Sender,
    pub channel: ChannelHandle,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, sender: Sender, channel: ChannelHandle) -> Self {
        Self {
            text: text.into(),
            sender,
            channel,
        }
    }
}
