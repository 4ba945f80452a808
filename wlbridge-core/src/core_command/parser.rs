//! Prefix matching and tokenization

use super::types::Identity;

/// A message that looks like a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// First token after the prefix, lowercased
    pub command_token: String,
    /// Remaining tokens exactly as typed
    pub args: Vec<String>,
    pub sender: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Ordinary chat; not an error
    NoMatch,
    Command(ParsedCommand),
}

/// Turns raw message text into a [`ParsedCommand`]
#[derive(Debug, Clone)]
pub struct MessageParser {
    prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Match the prefix on the trimmed text, then split the rest on runs of
    /// whitespace
    ///
    /// Needs a command token and at least one argument after the prefix.
    pub fn parse(&self, text: &str, sender: &Identity) -> ParseOutcome {
        if self.prefix.is_empty() {
            return ParseOutcome::NoMatch;
        }
        let Some(rest) = text.trim().strip_prefix(self.prefix.as_str()) else {
            return ParseOutcome::NoMatch;
        };

        let mut tokens = rest.split_whitespace();
        let Some(command) = tokens.next() else {
            return ParseOutcome::NoMatch;
        };
        let args: Vec<String> = tokens.map(String::from).collect();
        if args.is_empty() {
            return ParseOutcome::NoMatch;
        }

        ParseOutcome::Command(ParsedCommand {
            command_token: command.to_lowercase(),
            args,
            sender: sender.clone(),
        })
    }
}
