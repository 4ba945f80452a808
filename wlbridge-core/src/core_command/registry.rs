//! Command table keyed by canonical name, with an alias table in front
//!
//! Names and aliases are lowercased once on registration and the token once
//! on lookup. A collision between any two of them is a configuration error
//! raised while building the table; a finished registry is never mutated, a
//! reload builds a new one.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::handler::CommandHandler;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Duplicate command name or alias: {0}")]
    DuplicateCommand(String),

    #[error("Invalid command name: {0:?}")]
    InvalidName(String),

    #[error("Unknown command: {0}")]
    NotFound(String),
}

/// Static description of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub usage: String,
    pub description: String,
    pub min_args: usize,
    pub max_args: usize,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            usage: String::new(),
            description: String::new(),
            min_args: 0,
            max_args: usize::MAX,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn arity(mut self, min_args: usize, max_args: usize) -> Self {
        self.min_args = min_args;
        self.max_args = max_args;
        self
    }

    pub fn accepts(&self, arg_count: usize) -> bool {
        (self.min_args..=self.max_args).contains(&arg_count)
    }
}

/// A spec and the handler that runs it
#[derive(Clone)]
pub struct RegisteredCommand {
    pub spec: CommandSpec,
    pub handler: Arc<dyn CommandHandler>,
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command under its canonical name and every alias
    pub fn register(
        &mut self,
        spec: CommandSpec,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        let name = normalize(&spec.name)?;
        let aliases = spec
            .aliases
            .iter()
            .map(|alias| normalize(alias))
            .collect::<Result<Vec<_>, _>>()?;

        let mut claimed: Vec<&str> = Vec::with_capacity(aliases.len() + 1);
        for key in std::iter::once(&name).chain(aliases.iter()) {
            if self.is_taken(key) || claimed.contains(&key.as_str()) {
                return Err(RegistryError::DuplicateCommand(key.clone()));
            }
            claimed.push(key);
        }

        for alias in &aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        let spec = CommandSpec {
            name: name.clone(),
            aliases,
            ..spec
        };
        self.commands
            .insert(name, RegisteredCommand { spec, handler });
        Ok(())
    }

    /// Register a handler under the spec it reports
    pub fn register_handler(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), RegistryError> {
        self.register(handler.spec(), handler)
    }

    /// Look a token up through the alias table, then by canonical name
    pub fn resolve(&self, token: &str) -> Result<&RegisteredCommand, RegistryError> {
        let token = token.trim().to_lowercase();
        let name = self.aliases.get(&token).unwrap_or(&token);
        self.commands
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(token.clone()))
    }

    /// Canonical names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn is_taken(&self, key: &str) -> bool {
        self.commands.contains_key(key) || self.aliases.contains_key(key)
    }
}

fn normalize(name: &str) -> Result<String, RegistryError> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_command::handler::{CommandContext, CommandError};
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl CommandHandler for Echo {
        fn spec(&self) -> CommandSpec {
            CommandSpec::new(self.0)
        }

        async fn execute(&self, _ctx: CommandContext<'_>) -> Result<String, CommandError> {
            Ok(self.0.to_string())
        }
    }

    fn handler(name: &'static str) -> Arc<dyn CommandHandler> {
        Arc::new(Echo(name))
    }

    #[test]
    fn test_alias_resolves_to_same_handler_in_any_case() {
        let mut registry = CommandRegistry::new();
        let whitelist = handler("whitelist");
        registry
            .register(CommandSpec::new("Whitelist").alias("WL"), whitelist.clone())
            .unwrap();

        for token in ["whitelist", "WHITELIST", "wl", "Wl"] {
            let found = registry.resolve(token).unwrap();
            assert!(Arc::ptr_eq(&found.handler, &whitelist), "token {}", token);
            assert_eq!(found.spec.name, "whitelist");
            assert_eq!(found.spec.aliases, vec!["wl"]);
        }
    }

    #[test]
    fn test_unknown_token_is_not_found() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.resolve("Ban").err(),
            Some(RegistryError::NotFound("ban".to_string()))
        );
    }

    #[test]
    fn test_collisions_are_rejected() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandSpec::new("whitelist").alias("wl"), handler("whitelist"))
            .unwrap();

        let alias_vs_name = registry.register(CommandSpec::new("WL"), handler("wl"));
        assert_eq!(
            alias_vs_name,
            Err(RegistryError::DuplicateCommand("wl".to_string()))
        );

        let alias_vs_alias =
            registry.register(CommandSpec::new("walls").alias("Wl"), handler("walls"));
        assert!(matches!(alias_vs_alias, Err(RegistryError::DuplicateCommand(_))));

        let self_alias =
            registry.register(CommandSpec::new("ban").alias("ban"), handler("ban"));
        assert!(matches!(self_alias, Err(RegistryError::DuplicateCommand(_))));

        // A rejected registration leaves nothing behind.
        assert_eq!(registry.names(), vec!["whitelist"]);
        assert!(registry.resolve("walls").is_err());
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let mut registry = CommandRegistry::new();
        let result = registry.register(CommandSpec::new("  "), handler("blank"));
        assert!(matches!(result, Err(RegistryError::InvalidName(_))));
    }

    #[test]
    fn test_arity() {
        let spec = CommandSpec::new("whitelist").arity(1, 2);
        assert!(!spec.accepts(0));
        assert!(spec.accepts(1));
        assert!(spec.accepts(2));
        assert!(!spec.accepts(3));
    }
}
