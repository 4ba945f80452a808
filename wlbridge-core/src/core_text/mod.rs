//! Localized message templates
//!
//! Chat replies are never built inline; they are looked up by key and
//! rendered with `{placeholder}` substitution. Lookup order is the locale
//! file, then the `[messages]` table of the config, then the built-in English
//! templates. An unknown key renders `Message not found: <key>` so a typo in
//! a template file degrades a reply instead of failing a command.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod defaults;

/// Placeholder values for one rendering, as `(name, value)` pairs
pub type Placeholders<'a> = [(&'a str, &'a str)];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read locale file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse locale file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Resolves a message key and placeholders to display text
pub trait TextCatalog: Send + Sync {
    fn resolve(&self, key: &str, placeholders: &Placeholders<'_>) -> String;

    fn text(&self, key: &str) -> String {
        self.resolve(key, &[])
    }
}

/// Substitute every `{name}` occurrence literally, in one left-to-right pass
///
/// Inserted values are never scanned again; unknown `{...}` stays as written.
pub fn render(template: &str, placeholders: &Placeholders<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let substitution = tail.find('}').and_then(|close| {
            let name = &tail[..close];
            placeholders
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, value)| (*value, close + 1))
        });

        match substitution {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Catalog built from built-ins, config overrides and a locale file
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    locale: String,
    templates: HashMap<String, String>,
}

impl LocaleCatalog {
    /// Built-in English templates only
    pub fn builtin() -> Self {
        Self {
            locale: "en".to_string(),
            templates: defaults::TEMPLATES
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// Layer config messages and the configured locale file over the built-ins
    ///
    /// A missing locale file is not an error; a malformed one is, so a reload
    /// with a broken file keeps the previous catalog.
    pub fn load(config: &Config) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        catalog.locale = config.locale().to_string();

        let mut from_config = HashMap::new();
        flatten_into(&mut from_config, "", &config.messages);
        catalog.templates.extend(from_config);

        let path = config.storage.locale_path(config.locale());
        if path.exists() {
            let overrides = Self::read_locale_file(&path)?;
            debug!(
                "Loaded {} templates from {}",
                overrides.len(),
                path.display()
            );
            catalog.templates.extend(overrides);
        } else {
            warn!(
                "Locale file not found: {}. Using default messages.",
                path.display()
            );
        }

        Ok(catalog)
    }

    fn read_locale_file(path: &Path) -> Result<HashMap<String, String>, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let table: toml::Table = toml::from_str(&contents).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let root = match table.get("messages") {
            Some(toml::Value::Table(messages)) => messages,
            _ => &table,
        };

        let mut templates = HashMap::new();
        flatten_into(&mut templates, "", root);
        Ok(templates)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for LocaleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TextCatalog for LocaleCatalog {
    fn resolve(&self, key: &str, placeholders: &Placeholders<'_>) -> String {
        match self.templates.get(key) {
            Some(template) => render(template, placeholders),
            None => format!("Message not found: {}", key),
        }
    }
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: &str, table: &toml::Table) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::String(text) => {
                out.insert(path, text.clone());
            }
            toml::Value::Table(nested) => flatten_into(out, &path, nested),
            other => {
                debug!("Ignoring non-string template {} = {}", path, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = PathBuf::from(dir);
        config
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let out = render("{p} and {p} use {q}", &[("p", "!"), ("q", "wl")]);
        assert_eq!(out, "! and ! use wl");
    }

    #[test]
    fn test_render_does_not_rescan_inserted_values() {
        let out = render(
            "Usage: {prefix}{usage}",
            &[("prefix", "{usage}"), ("usage", "whitelist list")],
        );
        assert_eq!(out, "Usage: {usage}whitelist list");
    }

    #[test]
    fn test_render_leaves_unknown_braces() {
        assert_eq!(render("{a} {b} {", &[("a", "x")]), "x {b} {");
        assert_eq!(render("{{a}}", &[("a", "x")]), "{x}");
    }

    #[test]
    fn test_unknown_key_falls_back() {
        let catalog = LocaleCatalog::builtin();
        assert_eq!(
            catalog.text("discord.nope"),
            "Message not found: discord.nope"
        );
    }

    #[test]
    fn test_builtin_player_added() {
        let catalog = LocaleCatalog::builtin();
        assert_eq!(
            catalog.resolve(defaults::PLAYER_ADDED, &[("player", "Steve")]),
            "Steve has been added to the whitelist."
        );
    }

    #[test]
    fn test_missing_locale_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = LocaleCatalog::load(&config_in(dir.path())).unwrap();
        assert_eq!(catalog.locale(), "en");
        assert_eq!(catalog.text(defaults::NO_PLAYERS), "No players whitelisted");
    }

    #[test]
    fn test_layering_locale_over_config_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("locale_vi.toml"),
            r#"
            [messages.discord]
            player_added = "Da them {player}."
            "#,
        )
        .unwrap();

        let mut config = config_in(dir.path());
        config.locale = "vi".to_string();
        config.messages = toml::from_str(
            r#"
            [discord]
            player_added = "config {player}"
            no_permission = "Khong co quyen."
            "#,
        )
        .unwrap();

        let catalog = LocaleCatalog::load(&config).unwrap();
        assert_eq!(
            catalog.resolve(defaults::PLAYER_ADDED, &[("player", "Steve")]),
            "Da them Steve."
        );
        assert_eq!(catalog.text(defaults::NO_PERMISSION), "Khong co quyen.");
        assert_eq!(
            catalog.text(defaults::COMMAND_ERROR),
            "Something went wrong while running that command."
        );
    }

    #[test]
    fn test_malformed_locale_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("locale_en.toml"), "this is = = not toml").unwrap();

        let result = LocaleCatalog::load(&config_in(dir.path()));
        assert!(matches!(result, Err(CatalogError::Parse { .. })));
    }
}
