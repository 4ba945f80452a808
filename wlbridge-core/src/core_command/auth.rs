//! Who may run commands

use std::collections::HashMap;

use super::types::Identity;

/// Identity -> authorized flag, as loaded from configuration
pub type AuthorizationSet = HashMap<Identity, bool>;

/// Single-tier policy: configured identities may run every command
///
/// `command` is accepted so per-command scopes can be added without touching
/// the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    authorized: AuthorizationSet,
}

impl AuthorizationPolicy {
    pub fn new(authorized: AuthorizationSet) -> Self {
        Self { authorized }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Identity>,
    {
        Self::new(ids.into_iter().map(|id| (id.into(), true)).collect())
    }

    /// Presence as a key is what counts, not the flag
    pub fn is_authorized(&self, identity: &Identity, _command: &str) -> bool {
        self.authorized.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.authorized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorized.is_empty()
    }
}
