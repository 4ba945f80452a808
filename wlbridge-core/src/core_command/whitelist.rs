//! The `whitelist` command (alias `wl`)

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::handler::{CommandContext, CommandError, CommandHandler};
use super::registry::CommandSpec;
use crate::core_audit::{AuditAction, AuditLog, AuditRecord};
use crate::core_membership::MembershipStore;
use crate::core_text::defaults as msg;
use crate::metrics::MetricsCollector;

pub const NAME: &str = "whitelist";
pub const ALIAS: &str = "wl";
pub const USAGE: &str = "whitelist <add|remove|list|help> [username]";

/// Add, remove and list whitelist entries from chat
pub struct WhitelistCommand {
    store: Arc<dyn MembershipStore>,
    audit: Arc<AuditLog>,
    metrics: Arc<MetricsCollector>,
}

impl WhitelistCommand {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        audit: Arc<AuditLog>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            audit,
            metrics,
        }
    }

    async fn add(&self, ctx: &CommandContext<'_>, username: &str) -> Result<String, CommandError> {
        let outcome = self.store.add(username).await?;
        if outcome.already_present {
            return Ok(ctx
                .text
                .resolve(msg::PLAYER_ALREADY_WHITELISTED, &[("player", username)]));
        }

        self.record(ctx, AuditAction::Add, username).await;
        Ok(ctx.text.resolve(msg::PLAYER_ADDED, &[("player", username)]))
    }

    async fn remove(
        &self,
        ctx: &CommandContext<'_>,
        username: &str,
    ) -> Result<String, CommandError> {
        let outcome = self.store.remove(username).await?;
        if !outcome.was_present {
            return Ok(ctx
                .text
                .resolve(msg::PLAYER_NOT_WHITELISTED, &[("player", username)]));
        }

        self.record(ctx, AuditAction::Remove, username).await;
        Ok(ctx.text.resolve(msg::PLAYER_REMOVED, &[("player", username)]))
    }

    async fn list(&self, ctx: &CommandContext<'_>) -> Result<String, CommandError> {
        let names: Vec<String> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter_map(|entry| entry.name)
            .collect();

        let list = if names.is_empty() {
            ctx.text.text(msg::NO_PLAYERS)
        } else {
            names.join(", ")
        };
        Ok(ctx.text.resolve(msg::WHITELIST_LIST, &[("list", list.as_str())]))
    }

    /// Audit a mutation that changed the store
    async fn record(&self, ctx: &CommandContext<'_>, action: AuditAction, username: &str) {
        self.metrics.inc_mutations();
        let record = AuditRecord::now(
            action,
            username,
            &ctx.sender.display_name,
            ctx.sender.id.as_str(),
        );
        debug!(channel = %ctx.channel, "{}", record);
        self.audit.append(&record).await;
    }
}

#[async_trait]
impl CommandHandler for WhitelistCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new(NAME)
            .alias(ALIAS)
            .usage(USAGE)
            .description("Manage server whitelist")
            .arity(1, 2)
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> Result<String, CommandError> {
        let Some((action, rest)) = ctx.args.split_first() else {
            return Err(CommandError::InvalidUsage);
        };

        match (action.to_lowercase().as_str(), rest) {
            ("add", [username]) => self.add(&ctx, username).await,
            ("remove", [username]) => self.remove(&ctx, username).await,
            ("list", []) => self.list(&ctx).await,
            ("help", []) => Ok(ctx.text.resolve(msg::HELP_MESSAGE, &[("prefix", ctx.prefix)])),
            _ => Err(CommandError::InvalidUsage),
        }
    }
}
