//! Built-in English templates, the last resort before "Message not found"

pub const NO_PERMISSION: &str = "discord.no_permission";
pub const PLAYER_ADDED: &str = "discord.player_added";
pub const PLAYER_ALREADY_WHITELISTED: &str = "discord.player_already_whitelisted";
pub const PLAYER_REMOVED: &str = "discord.player_removed";
pub const PLAYER_NOT_WHITELISTED: &str = "discord.player_not_whitelisted";
pub const WHITELIST_LIST: &str = "discord.whitelist_list";
pub const NO_PLAYERS: &str = "discord.no_players";
pub const HELP_MESSAGE: &str = "discord.help_message";
pub const INVALID_COMMAND: &str = "discord.invalid_command";
pub const COMMAND_ERROR: &str = "discord.command_error";

pub const GAME_COMMAND_USAGE: &str = "game.command_usage";
pub const GAME_UNKNOWN_SUBCOMMAND: &str = "game.unknown_subcommand";
pub const GAME_RELOAD_SUCCESS: &str = "game.reload_success";
pub const GAME_RELOAD_FAILED: &str = "game.reload_failed";
pub const GAME_BOT_STATUS: &str = "game.bot_status";

pub(crate) const TEMPLATES: &[(&str, &str)] = &[
    (NO_PERMISSION, "You don't have permission to use this command."),
    (PLAYER_ADDED, "{player} has been added to the whitelist."),
    (PLAYER_ALREADY_WHITELISTED, "{player} is already whitelisted."),
    (PLAYER_REMOVED, "{player} has been removed from the whitelist."),
    (PLAYER_NOT_WHITELISTED, "{player} is not whitelisted."),
    (WHITELIST_LIST, "Whitelisted players: {list}"),
    (NO_PLAYERS, "No players whitelisted"),
    (
        HELP_MESSAGE,
        "Whitelist commands:\n\
         {prefix}whitelist add <username> - add a player\n\
         {prefix}whitelist remove <username> - remove a player\n\
         {prefix}whitelist list - show whitelisted players\n\
         {prefix}whitelist help - show this message\n\
         ({prefix}wl works too)",
    ),
    (INVALID_COMMAND, "Invalid command. Usage: {prefix}{usage}"),
    (COMMAND_ERROR, "Something went wrong while running that command."),
    (GAME_COMMAND_USAGE, "Usage: /reload | /status | /help"),
    (GAME_UNKNOWN_SUBCOMMAND, "Unknown command. Try /help."),
    (GAME_RELOAD_SUCCESS, "Configuration reloaded."),
    (GAME_RELOAD_FAILED, "Reload failed, previous configuration kept: {error}"),
    (
        GAME_BOT_STATUS,
        "prefix={prefix} locale={locale} authorized={authorized} commands={commands} \
         whitelisted={whitelisted} audit={audit}",
    ),
];
