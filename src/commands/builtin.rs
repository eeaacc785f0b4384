//! Built-in chat commands
//!
//! Each body is a thin query or action over the session link. Expected
//! conditions such as a missing player or no navigation support are
//! answered in chat; only unexpected errors propagate to the dispatcher.

use crate::error::{BotError, Result};
use crate::types::{NavigationGoal, PlayerName};
use crate::utils::{format_uptime, format_world_time};

use super::context::CommandContext;
use super::registry::{CommandRegistry, CommandSpec, handler};

/// Distance kept when following or approaching a player
pub const FOLLOW_RANGE: u32 = 2;

/// Replies the `ping` command picks from
pub const PING_REPLIES: [&str; 4] = ["Pong!", "I'm here!", "Bot is responsive!", "🏓 Pong!"];

// ============================================================================
// REGISTRATION
// ============================================================================

/// Register every built-in command, in help order
///
/// # Errors
/// Returns [`BotError::DuplicateCommand`] if any name is already taken
pub fn register_builtin_commands(registry: &mut CommandRegistry) -> Result<()> {
    let builtins = [
        CommandSpec::new("help", "Show available commands", "help [command]", handler(help)),
        CommandSpec::new("status", "Show bot status", "status", handler(status)),
        CommandSpec::new("time", "Show current server time", "time", handler(time)),
        CommandSpec::new("players", "List online players", "players", handler(players)),
        CommandSpec::new("ping", "Check bot responsiveness", "ping", handler(ping)),
        CommandSpec::new("follow", "Make bot follow a player", "follow [player]", handler(follow)),
        CommandSpec::new("stop", "Stop following", "stop", handler(stop)),
        CommandSpec::new("come", "Make bot come to you", "come", handler(come)),
        CommandSpec::new("say", "Make bot say something", "say <message>", handler(say)),
        CommandSpec::new("uptime", "Show session uptime", "uptime", handler(uptime)),
    ];
    for spec in builtins {
        registry.register(spec)?;
    }
    Ok(())
}

/// A registry holding only the built-in commands
///
/// # Errors
/// Never fails in practice; registration errors are propagated
pub fn builtin_registry() -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry)?;
    Ok(registry)
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn help(ctx: CommandContext) -> Result<()> {
    let Some(name) = ctx.arg(0) else {
        let names: Vec<&str> = ctx.registry.list().iter().map(|c| c.name.as_str()).collect();
        ctx.reply(format!("Available commands: {}", names.join(", ")))?;
        return ctx.reply(format!(
            "Use {}help <command> for specific command info.",
            ctx.prefix
        ));
    };

    match ctx.registry.lookup(name) {
        Ok(spec) => {
            ctx.reply(format!("{}: {}", spec.name, spec.description))?;
            ctx.reply(format!("Usage: {}{}", ctx.prefix, spec.usage))
        }
        Err(_) => ctx.reply(format!("Command not found: {}", name.to_lowercase())),
    }
}

async fn status(ctx: CommandContext) -> Result<()> {
    let vitals = ctx.link.vitals()?;
    let pos = vitals.position;
    ctx.reply(format!(
        "Status: Online | Health: {}/20 | Food: {}/20",
        vitals.health, vitals.food
    ))?;
    ctx.reply(format!(
        "Position: X:{} Y:{} Z:{}",
        pos.x.round(),
        pos.y.round(),
        pos.z.round()
    ))
}

async fn time(ctx: CommandContext) -> Result<()> {
    let time = ctx.link.world_time()?;
    ctx.reply(format_world_time(time))
}

async fn players(ctx: CommandContext) -> Result<()> {
    let players = ctx.link.online_players()?;
    if players.is_empty() {
        return ctx.reply("No players online.");
    }
    let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    ctx.reply(format!("Players online ({}): {}", names.len(), names.join(", ")))
}

async fn ping(ctx: CommandContext) -> Result<()> {
    let reply = ctx.rng.choose(&PING_REPLIES).copied().unwrap_or("Pong!");
    ctx.reply(reply)
}

async fn follow(ctx: CommandContext) -> Result<()> {
    let target = ctx.arg(0).unwrap_or_else(|| ctx.invoker.as_str()).to_string();

    let player = match ctx.link.find_player(&target) {
        Ok(player) => player,
        Err(BotError::PlayerNotFound(_)) => {
            return ctx.reply(format!("Player {target} not found."));
        }
        Err(e) => return Err(e),
    };

    let goal = NavigationGoal::Follow {
        player: player.name.clone(),
        range: FOLLOW_RANGE,
    };
    match ctx.link.move_to(goal) {
        Ok(()) => {
            log::info!("Bot started following {}", player.name);
            ctx.reply(format!("Following {}", player.name))
        }
        Err(BotError::NavigationUnavailable) => ctx.reply("Pathfinding not available."),
        Err(e) => Err(e),
    }
}

async fn stop(ctx: CommandContext) -> Result<()> {
    match ctx.link.stop_moving() {
        Ok(()) => {
            log::info!("Bot stopped following");
            ctx.reply("Stopped following.")
        }
        Err(BotError::NavigationUnavailable) => ctx.reply("Pathfinding not available."),
        Err(e) => Err(e),
    }
}

async fn come(ctx: CommandContext) -> Result<()> {
    let invoker: &PlayerName = &ctx.invoker;
    let position = match ctx.link.find_player(invoker.as_str()) {
        Ok(player) => player.position,
        Err(BotError::PlayerNotFound(_)) => None,
        Err(e) => return Err(e),
    };
    let Some(position) = position else {
        return ctx.reply(format!("Cannot find player {invoker}."));
    };

    match ctx.link.move_to(NavigationGoal::Near {
        position,
        range: FOLLOW_RANGE,
    }) {
        Ok(()) => {
            log::info!("Bot moving to {invoker}'s position");
            ctx.reply(format!("Coming to {invoker}!"))
        }
        Err(BotError::NavigationUnavailable) => ctx.reply("Pathfinding not available."),
        Err(e) => Err(e),
    }
}

async fn say(ctx: CommandContext) -> Result<()> {
    if ctx.args.is_empty() {
        return ctx.reply(format!("Usage: {}say <message>", ctx.prefix));
    }
    let message = ctx.args.join(" ");
    log::info!("Bot said (requested by {}): {message}", ctx.invoker);
    ctx.reply(message)
}

async fn uptime(ctx: CommandContext) -> Result<()> {
    ctx.reply(format!("Uptime: {}", format_uptime(ctx.uptime())))
}
