//! Small pure helpers shared by commands and the session manager

use std::time::Duration;

use crate::types::WorldTime;

/// Longest chat line the server accepts
pub const MAX_CHAT_LENGTH: usize = 256;

/// Strip control characters, trim, and cap the length of an outgoing chat line
#[must_use]
pub fn sanitize_chat_message(message: &str) -> String {
    let cleaned: String = message.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().chars().take(MAX_CHAT_LENGTH).collect()
}

/// Render a duration as `1d 2h 3m 4s`, omitting zero parts
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Render world ticks as a 24h clock
///
/// Tick 0 is 06:00; a day is 24000 ticks.
#[must_use]
pub fn format_world_clock(time_of_day: u64) -> String {
    let ticks = (time_of_day % 24_000 + 6_000) % 24_000;
    let hours = ticks / 1_000;
    let minutes = (ticks % 1_000) * 60 / 1_000;
    format!("{hours:02}:{minutes:02}")
}

/// Render the world time as `Day D, HH:MM`
#[must_use]
pub fn format_world_time(time: WorldTime) -> String {
    format!("Day {}, {}", time.day, format_world_clock(time.time_of_day))
}

/// Whether `name` is a valid account name: 3-16 of `[A-Za-z0-9_]`
#[must_use]
pub fn is_valid_username(name: &str) -> bool {
    (3..=16).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
