//! Bot configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file
//! (`--config`), then command-line flags or their environment variables.
//! Durations are given in milliseconds everywhere.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::protocol::bridge::DEFAULT_BRIDGE_ADDR;
use crate::protocol::{AuthMode, ConnectParams};
use crate::scheduler::SchedulerConfig;
use crate::session::{ChatterConfig, ManagerConfig, RetryPolicy};
use crate::utils::is_valid_username;

// ============================================================================
// FILE / DEFAULT LAYER
// ============================================================================

/// Fully resolved configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Game server host
    pub server_host: String,
    /// Game server port
    pub server_port: u16,
    /// Bot account name
    pub username: String,
    /// Account password for premium authentication
    pub password: Option<String>,
    /// Authentication mode
    pub auth: AuthMode,
    /// Protocol version; auto-detected when unset
    pub version: Option<String>,
    /// Chat command prefix
    pub command_prefix: String,
    /// Sent after spawning; empty disables it
    pub join_message: String,
    /// Greet joining players
    pub welcome_messages: bool,
    /// `env_logger` filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Whether the anti-idle task runs
    pub anti_idle_enabled: bool,
    /// Idle time before an anti-idle action, ms
    pub idle_timeout_ms: u64,
    /// Anti-idle tick, ms
    pub anti_idle_interval_ms: u64,
    /// Health report tick, ms
    pub health_report_interval_ms: u64,
    /// Reconnect budget
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay, ms
    pub reconnect_delay_ms: u64,
    /// Login timeout per attempt, ms
    pub login_timeout_ms: u64,
    /// Address of the protocol bridge
    pub bridge_addr: String,
    /// Seed for reproducible random choices
    pub rng_seed: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            server_host: "localhost".to_string(),
            server_port: 25565,
            username: "MinecraftBot".to_string(),
            password: None,
            auth: AuthMode::Offline,
            version: None,
            command_prefix: "!".to_string(),
            join_message: "Bot connected! Type !help for commands.".to_string(),
            welcome_messages: true,
            log_level: "info".to_string(),
            anti_idle_enabled: true,
            idle_timeout_ms: 300_000,
            anti_idle_interval_ms: 60_000,
            health_report_interval_ms: 1_800_000,
            max_reconnect_attempts: 10,
            reconnect_delay_ms: 5_000,
            login_timeout_ms: 30_000,
            bridge_addr: DEFAULT_BRIDGE_ADDR.to_string(),
            rng_seed: None,
        }
    }
}

impl BotConfig {
    /// Read a TOML file; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolve the full configuration from parsed arguments
    ///
    /// # Errors
    /// Returns error if the config file is unreadable or the result is invalid
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cli.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot run with
    ///
    /// # Errors
    /// Returns [`BotError::InvalidConfig`] naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.server_host.trim().is_empty() {
            return Err(BotError::invalid_config("server_host must not be empty"));
        }
        if self.server_port == 0 {
            return Err(BotError::invalid_config("server_port must not be 0"));
        }
        if !is_valid_username(&self.username) {
            return Err(BotError::invalid_config(format!(
                "username '{}' must be 3-16 letters, digits or underscores",
                self.username
            )));
        }
        if self.command_prefix.is_empty() {
            return Err(BotError::invalid_config("command_prefix must not be empty"));
        }
        if self.command_prefix.chars().any(char::is_whitespace) {
            return Err(BotError::invalid_config(
                "command_prefix must not contain whitespace",
            ));
        }
        if self.bridge_addr.trim().is_empty() {
            return Err(BotError::invalid_config("bridge_addr must not be empty"));
        }
        for (name, value) in [
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("idle_timeout_ms", self.idle_timeout_ms),
            ("anti_idle_interval_ms", self.anti_idle_interval_ms),
            ("health_report_interval_ms", self.health_report_interval_ms),
            ("login_timeout_ms", self.login_timeout_ms),
        ] {
            if value == 0 {
                return Err(BotError::invalid_config(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }

    /// Reconnect budget and backoff
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_reconnect_attempts,
            Duration::from_millis(self.reconnect_delay_ms),
        )
    }

    /// Idle scheduler timings
    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            anti_idle_enabled: self.anti_idle_enabled,
            idle_threshold: Duration::from_millis(self.idle_timeout_ms),
            anti_idle_interval: Duration::from_millis(self.anti_idle_interval_ms),
            health_interval: Duration::from_millis(self.health_report_interval_ms),
        }
    }

    /// Parameters for each connect attempt
    #[must_use]
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            host: self.server_host.clone(),
            port: self.server_port,
            username: self.username.clone(),
            password: self.password.clone().filter(|p| !p.is_empty()),
            auth: self.auth,
            version: self.version.clone().filter(|v| !v.is_empty()),
        }
    }

    /// Everything the session manager needs
    #[must_use]
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            connect: self.connect_params(),
            retry: self.retry_policy(),
            login_timeout: Duration::from_millis(self.login_timeout_ms),
            scheduler: self.scheduler_config(),
            command_prefix: self.command_prefix.clone(),
            chatter: ChatterConfig {
                join_message: Some(self.join_message.clone()).filter(|m| !m.is_empty()),
                welcome_messages: self.welcome_messages,
            },
            rng_seed: self.rng_seed,
        }
    }

    /// One-line description safe to log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "server={}:{} username={} auth={} version={} prefix={:?} bridge={} \
             anti_idle={} max_reconnect_attempts={} reconnect_delay={}ms password={}",
            self.server_host,
            self.server_port,
            self.username,
            self.auth.as_str(),
            self.version.as_deref().unwrap_or("auto"),
            self.command_prefix,
            self.bridge_addr,
            self.anti_idle_enabled,
            self.max_reconnect_attempts,
            self.reconnect_delay_ms,
            if self.password.is_some() { "[REDACTED]" } else { "none" },
        )
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

// ============================================================================
// COMMAND LINE / ENVIRONMENT LAYER
// ============================================================================

/// Command-line arguments; every option can also come from the environment
#[derive(Debug, Default, Parser)]
#[command(name = "tether", version, about = "Persistent game-server chat client")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "BOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Game server host
    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,

    /// Game server port
    #[arg(long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Bot account name
    #[arg(long, env = "BOT_USERNAME")]
    pub username: Option<String>,

    /// Account password
    #[arg(long, env = "BOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Authentication mode
    #[arg(long, env = "AUTH_TYPE", value_enum)]
    pub auth: Option<AuthMode>,

    /// Protocol version
    #[arg(long, env = "MC_VERSION")]
    pub mc_version: Option<String>,

    /// Chat command prefix
    #[arg(long, env = "COMMAND_PREFIX")]
    pub prefix: Option<String>,

    /// Message sent after spawning; empty disables it
    #[arg(long, env = "JOIN_MESSAGE")]
    pub join_message: Option<String>,

    /// Greet joining players
    #[arg(long, env = "WELCOME_MESSAGES")]
    pub welcome_messages: Option<bool>,

    /// Log filter
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable the anti-idle task
    #[arg(long, env = "ANTI_IDLE_ENABLED")]
    pub anti_idle: Option<bool>,

    /// Idle time before an anti-idle action, ms
    #[arg(long, env = "IDLE_TIMEOUT")]
    pub idle_timeout: Option<u64>,

    /// Anti-idle tick, ms
    #[arg(long, env = "ANTI_IDLE_INTERVAL")]
    pub anti_idle_interval: Option<u64>,

    /// Health report tick, ms
    #[arg(long, env = "HEALTH_REPORT_INTERVAL")]
    pub health_report_interval: Option<u64>,

    /// Reconnect budget
    #[arg(long, env = "MAX_RECONNECT_ATTEMPTS")]
    pub max_reconnect_attempts: Option<u32>,

    /// Base reconnect delay, ms
    #[arg(long, env = "RECONNECT_DELAY")]
    pub reconnect_delay: Option<u64>,

    /// Login timeout per attempt, ms
    #[arg(long, env = "LOGIN_TIMEOUT")]
    pub login_timeout: Option<u64>,

    /// Protocol bridge address
    #[arg(long, env = "BRIDGE_ADDR")]
    pub bridge_addr: Option<String>,

    /// Seed for reproducible random choices
    #[arg(long, env = "RNG_SEED")]
    pub rng_seed: Option<u64>,
}

impl Cli {
    /// Overwrite every field of `config` that was given here
    pub fn apply(&self, config: &mut BotConfig) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut config.server_host, self.host.as_ref());
        set(&mut config.server_port, self.port.as_ref());
        set(&mut config.username, self.username.as_ref());
        set(&mut config.auth, self.auth.as_ref());
        set(&mut config.command_prefix, self.prefix.as_ref());
        set(&mut config.join_message, self.join_message.as_ref());
        set(&mut config.welcome_messages, self.welcome_messages.as_ref());
        set(&mut config.log_level, self.log_level.as_ref());
        set(&mut config.anti_idle_enabled, self.anti_idle.as_ref());
        set(&mut config.idle_timeout_ms, self.idle_timeout.as_ref());
        set(&mut config.anti_idle_interval_ms, self.anti_idle_interval.as_ref());
        set(&mut config.health_report_interval_ms, self.health_report_interval.as_ref());
        set(&mut config.max_reconnect_attempts, self.max_reconnect_attempts.as_ref());
        set(&mut config.reconnect_delay_ms, self.reconnect_delay.as_ref());
        set(&mut config.login_timeout_ms, self.login_timeout.as_ref());
        set(&mut config.bridge_addr, self.bridge_addr.as_ref());

        if self.password.is_some() {
            config.password.clone_from(&self.password);
        }
        if self.mc_version.is_some() {
            config.version.clone_from(&self.mc_version);
        }
        if self.rng_seed.is_some() {
            config.rng_seed = self.rng_seed;
        }
    }
}
