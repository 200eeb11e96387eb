//! # Client Configuration
//!
//! Environment and YAML driven settings for the command client.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: YAML file loading alongside environment variables
//! - 1.0.0: Initial environment-based configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;

/// Runtime settings for the command client and demo bot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Bot token, only needed by the binary
    #[serde(default)]
    pub discord_token: String,

    /// Guild scope applied to commands that do not name one
    #[serde(default)]
    pub default_guild: Option<GuildId>,

    /// Guilds whose command sets are synchronized. Empty means "every guild seen at startup".
    #[serde(default)]
    pub command_guilds: Vec<GuildId>,

    /// Silence the warning for interactions with no local handler
    #[serde(default)]
    pub allow_unknown_interactions: bool,

    /// Run the remote diff during `init`
    #[serde(default = "default_true")]
    pub update_commands: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            default_guild: None,
            command_guilds: Vec::new(),
            allow_unknown_interactions: false,
            update_commands: true,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Build configuration from environment variables (after `.env` has been loaded)
    pub fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN").unwrap_or_default();

        let default_guild = match std::env::var("DEFAULT_GUILD") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_guild(&raw)?),
            _ => None,
        };

        let command_guilds = match std::env::var("COMMAND_GUILDS") {
            Ok(raw) => parse_guild_list(&raw)?,
            Err(_) => Vec::new(),
        };

        let allow_unknown_interactions = env_flag("ALLOW_UNKNOWN_INTERACTIONS", false);
        let update_commands = env_flag("UPDATE_COMMANDS", true);
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level());

        let config = Config {
            discord_token,
            default_guild,
            command_guilds,
            allow_unknown_interactions,
            update_commands,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

        // env_logger also accepts module filters such as "cmdgate=debug,warn"
        let base = self.log_level.rsplit(',').next().unwrap_or_default();
        let level = base.rsplit('=').next().unwrap_or_default();
        if !LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!("Invalid log level: {}", self.log_level));
        }

        if let Some(guild) = self.default_guild {
            if guild.0 == 0 {
                return Err(anyhow::anyhow!("DEFAULT_GUILD must be a non-zero snowflake"));
            }
        }
        Ok(())
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_guild(raw: &str) -> Result<GuildId> {
    raw.trim()
        .parse::<u64>()
        .map(GuildId)
        .map_err(|e| anyhow::anyhow!("Invalid guild id '{}': {}", raw.trim(), e))
}

fn parse_guild_list(raw: &str) -> Result<Vec<GuildId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_guild)
        .collect()
}
