//! Command-line configuration shared by every subcommand.

mod duration;

pub use duration::parse_duration;

use chrono_tz::Tz;
use clap::Parser;
use std::time::Duration;
use store_client::{ClientConfig, MySqlConnector, MySqlOpts, Quoting, StoreClient};
use thiserror::Error;

/// Configuration problems, reported before any store or stream is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("--{0} is required")]
    Missing(&'static str),

    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("unknown time zone '{0}'")]
    InvalidTimeZone(String),
}

/// Connection settings for the source and target stores.
#[derive(Parser, Clone, Debug)]
pub struct StoreArgs {
    /// Host running both stores
    #[arg(long, default_value = "127.0.0.1", env = "REPLAY_HOST")]
    pub host: String,

    /// User for both stores
    #[arg(long, default_value = "root", env = "REPLAY_USER")]
    pub user: String,

    /// Password for both stores
    #[arg(long, default_value = "", env = "REPLAY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Port of the source (MySQL) store
    #[arg(long, default_value_t = 3307, env = "REPLAY_SOURCE_PORT")]
    pub source_port: u16,

    /// Port of the target store
    #[arg(long, default_value_t = 3306, env = "REPLAY_TARGET_PORT")]
    pub target_port: u16,

    /// Database to replicate
    #[arg(long, env = "REPLAY_DATABASE")]
    pub database: Option<String>,

    /// Time zone for timestamp values (IANA name, e.g. "Asia/Tokyo")
    #[arg(long, default_value = "UTC", env = "REPLAY_TIME_ZONE")]
    pub time_zone: String,

    /// Reconnect before use after this much idle time (e.g. "7h", "30m")
    #[arg(long, default_value = "7h", env = "REPLAY_IDLE_TIMEOUT")]
    pub idle_timeout: String,

    /// Quote strings as `'it''s'`, for stores in NO_BACKSLASH_ESCAPES mode
    #[arg(long, env = "REPLAY_NO_BACKSLASH_ESCAPES")]
    pub no_backslash_escapes: bool,

    /// Log every statement sent to a store
    #[arg(long)]
    pub log_queries: bool,
}

impl StoreArgs {
    pub fn database(&self) -> Result<&str, ConfigError> {
        self.database
            .as_deref()
            .filter(|db| !db.is_empty())
            .ok_or(ConfigError::Missing("database"))
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_time_zone(&self.time_zone)
    }

    pub fn idle_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.idle_timeout)
    }

    /// Client settings with `database` selected on every session.
    pub fn client_config(&self, database: Option<&str>) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig {
            idle_timeout: self.idle_timeout()?,
            time_zone: self.tz()?,
            database: database.map(str::to_string),
            quoting: quoting(self.no_backslash_escapes),
            log_queries: self.log_queries,
            ..Default::default()
        })
    }

    pub fn source_opts(&self) -> MySqlOpts {
        self.opts(self.source_port)
    }

    pub fn target_opts(&self) -> MySqlOpts {
        self.opts(self.target_port)
    }

    /// Client for the source store, on `database` when given.
    pub fn source_client(
        &self,
        database: Option<&str>,
    ) -> Result<StoreClient<MySqlConnector>, ConfigError> {
        self.client(self.source_opts(), database)
    }

    /// Client for the target store, on `database` when given.
    pub fn target_client(
        &self,
        database: Option<&str>,
    ) -> Result<StoreClient<MySqlConnector>, ConfigError> {
        self.client(self.target_opts(), database)
    }

    fn client(
        &self,
        opts: MySqlOpts,
        database: Option<&str>,
    ) -> Result<StoreClient<MySqlConnector>, ConfigError> {
        let config = self.client_config(database)?;
        let connector = MySqlConnector::new(opts, config.time_zone);
        Ok(StoreClient::new(connector, config))
    }

    fn opts(&self, port: u16) -> MySqlOpts {
        MySqlOpts {
            host: self.host.clone(),
            port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

/// String literal style for the `--no-backslash-escapes` flag.
pub fn quoting(no_backslash_escapes: bool) -> Quoting {
    if no_backslash_escapes {
        Quoting::NoBackslashEscapes
    } else {
        Quoting::Backslash
    }
}

/// Parse an IANA time zone name; "UTC" is accepted in any case.
pub fn parse_time_zone(name: &str) -> Result<Tz, ConfigError> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("utc") {
        return Ok(Tz::UTC);
    }
    name.parse()
        .map_err(|_| ConfigError::InvalidTimeZone(name.to_string()))
}
