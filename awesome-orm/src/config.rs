//! Connection pool configuration.
//!
//! Option names and defaults follow the classic aiomysql-style pool
//! settings (`host`, `port`, `user`, `password`, `db`, `charset`,
//! `autocommit`, `minsize`, `maxsize`). Configuration is usually read from
//! a TOML file:
//!
//! ```toml
//! user = "www-data"
//! password = "www-data"
//! db = "awesome"
//! maxsize = 10
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::{OrmError, Result};

/// Database backend behind the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mysql,
    Postgres,
    Sqlite,
}

impl Backend {
    /// Whether the driver uses numbered `$n` markers instead of `?`
    pub fn numbered_placeholders(self) -> bool {
        matches!(self, Backend::Postgres)
    }

    /// Identifier quote character understood by the driver
    pub fn identifier_quote(self) -> char {
        match self {
            Backend::Postgres => '"',
            Backend::Mysql | Backend::Sqlite => '`',
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_autocommit() -> bool {
    true
}

fn default_minsize() -> u32 {
    1
}

fn default_maxsize() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

/// Pool settings. `user`, `password` and `db` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub user: String,

    pub password: String,

    /// Database name, or the database file path for SQLite
    pub db: String,

    #[serde(default = "default_charset")]
    pub charset: String,

    /// Default transaction mode for statements issued through the pool
    #[serde(default = "default_autocommit")]
    pub autocommit: bool,

    #[serde(default = "default_minsize")]
    pub minsize: u32,

    #[serde(default = "default_maxsize")]
    pub maxsize: u32,

    /// How long `acquire` waits for a free connection before failing
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    /// Config with every optional setting at its default
    pub fn new(user: impl Into<String>, password: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            backend: Backend::default(),
            host: default_host(),
            port: default_port(),
            user: user.into(),
            password: password.into(),
            db: db.into(),
            charset: default_charset(),
            autocommit: default_autocommit(),
            minsize: default_minsize(),
            maxsize: default_maxsize(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    /// SQLite database file; credentials are unused
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            backend: Backend::Sqlite,
            ..Self::new("", "", path.as_ref().to_string_lossy())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| OrmError::config(format!("invalid pool config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.maxsize == 0 {
            return Err(OrmError::config("maxsize must be at least 1"));
        }
        if self.minsize > self.maxsize {
            return Err(OrmError::config(format!(
                "minsize ({}) exceeds maxsize ({})",
                self.minsize, self.maxsize
            )));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn mysql_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.db)
            .charset(&self.charset)
    }

    pub fn postgres_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.db)
    }

    /// `db` is the database file path; the file is created when missing
    pub fn sqlite_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.db)
            .create_if_missing(true)
    }
}
