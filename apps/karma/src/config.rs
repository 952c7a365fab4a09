//! # Configuration
//!
//! Optional TOML file with three sections. Every key has a default, so an
//! empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [storage]
//! database = "karma.db"
//! backend = "redb"        # or "file"
//!
//! [chat]
//! command_prefix = "!"
//! command_word = "karma"
//! leaderboard_limit = 5
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! api_key = "..."         # unset: no authentication
//! rate_limit = 100        # requests per second, 0 disables
//! cors_origins = []       # empty: loopback origins only, "*" for any
//! ```
//!
//! Command-line flags override values read from the file. For the server,
//! `KARMA_API_KEY`, `KARMA_RATE_LIMIT` and `KARMA_CORS_ORIGINS` override the
//! `[server]` section.

use clap::ValueEnum;
use karma_core::KarmaError;
use karma_core::primitives::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum accepted size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// BACKEND
// =============================================================================

/// Where the ledger lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb database, every write is a transaction.
    #[default]
    Redb,
    /// Snapshot file, loaded into memory and rewritten after each change.
    File,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::File => f.write_str("file"),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub backend: Backend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("karma.db"),
            backend: Backend::Redb,
        }
    }
}

/// How commands are recognised in chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Prefix that turns a public line into a command (`!karma --top`).
    pub command_prefix: String,
    /// The command word itself.
    pub command_word: String,
    /// Number of lines in a `--top` / `--bottom` reply.
    pub leaderboard_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            command_word: "karma".to_string(),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

/// Default request budget for the HTTP API.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// HTTP listener and its guards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Key required on every endpoint but `/health`.
    pub api_key: Option<String>,
    /// Requests per second across all clients; 0 disables the limit.
    pub rate_limit: u32,
    /// Allowed browser origins.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: Vec::new(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("rate_limit", &self.rate_limit)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl ServerConfig {
    /// Overlay the `KARMA_*` server variables from the process environment.
    pub fn with_env(self) -> Result<Self, KarmaError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, KarmaError> {
        if let Some(key) = var("KARMA_API_KEY") {
            // An empty key switches authentication off.
            self.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Some(limit) = var("KARMA_RATE_LIMIT") {
            self.rate_limit = limit.trim().parse().map_err(|_| {
                KarmaError::ConfigError(format!("KARMA_RATE_LIMIT is not a number: {:?}", limit))
            })?;
        }
        if let Some(origins) = var("KARMA_CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(self)
    }
}

// =============================================================================
// KARMA CONFIG
// =============================================================================

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KarmaConfig {
    pub storage: StorageConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
}

impl KarmaConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, KarmaError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| KarmaError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, KarmaError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            KarmaError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(KarmaError::ConfigError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            KarmaError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, KarmaError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, database: Option<PathBuf>, backend: Option<Backend>) -> Self {
        if let Some(database) = database {
            self.storage.database = database;
        }
        if let Some(backend) = backend {
            self.storage.backend = backend;
        }
        self
    }

    fn validate(&self) -> Result<(), KarmaError> {
        if self.chat.command_word.trim().is_empty()
            || self.chat.command_word.chars().any(char::is_whitespace)
        {
            return Err(KarmaError::ConfigError(
                "chat.command_word must be a single non-empty word".to_string(),
            ));
        }
        if self.chat.leaderboard_limit == 0 || self.chat.leaderboard_limit > MAX_LEADERBOARD_LIMIT
        {
            return Err(KarmaError::ConfigError(format!(
                "chat.leaderboard_limit must be between 1 and {}",
                MAX_LEADERBOARD_LIMIT
            )));
        }
        if self
            .server
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            return Err(KarmaError::ConfigError(
                "server.api_key must not be empty; remove it to disable authentication"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
