//! Configuration system for the `MazeBridge` relay.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/mazebridge/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{BackendConfig, MAX_RESPONSE_SIZE_LIMIT, ReadMode};
use crate::server::FailureStatus;

/// Errors that can occur when loading relay configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A setting was present but has an unusable value.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        /// Name of the offending setting.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the relay.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RelayConfigFile {
    server: ServerFileConfig,
    backend: BackendFileConfig,
}

/// `[server]` section of the relay config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    failure_status: Option<FailureStatus>,
}

/// `[backend]` section of the relay config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BackendFileConfig {
    addr: Option<String>,
    timeout_ms: Option<u64>,
    read_mode: Option<ReadMode>,
    max_response_size: Option<usize>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the relay.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "MazeBridge HTTP relay for the maze game server")]
pub struct RelayCliArgs {
    /// Address the HTTP server binds to.
    #[arg(short, long, env = "MAZEBRIDGE_BIND")]
    pub bind: Option<String>,

    /// Game server address (`host:port`).
    #[arg(long, env = "MAZEBRIDGE_BACKEND")]
    pub backend: Option<String>,

    /// Path to config file (default: `~/.config/mazebridge/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Upper bound in milliseconds for one relay call (connect, write, read).
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// How the game server's reply is read.
    #[arg(long, value_enum)]
    pub read_mode: Option<ReadMode>,

    /// Maximum reply size in bytes.
    #[arg(long)]
    pub max_response_size: Option<usize>,

    /// HTTP status used when the game server cannot be reached.
    #[arg(long, value_enum)]
    pub failure_status: Option<FailureStatus>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "MAZEBRIDGE_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind the HTTP server to (e.g., `0.0.0.0:3000`).
    pub bind_addr: String,
    /// Game server address (e.g., `localhost:12345`).
    pub backend_addr: String,
    /// Upper bound for a whole relay call.
    pub backend_timeout: Duration,
    /// How the game server's reply is read.
    pub read_mode: ReadMode,
    /// Maximum reply size in bytes.
    pub max_response_size: usize,
    /// HTTP status used when a relay call fails.
    pub failure_status: FailureStatus,
    /// Log level filter string.
    pub log_level: String,
    /// Log file path; logs go to stderr when `None`.
    pub log_file: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let backend = BackendConfig::default();
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            backend_addr: backend.addr,
            backend_timeout: backend.timeout,
            read_mode: backend.read_mode,
            max_response_size: backend.max_response_size,
            failure_status: FailureStatus::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl RelayConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a resolved value is unusable.
    pub fn load(cli: &RelayCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        config.validate()?;
        Ok(config)
    }

    /// Resolve a `RelayConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &RelayCliArgs, file: &RelayConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            backend_addr: cli
                .backend
                .clone()
                .or_else(|| file.backend.addr.clone())
                .unwrap_or(defaults.backend_addr),
            backend_timeout: cli
                .timeout_ms
                .or(file.backend.timeout_ms)
                .map_or(defaults.backend_timeout, Duration::from_millis),
            read_mode: cli
                .read_mode
                .or(file.backend.read_mode)
                .unwrap_or(defaults.read_mode),
            max_response_size: cli
                .max_response_size
                .or(file.backend.max_response_size)
                .unwrap_or(defaults.max_response_size),
            failure_status: cli
                .failure_status
                .or(file.server.failure_status)
                .unwrap_or(defaults.failure_status),
            log_level: cli.log_level.clone(),
            log_file: cli.log_file.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_response_size == 0 || self.max_response_size > MAX_RESPONSE_SIZE_LIMIT {
            return Err(ConfigError::Invalid {
                key: "max_response_size",
                reason: format!("must be between 1 and {MAX_RESPONSE_SIZE_LIMIT} bytes"),
            });
        }
        if self.backend_addr.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "backend",
                reason: "address is empty".to_string(),
            });
        }
        if let Some(path) = &self.log_file
            && path.file_name().is_none()
        {
            return Err(ConfigError::Invalid {
                key: "log_file",
                reason: format!("{} does not name a file", path.display()),
            });
        }
        Ok(())
    }

    /// Settings handed to the [`crate::backend::BackendClient`].
    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            addr: self.backend_addr.clone(),
            timeout: self.backend_timeout,
            read_mode: self.read_mode,
            max_response_size: self.max_response_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the relay.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<RelayConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(RelayConfigFile::default());
        };
        config_dir.join("mazebridge").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RelayConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
