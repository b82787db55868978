//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── http: ReqwestConfig             # Client timeout, user agent
//! ├── connectors: ConnectorSettings   # Per-call timeout, attempts
//! ├── profiles: Option<PathBuf>       # Tenant profiles (JSON array)
//! ├── log_format: LogFormat           # pretty | json
//! └── command: Command                # validate, test-connection, execute, status
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//!
//! ```bash
//! erlene --profiles profiles.json status --tenant 7
//! ERLENE_PROFILES=profiles.json HTTP_TIMEOUT=10 erlene status --tenant 7
//! ```

mod profiles;

use std::path::PathBuf;

use clap::Parser;
use erlene_connectors::ConnectorSettings;
use erlene_reqwest::ReqwestConfig;
pub use profiles::ProfilesFile;

use crate::TRACING_TARGET_CONFIG;
use crate::command::Command;
use crate::telemetry::LogFormat;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "erlene")]
#[command(about = "Validate, test and call third-party integrations")]
#[command(version)]
pub struct Cli {
    /// HTTP client configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// Call settings applied to every integration.
    #[clap(flatten)]
    pub connectors: ConnectorSettings,

    /// JSON file holding the tenant integration profiles
    #[arg(long, env = "ERLENE_PROFILES", global = true)]
    pub profiles: Option<PathBuf>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Returns the profiles file, if one was configured.
    pub fn profiles_file(&self) -> Option<ProfilesFile> {
        self.profiles.clone().map(ProfilesFile::new)
    }

    /// Logs the effective configuration at debug level.
    pub fn log_config(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            http_timeout_secs = self.http.effective_timeout().as_secs(),
            user_agent = %self.http.effective_user_agent(),
            integration_timeout_secs = ?self.connectors.timeout_secs,
            integration_max_attempts = ?self.connectors.max_attempts,
            profiles = ?self.profiles,
            "configuration loaded"
        );
    }
}
