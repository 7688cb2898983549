//! Run settings.
//!
//! Sources, in increasing precedence:
//! 1. built-in defaults ([`Settings::default`])
//! 2. a TOML file (`casewatch.toml` if present, or an explicit path)
//! 3. environment variables `CASEWATCH__<KEY>`, nested with `__`
//!    (e.g. `CASEWATCH__HTTP__MAX_RETRIES=5`)
//!
//! Command-line flags are applied on top by the binary, followed by
//! [`Settings::validate`].

use casewatch_core::errors::{ExError, ExErrorKind};
use casewatch_core::logging_facility::Profile;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "casewatch.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CASEWATCH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub state_path: PathBuf,
    pub event_log_path: PathBuf,
    pub records_path: PathBuf,
    /// Maximum records processed at once
    pub concurrency: usize,
    pub log_profile: String,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `backoff_ms * 2^n`
    pub backoff_ms: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(".casewatch/state.json"),
            event_log_path: PathBuf::from(".casewatch/changes.json"),
            records_path: PathBuf::from("records.txt"),
            concurrency: 4,
            log_profile: "development".to_string(),
            http: HttpSettings::default(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_ms: 500,
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
            )
            .to_string(),
            accept_language: "ru-RU,ru;q=0.9,en;q=0.8".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// An explicit `config_file` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Config` when a source cannot be read, a value has
    /// the wrong type, or validation fails.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ExError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default()).map_err(config_error)?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns `ExErrorKind::Config` naming the first invalid key.
    pub fn validate(&self) -> Result<(), ExError> {
        if self.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs", "must be at least 1"));
        }
        self.profile()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ExErrorKind::Config` for an unknown profile name.
    pub fn profile(&self) -> Result<Profile, ExError> {
        self.log_profile
            .parse::<Profile>()
            .map_err(|e| invalid("log_profile", &e))
    }
}

fn config_error(err: config::ConfigError) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_settings")
        .with_message(err.to_string())
}

fn invalid(key: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("validate_settings")
        .with_message(format!("{}: {}", key, reason))
}
