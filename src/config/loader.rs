//! Configuration File Loading
//!
//! Finds the configuration file in the usual locations, parses it as TOML
//! or JSON depending on the extension, validates it, and saves it back.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "ECHOFLOW_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format implied by the file extension; TOML unless it is `.json`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    /// Explicit file from the environment; wins over the search paths
    explicit: Option<PathBuf>,
    /// Candidate files without extension, tried as `.toml` then `.json`
    search_paths: Vec<PathBuf>,
    /// File the configuration was loaded from, if any
    current_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            explicit: env::var_os(CONFIG_ENV).map(PathBuf::from),
            search_paths: Self::default_search_paths(),
            current_path: None,
        }
    }

    /// Loader that only looks at `paths` and ignores the environment
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            explicit: None,
            search_paths: paths,
            current_path: None,
        }
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Config> {
        Self::new().load_config()
    }

    /// Load from the first candidate that exists, or fall back to defaults
    pub fn load_config(&mut self) -> Result<Config> {
        if let Some(path) = self.explicit.clone() {
            return self.load_from_path(&path);
        }

        for base in &self.search_paths {
            for format in [ConfigFormat::Toml, ConfigFormat::Json] {
                let path = base.with_extension(format.extension());
                if !path.exists() {
                    continue;
                }
                match Self::read_file(&path, format) {
                    Ok(config) => {
                        Self::validate_config(&config)?;
                        debug!("Loaded configuration from {}", path.display());
                        self.current_path = Some(path);
                        return Ok(config);
                    }
                    Err(e) => {
                        // Keep searching; a broken file should not hide the others
                        warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        debug!("No configuration file found, using defaults");
        let config = Config::default();
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load a specific file; it must exist
    pub fn load_from_path(&mut self, path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        let config = Self::read_file(path, ConfigFormat::from_path(path))?;
        Self::validate_config(&config)?;
        self.current_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save to the file the configuration came from, or the default location
    pub fn save(&self, config: &Config) -> Result<PathBuf> {
        let path = self
            .current_path
            .clone()
            .unwrap_or_else(Self::default_config_path);
        Self::save_to_path(config, &path)?;
        Ok(path)
    }

    /// Save to `path` in the format its extension implies
    pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| {
                    Error::ConfigSerializationFailed {
                        format: "JSON".to_string(),
                        reason: e.to_string(),
                    }
                })?
            }
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    fn read_file(path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parsed = match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason,
        })
    }

    /// Candidate locations in priority order
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("echoflow").join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("echoflow").join("config"));
            paths.push(home.join(".echoflow").join("config"));
        }

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join("echoflow"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("echoflow")
            .join("config.toml")
    }

    /// Check values the engine cannot work with
    pub fn validate_config(config: &Config) -> Result<()> {
        let timing = &config.timing;
        let bounds = [
            ("timing.ack_timeout_ms", timing.ack_timeout_ms),
            ("timing.probe_timeout_ms", timing.probe_timeout_ms),
            ("timing.quiescence_ms", timing.quiescence_ms),
            ("timing.settle_limit_ms", timing.settle_limit_ms),
            ("timing.echo_phase_timeout_ms", timing.echo_phase_timeout_ms),
            ("timing.command_timeout_ms", timing.command_timeout_ms),
            ("timing.connect_timeout_ms", timing.connect_timeout_ms),
            ("timing.disconnect_poll_ms", timing.disconnect_poll_ms),
            ("timing.disconnect_timeout_ms", timing.disconnect_timeout_ms),
        ];
        for (field, value) in bounds {
            if value == 0 {
                return Err(Error::ConfigValidationFailed {
                    field: field.to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                });
            }
        }

        if timing.command_timeout_ms > 3_600_000 {
            return Err(Error::ConfigValidationFailed {
                field: "timing.command_timeout_ms".to_string(),
                reason: "Command timeout cannot exceed 1 hour".to_string(),
            });
        }

        if config.connection.program.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "connection.program".to_string(),
                reason: "Connect program cannot be empty".to_string(),
            });
        }

        if config.connection.rows == 0 || config.connection.cols == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "connection.rows".to_string(),
                reason: "Terminal size must be at least 1x1".to_string(),
            });
        }

        if config.transfer.terminator.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "transfer.terminator".to_string(),
                reason: "Line terminator cannot be empty".to_string(),
            });
        }

        if let Some(pattern) = &config.transfer.ack_pattern {
            if pattern.is_empty() {
                return Err(Error::ConfigValidationFailed {
                    field: "transfer.ack_pattern".to_string(),
                    reason: "Acknowledgment pattern cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
