//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and service creation
//! so command handlers stay small.

use crate::error::CliError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use variantcache::config::{config_file_path, ConfigFile};
use variantcache::log::TracingLogger;
use variantcache::logging::{init_logging, LoggingGuard};
use variantcache::service::CacheService;

/// Resolve `--config`, falling back to the default location.
pub fn resolve_config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(config_file_path)
}

/// Load the config file at `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(path)?)
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the file writer flushing while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// File logging always goes to the configured log directory. `verbose`
    /// adds a stderr layer.
    pub fn new(config: Option<PathBuf>, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(&resolve_config_path(config))?;

        let logging_guard = init_logging(
            &config.logging.directory,
            &config.logging.file,
            verbose,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("variantcache v{}", variantcache::VERSION);
        info!(
            command,
            store = self.config.store.backend.as_str(),
            "variantcache CLI starting"
        );
    }

    /// Build the service from the loaded configuration.
    pub fn create_service(&self) -> Result<CacheService, CliError> {
        let service = CacheService::from_config(&self.config, Arc::new(TracingLogger))?;
        info!(variants = service.catalog().len(), "service created");
        Ok(service)
    }

    /// Write `data` to `path`.
    pub fn save_output(&self, path: &Path, data: &[u8]) -> Result<(), CliError> {
        std::fs::write(path, data).map_err(|e| CliError::OutputWrite {
            path: path.display().to_string(),
            error: e,
        })?;
        info!(path = %path.display(), bytes = data.len(), "output written");
        Ok(())
    }
}
