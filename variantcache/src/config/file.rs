//! Loading and saving ~/.variantcache/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], parsing in [`super::parser`] and serialization in
//! [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::settings::*;
use crate::store::StoreConfig;
use crate::variant::{CatalogError, VariantCatalog};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// A required key is absent
    #[error("Missing configuration: {section}.{key} - {reason}")]
    MissingValue {
        section: String,
        key: String,
        reason: String,
    },

    /// The configured variant table is inconsistent
    #[error("Invalid variant table: {0}")]
    InvalidVariants(#[from] CatalogError),

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load from the default path. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration held in a string.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        super::parser::parse_ini(&ini)
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write a commented config file to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Build the variant catalog: the configured variants, or the built-in
    /// table when none are configured.
    pub fn catalog(&self) -> Result<VariantCatalog, ConfigFileError> {
        if self.variants.is_empty() {
            return Ok(VariantCatalog::builtin());
        }
        Ok(VariantCatalog::new(self.variants.clone())?)
    }

    /// Store selection for [`crate::store::StoreBackend::from_config`].
    pub fn store_config(&self) -> Result<StoreConfig, ConfigFileError> {
        let store = &self.store;
        Ok(match store.backend {
            StoreBackendKind::Memory => StoreConfig::Memory,
            StoreBackendKind::Disk => StoreConfig::Disk {
                directory: store.directory.clone(),
            },
            StoreBackendKind::Http => StoreConfig::Http {
                endpoint: required(&store.endpoint, "store", "endpoint", "needed by backend = http")?,
                bucket: required(&store.bucket, "store", "bucket", "needed by backend = http")?,
                token: store.token.clone(),
                timeout: Duration::from_secs(store.timeout),
            },
        })
    }

    /// Origin root URL.
    pub fn origin_root_url(&self) -> Result<String, ConfigFileError> {
        required(
            &self.origin.root_url,
            "origin",
            "root_url",
            "base URL of the upstream image source",
        )
    }
}

fn required(
    value: &Option<String>,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<String, ConfigFileError> {
    value.clone().ok_or_else(|| ConfigFileError::MissingValue {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

/// Config directory (~/.variantcache).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".variantcache")
}

/// Config file path (~/.variantcache/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
