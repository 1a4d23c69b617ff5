//! Settings structs, one per `[section]` of config.ini.

use crate::variant::VariantDefinition;
use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub origin: OriginSettings,
    pub store: StoreSettings,
    pub pipeline: PipelineSettings,
    pub logging: LoggingSettings,
    /// Variants from `[variant.<name>]` sections. Empty means the built-in table.
    pub variants: Vec<VariantDefinition>,
}

/// `[origin]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginSettings {
    /// Base URL of the upstream image source
    pub root_url: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
}

/// Store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackendKind {
    Memory,
    Disk,
    Http,
}

impl StoreBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackendKind::Memory => "memory",
            StoreBackendKind::Disk => "disk",
            StoreBackendKind::Http => "http",
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub backend: StoreBackendKind,
    /// Root directory for the disk backend
    pub directory: PathBuf,
    /// Object store base URL for the http backend
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    /// Bearer token for the http backend
    pub token: Option<String>,
    /// Request timeout in seconds for the http backend
    pub timeout: u64,
}

/// Storage key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    /// `<variant>/<shard1>/<shard2>/<filename>`
    Directory,
    /// `<variant>/<filename>`
    Flat,
}

/// `[pipeline]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Collapse concurrent misses on the same key into one fill
    pub coalesce: bool,
    pub key_layout: KeyLayout,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
