//! Default values and the `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::settings::*;
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::logging::{default_log_dir, DEFAULT_LOG_FILE};

pub const DEFAULT_ORIGIN_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT_SECS;
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT_SECS;
pub const DEFAULT_STORE_BACKEND: StoreBackendKind = StoreBackendKind::Disk;
pub const DEFAULT_COALESCE: bool = true;
pub const DEFAULT_KEY_LAYOUT: KeyLayout = KeyLayout::Directory;

/// Default disk store root: the platform cache directory plus `variantcache`.
pub fn default_store_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("variantcache")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            origin: OriginSettings {
                root_url: None,
                timeout: DEFAULT_ORIGIN_TIMEOUT_SECS,
            },
            store: StoreSettings {
                backend: DEFAULT_STORE_BACKEND,
                directory: default_store_directory(),
                endpoint: None,
                bucket: None,
                token: None,
                timeout: DEFAULT_STORE_TIMEOUT_SECS,
            },
            pipeline: PipelineSettings {
                coalesce: DEFAULT_COALESCE,
                key_layout: DEFAULT_KEY_LAYOUT,
            },
            logging: LoggingSettings {
                directory: default_log_dir(),
                file: DEFAULT_LOG_FILE.to_string(),
            },
            variants: Vec::new(),
        }
    }
}
