//! Configuration file (`~/.variantcache/config.ini`).
//!
//! ```
//! use variantcache::config::{ConfigFile, StoreBackendKind};
//!
//! let config = ConfigFile::from_ini_str(
//!     "[origin]\nroot_url = https://images.example.com\n[store]\nbackend = memory\n",
//! )
//! .unwrap();
//! assert_eq!(config.store.backend, StoreBackendKind::Memory);
//! assert!(config.catalog().unwrap().supports("thumbnail"));
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, KeyLayout, LoggingSettings, OriginSettings, PipelineSettings, StoreBackendKind,
    StoreSettings,
};
