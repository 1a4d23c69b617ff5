//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use variantcache::config::ConfigFileError;
use variantcache::pipeline::{FailureClass, FillError};
use variantcache::service::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Config file already exists and --force was not given
    ConfigExists(PathBuf),
    /// Failed to create service
    ServiceCreation(ServiceError),
    /// A get request failed
    Fill(FillError),
    /// A flush request was rejected
    FlushRejected(String),
    /// Failed to write output
    OutputWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Process exit code.
    ///
    /// Get failures map their failure class onto distinct codes so scripts
    /// can tell a missing image from an outage.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Fill(e) => match e.class() {
                FailureClass::NotFound => 2,
                FailureClass::ClientError => 3,
                FailureClass::Unavailable => 4,
            },
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::MissingValue { .. }) => {
                eprintln!();
                eprintln!("Run 'variantcache init-config' to create a config file,");
                eprintln!("then set the missing value.");
            }
            CliError::ConfigExists(_) => {
                eprintln!("Use --force to overwrite it.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::ConfigExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
            CliError::ServiceCreation(e) => write!(f, "Failed to create service: {}", e),
            CliError::Fill(e) => write!(f, "Request failed (HTTP {}): {}", e.http_status(), e),
            CliError::FlushRejected(reason) => write!(f, "Flush rejected: {}", reason),
            CliError::OutputWrite { path, error } => {
                write!(f, "Failed to write '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Fill(e) => Some(e),
            CliError::OutputWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::ServiceCreation(e)
    }
}

impl From<FillError> for CliError {
    fn from(e: FillError) -> Self {
        CliError::Fill(e)
    }
}
