//! `variantcache init-config`

use std::path::PathBuf;
use variantcache::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Write the default configuration, refusing to clobber an existing file
/// unless `force` is set.
pub fn run(config: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = resolve_config_path(config);
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path));
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote {}", path.display());
    println!("Set [origin] root_url before running 'variantcache get'.");
    Ok(())
}
