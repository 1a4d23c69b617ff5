//! `variantcache variants`

use std::path::PathBuf;
use variantcache::variant::{ScaleMode, VariantCatalog, VariantDefinition};

use crate::error::CliError;
use crate::runner::{load_config, resolve_config_path};

/// Print the variant table.
pub fn run(config: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(&resolve_config_path(config))?;
    let catalog = config.catalog()?;
    print!("{}", format_table(&catalog));
    Ok(())
}

fn describe(def: &VariantDefinition) -> String {
    if def.is_canonical() {
        return "passthrough (canonical)".to_string();
    }
    let mode = match def.scale_mode() {
        ScaleMode::Crop => "crop".to_string(),
        ScaleMode::Fill => format!("fill {}", def.fill_color()),
        ScaleMode::Skew => "skew".to_string(),
    };
    format!(
        "{}x{} {} q{} {}",
        def.width(),
        def.height(),
        def.encoding(),
        def.quality(),
        mode
    )
}

fn format_table(catalog: &VariantCatalog) -> String {
    let width = catalog
        .all()
        .iter()
        .map(|d| d.name().len())
        .max()
        .unwrap_or(0);

    catalog
        .all()
        .iter()
        .map(|def| format!("{:<width$}  {}\n", def.name(), describe(def), width = width))
        .collect()
}
