//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::{ConfigFile, KeyLayout, StoreBackendKind};
use crate::variant::{FillColor, OutputEncoding, ScaleMode, VariantDefinition};

/// Prefix of per-variant sections, e.g. `[variant.thumbnail]`.
pub(super) const VARIANT_SECTION_PREFIX: &str = "variant.";

/// Parse an `Ini` into a `ConfigFile`, starting from the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [origin]
    if let Some(section) = ini.section(Some("origin")) {
        config.origin.root_url = optional_string(section, "root_url");
        if let Some(v) = section.get("timeout") {
            config.origin.timeout = parse_seconds("origin", "timeout", v)?;
        }
    }

    // [store]
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("backend") {
            config.store.backend = match v.trim().to_lowercase().as_str() {
                "memory" => StoreBackendKind::Memory,
                "disk" => StoreBackendKind::Disk,
                "http" => StoreBackendKind::Http,
                _ => {
                    return Err(invalid("store", "backend", v, "must be one of: memory, disk, http"));
                }
            };
        }
        if let Some(v) = optional_string(section, "directory") {
            config.store.directory = expand_tilde(&v);
        }
        config.store.endpoint = optional_string(section, "endpoint");
        config.store.bucket = optional_string(section, "bucket");
        config.store.token = optional_string(section, "token");
        if let Some(v) = section.get("timeout") {
            config.store.timeout = parse_seconds("store", "timeout", v)?;
        }
    }

    // [pipeline]
    if let Some(section) = ini.section(Some("pipeline")) {
        if let Some(v) = section.get("coalesce") {
            config.pipeline.coalesce = parse_bool(v)
                .ok_or_else(|| invalid("pipeline", "coalesce", v, "must be true or false"))?;
        }
        if let Some(v) = section.get("key_layout") {
            config.pipeline.key_layout = match v.trim().to_lowercase().as_str() {
                "directory" => KeyLayout::Directory,
                "flat" => KeyLayout::Flat,
                _ => return Err(invalid("pipeline", "key_layout", v, "must be 'directory' or 'flat'")),
            };
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = optional_string(section, "directory") {
            config.logging.directory = expand_tilde(&v);
        }
        if let Some(v) = optional_string(section, "file") {
            config.logging.file = v;
        }
    }

    // [variant.<name>]
    for (name, section) in ini.iter() {
        let Some(variant) = name.and_then(|n| n.strip_prefix(VARIANT_SECTION_PREFIX)) else {
            continue;
        };
        config.variants.push(parse_variant(variant, section)?);
    }

    Ok(config)
}

fn parse_variant(name: &str, section: &Properties) -> Result<VariantDefinition, ConfigFileError> {
    let section_name = format!("{}{}", VARIANT_SECTION_PREFIX, name);
    let dimension = |key: &str| -> Result<u32, ConfigFileError> {
        let v = section.get(key).ok_or_else(|| ConfigFileError::MissingValue {
            section: section_name.clone(),
            key: key.to_string(),
            reason: "every variant needs a width and a height (0 for passthrough)".to_string(),
        })?;
        v.trim()
            .parse()
            .map_err(|_| invalid(&section_name, key, v, "must be a non-negative integer"))
    };

    let width = dimension("width")?;
    let height = dimension("height")?;

    let mut def = if width == 0 && height == 0 {
        VariantDefinition::canonical(name)
    } else {
        VariantDefinition::new(name, width, height)
    };

    if let Some(v) = section.get("quality") {
        let quality: u8 = v
            .trim()
            .parse()
            .ok()
            .filter(|q| *q <= 100)
            .ok_or_else(|| invalid(&section_name, "quality", v, "must be an integer from 0 to 100"))?;
        def = def.with_quality(quality);
    }
    if let Some(v) = section.get("fill_color") {
        def = def.with_fill_color(parse_enum::<FillColor>(&section_name, "fill_color", v)?);
    }
    if let Some(v) = section.get("encoding") {
        def = def.with_encoding(parse_enum::<OutputEncoding>(&section_name, "encoding", v)?);
    }
    if let Some(v) = section.get("scale_mode") {
        def = def.with_scale_mode(parse_enum::<ScaleMode>(&section_name, "scale_mode", v)?);
    }

    Ok(def)
}

fn parse_enum<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|reason: String| invalid(section, key, value, &reason))
}

fn parse_seconds(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| invalid(section, key, value, "must be a positive integer (seconds)"))
}

/// Accepts true/false, yes/no, on/off and 1/0.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn optional_string(section: &Properties, key: &str) -> Option<String> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
