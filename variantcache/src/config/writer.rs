//! INI serialization: `ConfigFile` → commented config.ini text.

use std::fmt::Write;
use std::path::Path;

use super::parser::VARIANT_SECTION_PREFIX;
use super::settings::{ConfigFile, KeyLayout};
use crate::variant::{VariantCatalog, VariantDefinition};

/// Render `config` as a commented INI document.
///
/// When no variants are configured the built-in table is written out, so
/// the file documents what is being served and can be edited in place.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let root_url = config.origin.root_url.as_deref().unwrap_or("");
    let endpoint = config.store.endpoint.as_deref().unwrap_or("");
    let bucket = config.store.bucket.as_deref().unwrap_or("");
    let token = config.store.token.as_deref().unwrap_or("");
    let key_layout = match config.pipeline.key_layout {
        KeyLayout::Directory => "directory",
        KeyLayout::Flat => "flat",
    };

    let mut out = format!(
        r#"[origin]
; Base URL of the upstream image source. Requests fetch <root_url>/<filename>.
; Example: root_url = https://images.example.com/media
root_url = {}
; Request timeout in seconds (default: 30)
timeout = {}

[store]
; Where cached images are kept:
;   memory - in process, lost on exit (development only)
;   disk   - files under <directory>
;   http   - S3-compatible object store at <endpoint>/<bucket>
backend = {}
directory = {}
endpoint = {}
bucket = {}
; Optional bearer token sent to the object store
token = {}
; Object store request timeout in seconds (default: 30)
timeout = {}

[pipeline]
; Collapse concurrent misses for the same image into a single fill (default: true)
coalesce = {}
; Storage key layout:
;   directory - <variant>/<abcd>/<efgh>/<filename> (default)
;   flat      - <variant>/<filename>
key_layout = {}

[logging]
directory = {}
file = {}

; Variants. Each [variant.<name>] section defines one variant:
;   width, height - output size in pixels; 0 and 0 marks the passthrough variant
;   quality       - encoder quality 0-100 (JPEG only)
;   fill_color    - margin color for fill mode, #rrggbb
;   encoding      - jpeg or png
;   scale_mode    - crop, fill or skew
; Exactly one variant must be the passthrough. Removing every variant section
; restores the built-in table.
"#,
        root_url,
        config.origin.timeout,
        config.store.backend.as_str(),
        path_to_string(&config.store.directory),
        endpoint,
        bucket,
        token,
        config.store.timeout,
        config.pipeline.coalesce,
        key_layout,
        path_to_string(&config.logging.directory),
        config.logging.file,
    );

    let builtin;
    let variants: &[VariantDefinition] = if config.variants.is_empty() {
        builtin = VariantCatalog::builtin();
        builtin.all()
    } else {
        &config.variants
    };

    for def in variants {
        write_variant(&mut out, def);
    }
    out
}

fn write_variant(out: &mut String, def: &VariantDefinition) {
    // Writing to a String cannot fail
    let _ = write!(
        out,
        "\n[{}{}]\nwidth = {}\nheight = {}\nquality = {}\nfill_color = {}\nencoding = {}\nscale_mode = {}\n",
        VARIANT_SECTION_PREFIX,
        def.name(),
        def.width(),
        def.height(),
        def.quality(),
        def.fill_color(),
        def.encoding(),
        def.scale_mode(),
    );
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
