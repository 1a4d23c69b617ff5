//! Immutable registry of supported variants.

use super::types::{FillColor, OutputEncoding, ScaleMode, VariantDefinition};
use std::collections::HashSet;
use thiserror::Error;

/// Name of the canonical variant in the built-in table.
pub const DEFAULT_CANONICAL_NAME: &str = "original";

/// Errors raised while building or querying a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Requested variant is not registered
    #[error("No predefined variant: {0}")]
    UnknownVariant(String),

    /// Catalog was built from an empty table
    #[error("Variant catalog is empty")]
    Empty,

    /// No variant has passthrough dimensions
    #[error("Variant catalog has no canonical (0x0) variant")]
    NoCanonical,

    /// More than one variant has passthrough dimensions
    #[error("Variant catalog has more than one canonical variant: {first}, {second}")]
    MultipleCanonical { first: String, second: String },

    /// Exactly one of width/height is zero
    #[error("Variant '{name}' has partial dimensions {width}x{height}")]
    PartialDimensions { name: String, width: u32, height: u32 },

    /// Quality outside 0..=100
    #[error("Variant '{name}' has quality {quality}, expected 0-100")]
    InvalidQuality { name: String, quality: u8 },

    /// Name is empty, starts with `.`, or contains a path separator
    #[error("Invalid variant name '{0}'")]
    InvalidName(String),

    /// Same name registered twice (case-insensitive)
    #[error("Duplicate variant name '{0}'")]
    DuplicateName(String),
}

/// Registry of the variants this cache serves.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
/// Exactly one variant is canonical; every other variant is derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCatalog {
    variants: Vec<VariantDefinition>,
    canonical: usize,
}

impl VariantCatalog {
    /// Validate and build a catalog.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the table is empty, does not contain
    /// exactly one canonical variant, has a variant with a single zero
    /// dimension or quality above 100, or repeats a name.
    pub fn new(variants: Vec<VariantDefinition>) -> Result<Self, CatalogError> {
        if variants.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        let mut canonical: Option<usize> = None;

        for (index, def) in variants.iter().enumerate() {
            let name = def.name();
            if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
                return Err(CatalogError::InvalidName(name.to_string()));
            }
            if !seen.insert(name.to_string()) {
                return Err(CatalogError::DuplicateName(name.to_string()));
            }
            if def.quality() > 100 {
                return Err(CatalogError::InvalidQuality {
                    name: name.to_string(),
                    quality: def.quality(),
                });
            }
            if def.is_canonical() {
                if let Some(first) = canonical {
                    return Err(CatalogError::MultipleCanonical {
                        first: variants[first].name().to_string(),
                        second: name.to_string(),
                    });
                }
                canonical = Some(index);
            } else if def.width() == 0 || def.height() == 0 {
                return Err(CatalogError::PartialDimensions {
                    name: name.to_string(),
                    width: def.width(),
                    height: def.height(),
                });
            }
        }

        let canonical = canonical.ok_or(CatalogError::NoCanonical)?;
        Ok(Self {
            variants,
            canonical,
        })
    }

    /// The built-in variant table.
    pub fn builtin() -> Self {
        let jpeg = |name: &str, width, height, mode| {
            VariantDefinition::new(name, width, height)
                .with_quality(90)
                .with_fill_color(FillColor::RED)
                .with_encoding(OutputEncoding::Jpeg)
                .with_scale_mode(mode)
        };

        let variants = vec![
            jpeg("thumbnail", 100, 100, ScaleMode::Fill),
            jpeg("fill", 100, 100, ScaleMode::Fill),
            jpeg("crop", 1000, 1000, ScaleMode::Crop),
            jpeg("skew", 100, 100, ScaleMode::Skew),
            jpeg("skew-high", 300, 100, ScaleMode::Skew),
            VariantDefinition::canonical(DEFAULT_CANONICAL_NAME),
        ];

        Self {
            canonical: variants.len() - 1,
            variants,
        }
    }

    /// Returns true if `name` matches a registered variant, ignoring case.
    pub fn supports(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v.matches(name))
    }

    /// Look up a variant by name, ignoring case.
    pub fn lookup(&self, name: &str) -> Result<&VariantDefinition, CatalogError> {
        self.variants
            .iter()
            .find(|v| v.matches(name))
            .ok_or_else(|| CatalogError::UnknownVariant(name.to_string()))
    }

    /// The passthrough variant every other variant is derived from.
    pub fn canonical(&self) -> &VariantDefinition {
        &self.variants[self.canonical]
    }

    /// Every registered variant, canonical included.
    pub fn all(&self) -> &[VariantDefinition] {
        &self.variants
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name())
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = VariantCatalog::builtin();
        let rebuilt = VariantCatalog::new(builtin.all().to_vec());
        assert!(rebuilt.is_ok());
        assert_eq!(builtin.len(), 6);
        assert_eq!(builtin.canonical().name(), "original");
    }

    #[test]
    fn test_supports_ignores_case() {
        let catalog = VariantCatalog::builtin();
        assert!(catalog.supports("thumbnail"));
        assert!(catalog.supports("Thumbnail"));
        assert!(catalog.supports("SKEW-HIGH"));
        assert!(!catalog.supports("huge"));
    }

    #[test]
    fn test_lookup_returns_definition() {
        let catalog = VariantCatalog::builtin();
        let crop = catalog.lookup("CROP").unwrap();
        assert_eq!(crop.width(), 1000);
        assert_eq!(crop.scale_mode(), ScaleMode::Crop);
    }

    #[test]
    fn test_lookup_unknown_fails() {
        let catalog = VariantCatalog::builtin();
        assert_eq!(
            catalog.lookup("huge").unwrap_err(),
            CatalogError::UnknownVariant("huge".to_string())
        );
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert_eq!(VariantCatalog::new(vec![]).unwrap_err(), CatalogError::Empty);
    }

    #[test]
    fn test_missing_canonical_rejected() {
        let result = VariantCatalog::new(vec![VariantDefinition::new("thumbnail", 10, 10)]);
        assert_eq!(result.unwrap_err(), CatalogError::NoCanonical);
    }

    #[test]
    fn test_two_canonicals_rejected() {
        let result = VariantCatalog::new(vec![
            VariantDefinition::canonical("original"),
            VariantDefinition::canonical("source"),
        ]);
        assert!(matches!(
            result.unwrap_err(),
            CatalogError::MultipleCanonical { .. }
        ));
    }

    #[test]
    fn test_partial_dimensions_rejected() {
        let result = VariantCatalog::new(vec![
            VariantDefinition::canonical("original"),
            VariantDefinition::new("banner", 300, 0),
        ]);
        assert!(matches!(
            result.unwrap_err(),
            CatalogError::PartialDimensions { width: 300, height: 0, .. }
        ));
    }

    #[test]
    fn test_duplicate_names_rejected_case_insensitively() {
        let result = VariantCatalog::new(vec![
            VariantDefinition::canonical("original"),
            VariantDefinition::new("thumb", 10, 10),
            VariantDefinition::new("THUMB", 20, 20),
        ]);
        assert_eq!(
            result.unwrap_err(),
            CatalogError::DuplicateName("thumb".to_string())
        );
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let result = VariantCatalog::new(vec![
            VariantDefinition::canonical("original"),
            VariantDefinition::new("thumb", 10, 10).with_quality(101),
        ]);
        assert!(matches!(
            result.unwrap_err(),
            CatalogError::InvalidQuality { quality: 101, .. }
        ));
    }

    #[test]
    fn test_name_with_separator_rejected() {
        let result = VariantCatalog::new(vec![
            VariantDefinition::canonical("original"),
            VariantDefinition::new("a/b", 10, 10),
        ]);
        assert!(matches!(result.unwrap_err(), CatalogError::InvalidName(_)));
    }

    #[test]
    fn test_hidden_name_rejected() {
        let result = VariantCatalog::new(vec![
            VariantDefinition::canonical("original"),
            VariantDefinition::new(".staging", 10, 10),
        ]);
        assert!(matches!(result.unwrap_err(), CatalogError::InvalidName(_)));
    }

    #[test]
    fn test_all_includes_canonical() {
        let catalog = VariantCatalog::builtin();
        assert!(catalog.all().iter().any(|v| v.is_canonical()));
        assert_eq!(catalog.names().count(), catalog.len());
    }
}
