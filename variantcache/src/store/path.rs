//! Storage key derivation.
//!
//! Maps a `(variant, filename)` pair to the key the blob is stored under.
//! Keys never depend on file contents or time, and distinct pairs never
//! share a key. Filenames that could escape their variant prefix are
//! rejected before any key is built.

use std::fmt;
use thiserror::Error;

/// Number of filename characters in each shard directory.
const SHARD_WIDTH: usize = 4;

/// Key of one blob in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Rejected key inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("filename is empty")]
    EmptyFilename,

    #[error("filename '{0}' must be relative")]
    AbsoluteFilename(String),

    #[error("filename '{filename}' contains forbidden character {character:?}")]
    ForbiddenCharacter { filename: String, character: char },

    #[error("filename '{0}' contains an empty, '.' or '..' segment")]
    Traversal(String),

    #[error("invalid variant name '{0}'")]
    InvalidVariant(String),
}

/// Strategy for turning a `(variant, filename)` pair into a storage key.
///
/// Implementations must be pure: the same inputs always give the same key,
/// and different inputs never give the same key.
pub trait PathStrategy: Send + Sync {
    /// Build the key for `filename` under `variant`.
    fn key_for(&self, variant: &str, filename: &str) -> Result<StorageKey, PathError>;
}

/// Sharded layout: `<variant>/<shard1>/<shard2>/<filename>`.
///
/// `shard1` is the first four characters and `shard2` the next four
/// characters of the filename with `/` flattened to `_`. Shards the filename
/// is too short to fill are left out. The full filename is always the last
/// part of the key.
///
/// # Example
///
/// ```
/// use variantcache::store::{DirectoryStrategy, PathStrategy};
///
/// let key = DirectoryStrategy.key_for("Thumbnail", "abcdefghij.jpg").unwrap();
/// assert_eq!(key.as_str(), "thumbnail/abcd/efgh/abcdefghij.jpg");
///
/// let key = DirectoryStrategy.key_for("original", "shoes/red.jpg").unwrap();
/// assert_eq!(key.as_str(), "original/shoe/s_re/shoes/red.jpg");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryStrategy;

impl PathStrategy for DirectoryStrategy {
    fn key_for(&self, variant: &str, filename: &str) -> Result<StorageKey, PathError> {
        let variant = normalize_variant(variant)?;
        let filename = validate_filename(filename)?;

        let flattened: Vec<char> = filename
            .chars()
            .map(|c| if c == '/' { '_' } else { c })
            .collect();

        let mut parts = vec![variant];
        for shard in flattened.chunks_exact(SHARD_WIDTH).take(2) {
            parts.push(shard.iter().collect());
        }
        parts.push(filename.to_string());

        Ok(StorageKey(parts.join("/")))
    }
}

/// Flat layout: `<variant>/<filename>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatStrategy;

impl PathStrategy for FlatStrategy {
    fn key_for(&self, variant: &str, filename: &str) -> Result<StorageKey, PathError> {
        let variant = normalize_variant(variant)?;
        let filename = validate_filename(filename)?;
        Ok(StorageKey(format!("{}/{}", variant, filename)))
    }
}

fn normalize_variant(variant: &str) -> Result<String, PathError> {
    let normalized = variant.trim().to_lowercase();
    if normalized.is_empty() || normalized.starts_with('.') || normalized.contains(['/', '\\'])
    {
        return Err(PathError::InvalidVariant(variant.to_string()));
    }
    Ok(normalized)
}

/// Check that `filename` is a plain relative path that stays under its prefix.
pub fn validate_filename(filename: &str) -> Result<&str, PathError> {
    if filename.is_empty() {
        return Err(PathError::EmptyFilename);
    }
    if filename.starts_with('/') {
        return Err(PathError::AbsoluteFilename(filename.to_string()));
    }
    if let Some(character) = filename.chars().find(|c| *c == '\\' || c.is_control()) {
        return Err(PathError::ForbiddenCharacter {
            filename: filename.to_string(),
            character,
        });
    }
    if filename
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(PathError::Traversal(filename.to_string()));
    }
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_key_two_shards() {
        let key = DirectoryStrategy.key_for("thumbnail", "abcdefghij.jpg").unwrap();
        assert_eq!(key.as_str(), "thumbnail/abcd/efgh/abcdefghij.jpg");
    }

    #[test]
    fn test_directory_key_one_shard() {
        let key = DirectoryStrategy.key_for("crop", "abcdef").unwrap();
        assert_eq!(key.as_str(), "crop/abcd/abcdef");
    }

    #[test]
    fn test_directory_key_no_shard() {
        let key = DirectoryStrategy.key_for("crop", "abc").unwrap();
        assert_eq!(key.as_str(), "crop/abc");
    }

    #[test]
    fn test_directory_key_flattens_separators_in_shards_only() {
        let key = DirectoryStrategy.key_for("original", "ab/cdefgh.png").unwrap();
        assert_eq!(key.as_str(), "original/ab_c/defg/ab/cdefgh.png");
    }

    #[test]
    fn test_variant_name_is_case_insensitive() {
        let lower = DirectoryStrategy.key_for("thumbnail", "image.jpg").unwrap();
        let upper = DirectoryStrategy.key_for("THUMBNAIL", "image.jpg").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_key_is_deterministic() {
        let first = DirectoryStrategy.key_for("skew", "some/deep/file.jpg").unwrap();
        let second = DirectoryStrategy.key_for("skew", "some/deep/file.jpg").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_pairs_never_collide() {
        let filenames = [
            "abc",
            "abcd",
            "abcdefg",
            "abcd/efgh",
            "abcd_efgh",
            "abcd/abcd",
            "a/b",
            "a_b",
            "abcd/abcd/abcd",
            "abcd/efgh/abcdefgh.jpg",
            "abcdefgh.jpg",
        ];
        let variants = ["original", "thumbnail", "crop"];

        let mut keys = std::collections::HashSet::new();
        for variant in variants {
            for filename in filenames {
                let key = DirectoryStrategy.key_for(variant, filename).unwrap();
                assert!(keys.insert(key.clone()), "collision on {}", key);
            }
        }
        assert_eq!(keys.len(), variants.len() * filenames.len());
    }

    #[test]
    fn test_traversal_rejected() {
        for filename in ["../secret", "a/../../b", "./a", "a//b", "a/", "a/."] {
            assert!(
                matches!(
                    DirectoryStrategy.key_for("thumbnail", filename),
                    Err(PathError::Traversal(_))
                ),
                "{} should be rejected",
                filename
            );
        }
    }

    #[test]
    fn test_absolute_and_forbidden_rejected() {
        assert_eq!(
            DirectoryStrategy.key_for("thumbnail", "/etc/passwd"),
            Err(PathError::AbsoluteFilename("/etc/passwd".to_string()))
        );
        assert!(matches!(
            DirectoryStrategy.key_for("thumbnail", "a\\b"),
            Err(PathError::ForbiddenCharacter { character: '\\', .. })
        ));
        assert!(matches!(
            DirectoryStrategy.key_for("thumbnail", "a\nb"),
            Err(PathError::ForbiddenCharacter { .. })
        ));
        assert_eq!(
            DirectoryStrategy.key_for("thumbnail", ""),
            Err(PathError::EmptyFilename)
        );
    }

    #[test]
    fn test_dotted_names_are_fine() {
        let key = DirectoryStrategy.key_for("thumbnail", "..hidden.jpg").unwrap();
        assert_eq!(key.as_str(), "thumbnail/..hi/dden/..hidden.jpg");
    }

    #[test]
    fn test_invalid_variant_rejected() {
        assert!(matches!(
            DirectoryStrategy.key_for("a/b", "x.jpg"),
            Err(PathError::InvalidVariant(_))
        ));
        assert!(matches!(
            FlatStrategy.key_for("..", "x.jpg"),
            Err(PathError::InvalidVariant(_))
        ));
        assert!(matches!(
            FlatStrategy.key_for(".staging", "x.jpg"),
            Err(PathError::InvalidVariant(_))
        ));
    }

    #[test]
    fn test_flat_strategy() {
        let key = FlatStrategy.key_for("Crop", "dir/file.jpg").unwrap();
        assert_eq!(key.as_str(), "crop/dir/file.jpg");
        assert!(FlatStrategy.key_for("crop", "../file.jpg").is_err());
    }
}
