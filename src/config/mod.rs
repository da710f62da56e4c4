//! TOML configuration for the binary.

use std::path::PathBuf;

use serde::Deserialize;
use validator::ValidationError;
pub use validator::Validate;

use crate::api::{SelectionCriteria, TagSet};

/// The default config, embedded so the editor flow can offer it as a
/// starting point.
pub const DEFAULT_CONFIG_STR: &str = include_str!("default.toml");

fn default_limit() -> u64 {
    100
}

fn default_max_dim() -> u32 {
    u32::MAX
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

/// Everything one run of the binary needs.
///
/// See `default.toml` for the field semantics.
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Config {
    /// Fallback searches in priority order.
    #[validate(custom(function = validate_tag_sets))]
    pub tag_sets: Vec<Vec<String>>,
    /// Terms appended to every search.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Records requested per search.
    #[validate(range(min = 1, max = 200, message = "limit can only be between 1 and 200"))]
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Smallest preferred width.
    #[serde(default)]
    pub min_width: u32,
    /// Smallest preferred height.
    #[serde(default)]
    pub min_height: u32,
    /// Largest preferred width.
    #[serde(default = "default_max_dim")]
    pub max_width: u32,
    /// Largest preferred height.
    #[serde(default = "default_max_dim")]
    pub max_height: u32,
    /// Where the picked image is saved.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn validate_tag_sets(tag_sets: &Vec<Vec<String>>) -> Result<(), ValidationError> {
    if tag_sets.is_empty() {
        return Err(ValidationError::new("tag_sets")
            .with_message("at least one tag set is required".into()));
    }
    if tag_sets.iter().any(|set| set.is_empty()) {
        return Err(
            ValidationError::new("tag_sets").with_message("a tag set cannot be empty".into())
        );
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_sets: Vec::new(),
            exclude: Vec::new(),
            limit: default_limit(),
            min_width: 0,
            min_height: 0,
            max_width: u32::MAX,
            max_height: u32::MAX,
            download_dir: default_download_dir(),
        }
    }
}

impl Config {
    /// The configured fallback searches as [`TagSet`]s, in order.
    #[must_use]
    pub fn tag_sets(&self) -> Vec<TagSet> {
        self.tag_sets.iter().cloned().map(TagSet::from).collect()
    }

    /// The configured quality bounds and query options.
    #[must_use]
    pub fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            min_width: self.min_width,
            min_height: self.min_height,
            max_width: self.max_width,
            max_height: self.max_height,
            result_limit: self.limit,
            exclude_terms: self.exclude.clone(),
        }
    }
}
