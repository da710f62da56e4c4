//! Data model and query URLs for the booru search API.
//!
//! This module holds the [`ImageRecord`] produced by [`crate::parse`],
//! the [`TagSet`] / [`SelectionCriteria`] inputs supplied by callers,
//! and [`search_url`] which turns one tag set into a query URL.

use std::sync::LazyLock;

use reqwest::Url;

/// The URLs for the booru API.
pub mod url {
    use super::*;

    /// The base URL of the booru.
    pub const BASE_URL: &str = "https://danbooru.donmai.us";

    /// The search endpoint, which returns post records as JSON.
    pub static SEARCH_URL: LazyLock<Url> = LazyLock::new(|| {
        // see: https://danbooru.donmai.us/wiki_pages/help:api
        Url::parse(BASE_URL)
            .and_then(|base| base.join("posts.json"))
            .unwrap()
    });
}

/// The booru rejects `limit` values above this.
pub const MAX_RESULT_LIMIT: u64 = 200;

/// One candidate result from a search query.
///
/// Constructed by [`crate::parse::parse`], immutable thereafter.
/// A record with an empty [`Self::source_url`] is never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// The post ID, unique per booru.
    pub id: u64,
    /// Absolute URL to the image binary.
    pub source_url: String,
    /// Filename derived from [`Self::source_url`], used when saving.
    pub suggested_filename: String,
    /// Space-delimited tag list as the booru reports it.
    pub tag_string: String,
    /// The booru's content rating for the post. Free-form.
    pub rating: String,
    /// Image width in pixels. `0` means unknown and fails quality checks.
    pub width: u32,
    /// Image height in pixels. `0` means unknown and fails quality checks.
    pub height: u32,
}

/// An ordered list of search terms describing one query attempt.
///
/// Exclusion terms carry a `-` prefix, e.g. `-video`, and are passed to
/// the booru verbatim. Callers supply tag sets as a prioritized sequence
/// of alternatives to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    terms: Vec<String>,
}

impl TagSet {
    /// Build a tag set from an ordered list of terms.
    pub fn new(terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// The terms in query order.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether the set has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The terms joined for the `tags` query parameter.
    ///
    /// Joined with spaces; form-encoding turns those into `+`, which is
    /// what the booru expects as a separator.
    #[must_use]
    pub fn joined(&self) -> String {
        self.terms.join(" ")
    }

    /// A copy of this set with `excludes` appended.
    /// Terms already present are not duplicated.
    #[must_use]
    pub fn with_excludes(&self, excludes: &[String]) -> Self {
        let mut terms = self.terms.clone();
        terms.extend(
            excludes
                .iter()
                .filter(|term| !self.terms.contains(term))
                .cloned(),
        );
        Self { terms }
    }
}

impl From<Vec<String>> for TagSet {
    fn from(terms: Vec<String>) -> Self {
        Self { terms }
    }
}

/// Quality bounds and query options applied to one fetch operation.
#[derive(Debug, Clone)]
pub struct SelectionCriteria {
    /// Smallest acceptable width for a "well-sized" image.
    pub min_width: u32,
    /// Smallest acceptable height.
    pub min_height: u32,
    /// Largest acceptable width.
    pub max_width: u32,
    /// Largest acceptable height.
    pub max_height: u32,
    /// How many records to request per query. Range `1..=200`.
    pub result_limit: u64,
    /// Terms appended to every tag set, e.g. `-video`.
    pub exclude_terms: Vec<String>,
}

impl Default for SelectionCriteria {
    /// Accept any known dimension and request 100 records per query.
    fn default() -> Self {
        Self {
            min_width: 0,
            min_height: 0,
            max_width: u32::MAX,
            max_height: u32::MAX,
            result_limit: 100,
            exclude_terms: Vec::new(),
        }
    }
}

impl SelectionCriteria {
    /// Whether `record` passes the dimensional quality filter.
    ///
    /// Unknown dimensions (zero width or height) always fail.
    #[must_use]
    pub fn is_well_sized(&self, record: &ImageRecord) -> bool {
        record.width > 0
            && record.height > 0
            && (self.min_width..=self.max_width).contains(&record.width)
            && (self.min_height..=self.max_height).contains(&record.height)
    }
}

/// Build the search URL for one tag set.
///
/// # Errors
///
/// If `tags` is empty, or `limit` is not in the range `1..=200`.
pub fn search_url(base: &Url, tags: &TagSet, limit: u64) -> anyhow::Result<Url> {
    if tags.is_empty() {
        return Err(anyhow::anyhow!("tag set cannot be empty"));
    }
    if !matches!(limit, 1..=MAX_RESULT_LIMIT) {
        return Err(anyhow::anyhow!(
            "limit can only be between 1 and {MAX_RESULT_LIMIT}"
        ));
    }

    let mut target = base.clone();
    target.query_pairs_mut().extend_pairs([
        ("tags", tags.joined().as_str()),
        ("limit", &limit.to_string()),
    ]);
    Ok(target)
}
