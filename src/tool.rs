//! Small helpers shared across the crate.
//!
//! Usually you don't need this module directly;
//! [`crate::parse`] uses it when deriving filenames.

/// Extract a filename from the last path segment of `url`,
/// with any query string or fragment stripped.
///
/// Returns `None` when the URL has no path segment (no `/` at all,
/// or nothing after the last one), so the caller can fall back to a
/// synthesized name.
///
/// ```
/// use booru_fetch::tool::filename_from_url;
///
/// assert_eq!(
///     filename_from_url("https://cdn.example.com/img/abc123.png?foo=bar"),
///     Some(String::from("abc123.png")),
/// );
/// assert_eq!(filename_from_url("no-path-here"), None);
/// ```
#[must_use]
pub fn filename_from_url(url: &str) -> Option<String> {
    let without_query = url
        .split_once(['?', '#'])
        .map_or(url, |(before, _)| before);
    let (_, segment) = without_query.rsplit_once('/')?;
    if segment.is_empty() {
        return None;
    }
    Some(segment.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/a/b/abc123.png"),
            Some(String::from("abc123.png"))
        );
        assert_eq!(
            filename_from_url("https://cdn.example.com/a/abc123.png?foo=bar&x=1"),
            Some(String::from("abc123.png"))
        );
        assert_eq!(
            filename_from_url("https://cdn.example.com/a/abc123.png#frag"),
            Some(String::from("abc123.png"))
        );
    }

    #[test]
    fn test_filename_from_url_without_path_segment() {
        assert_eq!(filename_from_url("abc123.png"), None);
        assert_eq!(filename_from_url("https://cdn.example.com/dir/"), None);
        assert_eq!(filename_from_url(""), None);
    }
}
