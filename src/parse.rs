//! Lenient decoding of search-result payloads into [`ImageRecord`]s.
//!
//! The booru's search responses are JSON in spirit, but entries may be
//! truncated, reordered, or wrapped in nested metadata objects the
//! caller does not care about. Instead of a strict structural decode,
//! [`parse`] scans the payload for each recognized field name
//! independently, collects the occurrences in encounter order, then zips
//! the per-field lists positionally up to the shortest list's length.
//!
//! The zip rests on one assumption: index `i` across all field lists
//! refers to the same logical record. That holds as long as the upstream
//! payload emits each recognized field once per entry; a nested object
//! repeating one of these field names (or an entry missing one of them)
//! shifts alignment for that field from there on, silently dropping the
//! tail rather than crashing.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::api::ImageRecord;
use crate::tool::filename_from_url;

/// Errors from decoding a search payload.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParseError {
    /// A numeric field failed integer conversion.
    #[error("malformed numeric field `{field}`: {value:?}")]
    MalformedField {
        /// The payload field name.
        field: &'static str,
        /// The offending captured text.
        value: String,
    },
}

static ID_RE: LazyLock<Regex> = LazyLock::new(|| numeric_field("id"));
static FILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| string_field("file_url"));
static FILE_EXT_RE: LazyLock<Regex> = LazyLock::new(|| string_field("file_ext"));
static TAG_STRING_RE: LazyLock<Regex> = LazyLock::new(|| string_field("tag_string"));
static RATING_RE: LazyLock<Regex> = LazyLock::new(|| string_field("rating"));
static WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| numeric_field("image_width"));
static HEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| numeric_field("image_height"));

fn numeric_field(name: &str) -> Regex {
    Regex::new(&format!(r#""{name}"\s*:\s*(\d+)"#)).unwrap()
}

fn string_field(name: &str) -> Regex {
    Regex::new(&format!(r#""{name}"\s*:\s*"([^"]*)""#)).unwrap()
}

fn occurrences<'a>(re: &Regex, haystack: &'a str) -> Vec<&'a str> {
    re.captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::MalformedField {
        field,
        value: value.to_owned(),
    })
}

/// Decode a search payload into a list of records.
///
/// One-shot per call. Records with an empty `file_url` are dropped.
/// The `suggested_filename` of each record is the last path segment of
/// its `file_url` with the query string stripped, falling back to
/// `"<id>.<file_ext>"` when the URL has no path segment.
///
/// # Errors
///
/// [`ParseError::MalformedField`] when a numeric field fails integer
/// conversion. Structural damage is not an error; it shortens the
/// output instead (see the module docs).
pub fn parse(body: &[u8]) -> Result<Vec<ImageRecord>, ParseError> {
    let text = String::from_utf8_lossy(body);

    let ids = occurrences(&ID_RE, &text);
    let file_urls = occurrences(&FILE_URL_RE, &text);
    let file_exts = occurrences(&FILE_EXT_RE, &text);
    let tag_strings = occurrences(&TAG_STRING_RE, &text);
    let ratings = occurrences(&RATING_RE, &text);
    let widths = occurrences(&WIDTH_RE, &text);
    let heights = occurrences(&HEIGHT_RE, &text);

    let count = [
        ids.len(),
        file_urls.len(),
        file_exts.len(),
        tag_strings.len(),
        ratings.len(),
        widths.len(),
        heights.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);

    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        let id: u64 = parse_number("id", ids[i])?;
        let width: u32 = parse_number("image_width", widths[i])?;
        let height: u32 = parse_number("image_height", heights[i])?;

        let source_url = file_urls[i];
        if source_url.is_empty() {
            continue;
        }

        let suggested_filename = filename_from_url(source_url)
            .unwrap_or_else(|| format!("{id}.{ext}", ext = file_exts[i]));

        records.push(ImageRecord {
            id,
            source_url: source_url.to_owned(),
            suggested_filename,
            tag_string: tag_strings[i].to_owned(),
            rating: ratings[i].to_owned(),
            width,
            height,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn entry(id: u64, file_url: &str, width: u32, height: u32) -> serde_json::Value {
        json!({
            "id": id,
            "file_url": file_url,
            "file_ext": "png",
            "tag_string": "blue_sky cloud",
            "rating": "g",
            "image_width": width,
            "image_height": height,
        })
    }

    #[test]
    fn test_well_formed_entries_all_decoded() {
        let body = json!([
            entry(1, "https://cdn.example.com/a/one.png", 800, 600),
            entry(2, "https://cdn.example.com/a/two.png", 1024, 768),
            entry(3, "https://cdn.example.com/a/three.png", 640, 480),
        ])
        .to_string();

        let records = parse(body.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.source_url.is_empty()));
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].width, 1024);
        assert_eq!(records[1].tag_string, "blue_sky cloud");
    }

    #[test]
    fn test_query_string_stripped_from_filename() {
        let body = json!([entry(
            7,
            "https://cdn.example.com/img/abc123.png?foo=bar",
            800,
            600
        )])
        .to_string();

        let records = parse(body.as_bytes()).unwrap();
        assert_eq!(records[0].suggested_filename, "abc123.png");
    }

    #[test]
    fn test_filename_falls_back_to_id_and_ext() {
        // No path segment in the URL at all.
        let mut value = entry(42, "placeholder", 800, 600);
        value["file_url"] = json!("abc123");
        let body = json!([value]).to_string();

        let records = parse(body.as_bytes()).unwrap();
        assert_eq!(records[0].suggested_filename, "42.png");
    }

    #[test]
    fn test_empty_file_url_dropped() {
        let body = json!([
            entry(1, "", 800, 600),
            entry(2, "https://cdn.example.com/a/two.png", 1024, 768),
        ])
        .to_string();

        let records = parse(body.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 2);
    }

    #[test]
    fn test_extra_fields_and_reordering_tolerated() {
        // Extra unrecognized fields, reordered keys, surrounding noise.
        let body = format!(
            "{{\"posts\": [{}], \"meta\": {{\"took\": 3}}}}",
            json!({
                "rating": "s",
                "image_height": 600,
                "uploader": {"name": "someone"},
                "file_ext": "jpg",
                "id": 9,
                "image_width": 900,
                "tag_string": "cat",
                "file_url": "https://cdn.example.com/x/nine.jpg",
                "score": 15,
            })
        );

        let records = parse(body.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 9);
        assert_eq!(records[0].width, 900);
        assert_eq!(records[0].suggested_filename, "nine.jpg");
    }

    #[test]
    fn test_truncated_entry_shortens_output() {
        // Second entry lost its file_url; the zip stops at the shortest
        // field list instead of erroring.
        let full = entry(1, "https://cdn.example.com/a/one.png", 800, 600);
        let mut partial = entry(2, "placeholder", 1024, 768);
        partial.as_object_mut().unwrap().remove("file_url");
        let body = json!([full, partial]).to_string();

        let records = parse(body.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn test_numeric_overflow_is_malformed_field() {
        let body = r#"[{
            "id": 1,
            "file_url": "https://cdn.example.com/a/one.png",
            "file_ext": "png",
            "tag_string": "cat",
            "rating": "g",
            "image_width": 99999999999999999999,
            "image_height": 600
        }]"#;

        let err = parse(body.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField {
                field: "image_width",
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_payload_yields_no_records() {
        let records = parse(b"<html>rate limited</html>").unwrap();
        assert!(records.is_empty());

        let records = parse(b"").unwrap();
        assert!(records.is_empty());
    }
}
