//! The one-image-per-call composition of transport, parser and selector.
//!
//! [`SessionClient::fetch_one`] is the operation the presentation layer
//! calls: it tries each tag set in order, fetches and parses the search
//! results for it, and hands them to [`crate::select`]. The caller then
//! downloads the chosen record separately via [`crate::download`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Url;
use tracing::debug;

use crate::api::{self, ImageRecord, SelectionCriteria, TagSet};
use crate::parse;
use crate::select::select_across_tag_sets;
use crate::transport::Transport;

/// Finds one image for a prioritized list of tag sets.
///
/// Holds no mutable state; independent `fetch_one` calls may run
/// concurrently on clones or shared references.
///
/// # Example
///
/// ```no_run
/// use booru_fetch::api::{SelectionCriteria, TagSet};
/// use booru_fetch::session::SessionClient;
/// use booru_fetch::transport::Transport;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let session = SessionClient::new(Transport::new()?);
///     let tag_sets = [TagSet::new(["blue_sky"]), TagSet::new(["sky"])];
///
///     if let Some(record) = session
///         .fetch_one(&tag_sets, &SelectionCriteria::default())
///         .await
///     {
///         println!("found {}", record.source_url);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionClient {
    transport: Transport,
    search_url: Url,
}

impl SessionClient {
    /// Build a session against the default booru search endpoint.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::with_search_url(transport, api::url::SEARCH_URL.clone())
    }

    /// Build a session against a specific search endpoint.
    ///
    /// Useful for tests and for boorus exposing the same record shape
    /// under a different host.
    #[must_use]
    pub fn with_search_url(transport: Transport, search_url: Url) -> Self {
        Self {
            transport,
            search_url,
        }
    }

    /// Find one image, trying `tag_sets` in priority order.
    ///
    /// Uses a freshly seeded generator for the randomized choice, so
    /// repeated calls do not correlate. `None` means no tag set yielded
    /// any record; per-tag-set failures (HTTP errors, malformed
    /// payloads) are logged and count as zero results for that set.
    pub async fn fetch_one(
        &self,
        tag_sets: &[TagSet],
        criteria: &SelectionCriteria,
    ) -> Option<ImageRecord> {
        let mut rng = StdRng::from_entropy();
        self.fetch_one_with_rng(tag_sets, criteria, &mut rng).await
    }

    /// [`Self::fetch_one`] with an injected random generator.
    pub async fn fetch_one_with_rng<R: Rng>(
        &self,
        tag_sets: &[TagSet],
        criteria: &SelectionCriteria,
        rng: &mut R,
    ) -> Option<ImageRecord> {
        let query = |tags: TagSet| {
            let url = api::search_url(&self.search_url, &tags, criteria.result_limit);
            let transport = self.transport.clone();
            async move {
                let url = url?;
                debug!(url = %url, "querying search endpoint");
                let body = transport.fetch_buffered(url).await?;
                let records = parse::parse(&body)?;
                Ok(records)
            }
        };

        select_across_tag_sets(tag_sets, criteria, query, rng).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(id: u64, width: u32, height: u32) -> serde_json::Value {
        json!({
            "id": id,
            "file_url": format!("https://cdn.example.com/img/{id}.png"),
            "file_ext": "png",
            "tag_string": "tagA",
            "rating": "g",
            "image_width": width,
            "image_height": height,
        })
    }

    async fn session_for(server: &MockServer) -> SessionClient {
        let url = Url::parse(&format!("{}/posts.json", server.uri())).unwrap();
        SessionClient::with_search_url(Transport::new().unwrap(), url)
    }

    #[tokio::test]
    async fn test_fetch_one_selects_from_first_non_empty_tag_set() {
        let server = MockServer::start().await;
        // First tag set comes back empty, second has records.
        Mock::given(method("GET"))
            .and(path("/posts.json"))
            .and(query_param("tags", "rare_tag -video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts.json"))
            .and(query_param("tags", "common_tag -video"))
            .and(query_param("limit", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([entry(1, 100, 800), entry(2, 800, 800)])),
            )
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let tag_sets = [TagSet::new(["rare_tag"]), TagSet::new(["common_tag"])];
        let criteria = SelectionCriteria {
            min_width: 500,
            min_height: 600,
            max_width: 4000,
            max_height: 3000,
            exclude_terms: vec![String::from("-video")],
            ..SelectionCriteria::default()
        };

        let mut rng = StdRng::seed_from_u64(11);
        let record = session
            .fetch_one_with_rng(&tag_sets, &criteria, &mut rng)
            .await
            .unwrap();

        // Only id 2 passes the quality filter.
        assert_eq!(record.id, 2);
        assert_eq!(record.suggested_filename, "2.png");
    }

    #[tokio::test]
    async fn test_fetch_one_continues_past_failing_tag_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts.json"))
            .and(query_param("tags", "bad_tag"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts.json"))
            .and(query_param("tags", "good_tag"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry(5, 800, 800)])))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let tag_sets = [TagSet::new(["bad_tag"]), TagSet::new(["good_tag"])];

        let record = session
            .fetch_one(&tag_sets, &SelectionCriteria::default())
            .await
            .unwrap();
        assert_eq!(record.id, 5);
    }

    #[tokio::test]
    async fn test_fetch_one_none_when_nothing_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let tag_sets = [TagSet::new(["a"]), TagSet::new(["b"])];

        let record = session
            .fetch_one(&tag_sets, &SelectionCriteria::default())
            .await;
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_fetch_one_tolerates_wrapped_payload() {
        // Same records, wrapped in an envelope with extra metadata.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"took": 12},
                "posts": [entry(3, 900, 900)],
            })))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let record = session
            .fetch_one(&[TagSet::new(["x"])], &SelectionCriteria::default())
            .await
            .unwrap();
        assert_eq!(record.id, 3);
    }
}
