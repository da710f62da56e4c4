//! HTTP transport for the booru API and asset downloads.
//!
//! One [`Transport`] wraps a single [`reqwest::Client`] with a fixed
//! user agent and redirect following. It offers two modes:
//!
//! - buffered: [`Transport::fetch_buffered`], used for metadata queries;
//! - streaming: [`Transport::open_stream`] + [`ByteStream::write_to`],
//!   used for asset downloads, which writes into a caller-provided sink
//!   as bytes arrive and reports progress per chunk.
//!
//! [`Transport`] is cheap to clone; every clone shares the same
//! connection pool.

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("booru-fetch/", env!("CARGO_PKG_VERSION"));

/// Total timeout for metadata queries.
pub const QUERY_TIMEOUT_SECS: u64 = 30;
/// Total timeout for asset downloads. Larger payloads, larger bound.
pub const ASSET_TIMEOUT_SECS: u64 = 60;

const MAX_REDIRECTS: usize = 10;

/// Errors from a single HTTP fetch.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },
    /// The connection could not be established (DNS, refused, TLS).
    #[error("connection to {url} failed: {source}")]
    Connection {
        /// The URL that failed to connect.
        url: String,
        /// The underlying connect error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// Any other request failure.
    #[error("request to {url} failed: {source}")]
    Unknown {
        /// The URL of the failed request.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },
}

/// Errors from driving a [`ByteStream`] into a sink.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StreamError {
    /// The remote side failed while the body was being read.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The sink rejected a write.
    #[error("failed to write to sink: {0}")]
    Sink(#[source] std::io::Error),
}

fn classify(url: &str, source: reqwest::Error) -> TransportError {
    let url = url.to_owned();
    if source.is_timeout() {
        TransportError::Timeout { url }
    } else if source.is_connect() {
        TransportError::Connection { url, source }
    } else {
        TransportError::Unknown { url, source }
    }
}

/// A thin HTTP client with buffered and streaming fetch modes.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    query_timeout: Duration,
    asset_timeout: Duration,
}

impl Transport {
    /// Create a transport with the default timeouts
    /// ([`QUERY_TIMEOUT_SECS`] / [`ASSET_TIMEOUT_SECS`]).
    ///
    /// # Errors
    ///
    /// If the underlying client cannot be built.
    pub fn new() -> reqwest::Result<Self> {
        Self::with_timeouts(QUERY_TIMEOUT_SECS, ASSET_TIMEOUT_SECS)
    }

    /// Create a transport with explicit timeouts in seconds.
    ///
    /// Mainly useful for tests that need the timeout to trip quickly.
    ///
    /// # Errors
    ///
    /// If the underlying client cannot be built.
    pub fn with_timeouts(query_timeout_secs: u64, asset_timeout_secs: u64) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self {
            client,
            query_timeout: Duration::from_secs(query_timeout_secs),
            asset_timeout: Duration::from_secs(asset_timeout_secs),
        })
    }

    /// Fetch `url` and return the whole response body.
    ///
    /// # Errors
    ///
    /// See [`TransportError`]. A non-2xx status is an error; the body is
    /// not read in that case.
    pub async fn fetch_buffered(&self, url: Url) -> Result<Vec<u8>, TransportError> {
        let url_str = url.as_str().to_owned();
        debug!(url = %url_str, "buffered fetch");

        let response = self
            .client
            .get(url)
            .timeout(self.query_timeout)
            .send()
            .await
            .map_err(|err| classify(&url_str, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| classify(&url_str, err))?;
        debug!(url = %url_str, len = body.len(), "buffered fetch done");
        Ok(body.to_vec())
    }

    /// Start a streaming fetch of `url`.
    ///
    /// The response status is checked here, so a [`ByteStream`] is only
    /// returned once the server has answered 2xx.
    ///
    /// # Errors
    ///
    /// See [`TransportError`].
    pub async fn open_stream(&self, url: &str) -> Result<ByteStream, TransportError> {
        debug!(url, "opening stream");

        let response = self
            .client
            .get(url)
            .timeout(self.asset_timeout)
            .send()
            .await
            .map_err(|err| classify(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(ByteStream {
            url: url.to_owned(),
            response,
        })
    }
}

/// An in-flight response body, consumed chunk by chunk.
///
/// One-shot: [`Self::write_to`] consumes the stream.
#[derive(Debug)]
pub struct ByteStream {
    url: String,
    response: reqwest::Response,
}

impl ByteStream {
    /// The advertised body length, if the server sent one.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Drain the body into `sink`, calling `on_progress(bytes_done, bytes_total)`
    /// after every chunk. `bytes_done` never decreases across calls;
    /// `bytes_total` is `None` when the server sent no Content-Length.
    ///
    /// Returns the number of bytes written. The sink is not flushed;
    /// that is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// See [`StreamError`]. The sink may have been partially written when
    /// an error is returned.
    pub async fn write_to<W, F>(
        mut self,
        sink: &mut W,
        mut on_progress: F,
    ) -> Result<u64, StreamError>
    where
        W: AsyncWrite + Unpin,
        F: FnMut(u64, Option<u64>),
    {
        let bytes_total = self.response.content_length();
        let mut bytes_done: u64 = 0;

        while let Some(mut chunk) = self
            .response
            .chunk()
            .await
            .map_err(|err| classify(&self.url, err))?
        {
            let chunk_len = chunk.len() as u64;
            sink.write_all_buf(&mut chunk)
                .await
                .map_err(StreamError::Sink)?;
            bytes_done += chunk_len;
            on_progress(bytes_done, bytes_total);
        }

        Ok(bytes_done)
    }
}
