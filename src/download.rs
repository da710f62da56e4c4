//! Streaming download of a remote resource to a local path.
//!
//! All-or-nothing: either the destination file is complete and closed
//! when [`Downloader::download`] returns, or it does not exist. A
//! partially written file is removed before the error is surfaced, so
//! callers never observe a half-written file at the destination.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::transport::{StreamError, Transport, TransportError};

/// Errors from a single download.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The destination file could not be created.
    #[error("cannot open destination {path}: {source}")]
    CannotOpenDestination {
        /// The destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Writing to the destination failed mid-stream.
    #[error("failed writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The transfer itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result of a successful download.
///
/// The file at [`Self::path`] is complete, flushed and closed; it is
/// exclusively the caller's from here on.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Where the file was written.
    pub path: PathBuf,
    /// How many bytes it holds.
    pub bytes_written: u64,
}

/// Streams remote resources to disk via a [`Transport`].
#[derive(Debug, Clone)]
pub struct Downloader {
    transport: Transport,
}

impl Downloader {
    /// Build a downloader on top of `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Download `url` to `dest` without progress reporting.
    ///
    /// # Errors
    ///
    /// See [`DownloadError`]. On error no file is left at `dest`.
    pub async fn download(
        &self,
        url: &str,
        dest: impl AsRef<Path>,
    ) -> Result<DownloadOutcome, DownloadError> {
        self.download_with_progress(url, dest, |_, _| {}).await
    }

    /// Download `url` to `dest`, reporting progress per received chunk.
    ///
    /// `on_progress(bytes_done, bytes_total)` is called on the task
    /// performing the transfer; `bytes_done` never decreases and
    /// `bytes_total` is `None` when the source does not advertise a
    /// content length. Callers needing thread marshaling do it
    /// themselves.
    ///
    /// The destination is opened with create/truncate semantics. The
    /// path is the caller's to choose; concurrent downloads to the same
    /// path are the caller's responsibility to avoid.
    ///
    /// # Errors
    ///
    /// See [`DownloadError`]. On error no file is left at `dest`.
    pub async fn download_with_progress<F>(
        &self,
        url: &str,
        dest: impl AsRef<Path>,
        on_progress: F,
    ) -> Result<DownloadOutcome, DownloadError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let dest = dest.as_ref();

        // Open the stream first: an immediate HTTP failure must not
        // touch whatever currently sits at the destination.
        let stream = self.transport.open_stream(url).await?;

        let file = File::create(dest)
            .await
            .map_err(|source| DownloadError::CannotOpenDestination {
                path: dest.to_path_buf(),
                source,
            })?;
        let mut writer = BufWriter::new(file);

        let written = async {
            let bytes_written = stream.write_to(&mut writer, on_progress).await?;
            writer.flush().await.map_err(StreamError::Sink)?;
            Ok::<u64, StreamError>(bytes_written)
        }
        .await;

        match written {
            Ok(bytes_written) => {
                debug!(path = %dest.display(), bytes = bytes_written, "download complete");
                Ok(DownloadOutcome {
                    path: dest.to_path_buf(),
                    bytes_written,
                })
            }
            Err(err) => {
                // Close the handle before removing the partial file.
                drop(writer);
                warn!(path = %dest.display(), "removing partial file after failed download");
                let _ = tokio::fs::remove_file(dest).await;
                Err(match err {
                    StreamError::Transport(source) => DownloadError::Transport(source),
                    StreamError::Sink(source) => DownloadError::Io {
                        path: dest.to_path_buf(),
                        source,
                    },
                })
            }
        }
    }
}
