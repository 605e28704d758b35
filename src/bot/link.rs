//! Link handling pipeline: validate, download, check size, upload, clean up.

use crate::bot::transport::ChatTransport;
use crate::bot::views;
use crate::config::Settings;
use crate::download::{resolve_output_path, DownloadError, DownloadProvider, DownloadedFile};
use anyhow::{anyhow, Context};
use std::sync::Arc;
use teloxide::types::MessageId;
use tracing::{error, info, instrument};

/// Accepted URL schemes
const URL_PREFIXES: [&str; 2] = ["http://", "https://"];

/// How a link request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Text did not look like a link; nothing was downloaded
    Rejected,
    /// Video uploaded and status notification deleted
    Delivered,
    /// Download exceeded the ceiling
    TooLarge {
        /// Measured size in bytes
        size_bytes: u64,
    },
    /// The extractor refused the link
    ExtractionFailed,
    /// Any other failure during download or upload
    Failed,
}

/// Failures caught at the handler boundary
#[derive(Debug)]
enum LinkError {
    Extraction(String),
    Unexpected(anyhow::Error),
}

impl From<DownloadError> for LinkError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::ExtractionFailed(reason) => Self::Extraction(reason),
            DownloadError::Unexpected(detail) => Self::Unexpected(anyhow!(detail)),
        }
    }
}

impl From<anyhow::Error> for LinkError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unexpected(err)
    }
}

/// Syntactic check only: the text must start with a known scheme
#[must_use]
pub fn is_supported_url(text: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

/// Handle a plain text message that should contain a link.
///
/// Failures of the download/upload sequence are reported to the user through the
/// status notification and do not propagate. The downloaded file, if any, is gone
/// from disk by the time this returns.
///
/// # Errors
///
/// Returns an error only when the transport fails to send the rejection, the
/// status notification, or the final error text.
pub async fn handle_link(
    transport: &dyn ChatTransport,
    provider: Arc<dyn DownloadProvider>,
    settings: &Settings,
    text: &str,
) -> anyhow::Result<LinkOutcome> {
    let url = text.trim();

    if !is_supported_url(url) {
        transport.reply_text(views::INVALID_URL_TEXT, None).await?;
        return Ok(LinkOutcome::Rejected);
    }

    let status = transport.reply_text(views::DOWNLOADING_TEXT, None).await?;

    match fetch_and_deliver(transport, provider, settings, url, status).await {
        Ok(outcome) => Ok(outcome),
        Err(LinkError::Extraction(reason)) => {
            error!(url = %url, reason = %reason, "yt-dlp could not download media");
            transport
                .edit_text(status, views::EXTRACTION_FAILED_TEXT)
                .await?;
            Ok(LinkOutcome::ExtractionFailed)
        }
        Err(LinkError::Unexpected(e)) => {
            error!(url = %url, error = ?e, "Unexpected error while handling link");
            transport
                .edit_text(status, views::UNEXPECTED_ERROR_TEXT)
                .await?;
            Ok(LinkOutcome::Failed)
        }
    }
}

/// Download, enforce the ceiling, upload. The file guard drops on every return.
#[instrument(skip_all, fields(url = %url))]
async fn fetch_and_deliver(
    transport: &dyn ChatTransport,
    provider: Arc<dyn DownloadProvider>,
    settings: &Settings,
    url: &str,
    status: MessageId,
) -> Result<LinkOutcome, LinkError> {
    let file = download_offloaded(provider, url).await?;

    let size_bytes = file
        .size()
        .await
        .with_context(|| format!("reading size of {}", file.path().display()))?;

    if size_bytes > settings.max_file_size_bytes() {
        info!(
            size_bytes,
            max_mb = settings.max_file_size_mb,
            "Download exceeds size ceiling, not uploading"
        );
        transport
            .edit_text(
                status,
                &views::too_large_text(size_bytes, settings.max_file_size_mb),
            )
            .await?;
        return Ok(LinkOutcome::TooLarge { size_bytes });
    }

    transport.edit_text(status, views::UPLOADING_TEXT).await?;
    transport
        .reply_video(file.path(), views::SUCCESS_CAPTION)
        .await?;
    transport.delete_message(status).await?;

    info!(size_bytes, "Video delivered");
    Ok(LinkOutcome::Delivered)
}

/// Run the blocking provider on tokio's blocking pool and take ownership of its output.
async fn download_offloaded(
    provider: Arc<dyn DownloadProvider>,
    url: &str,
) -> Result<DownloadedFile, LinkError> {
    let url = url.to_owned();
    let path = tokio::task::spawn_blocking(move || {
        provider
            .download(&url)
            .map(|declared| resolve_output_path(&declared))
    })
    .await
    .map_err(|e| LinkError::Unexpected(anyhow!("download worker failed: {e}")))??;

    Ok(DownloadedFile::new(path))
}
