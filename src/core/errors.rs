use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("browser error: {0}")]
    BrowserError(#[from] chromiumoxide::error::CdpError),

    #[error("browser launch error: {0}")]
    LaunchError(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("timed out after {timeout:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        timeout: Duration,
    },

    #[error("extraction error: {0}")]
    ExtractionError(String),

    #[error("target site blocked the session: {0}")]
    Blocked(String),

    #[error("image download error: {0}")]
    DownloadError(String),

    #[error("image upload error: {0}")]
    UploadError(String),
}

impl ScrapeError {
    /// True for the selector-wait timeout the providers use to detect
    /// "no results rendered in time".
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScrapeError::Timeout { .. })
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
