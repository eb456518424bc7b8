// Extraction backend trait definition

use async_trait::async_trait;
use std::path::PathBuf;

use super::errors::DownloadError;
use super::models::{MediaMetadata, NetworkConfig};
use super::strategies::{ExtractionStrategy, MERGE_OUTPUT_FORMAT};

/// Everything the backend needs for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    /// yt-dlp style output template, e.g. `/tmp/x/attempt-1/raw_video.%(ext)s`
    pub output_template: PathBuf,
    pub format: String,
    pub merge_output_format: String,
    pub user_agent: Option<String>,
    pub headers: Vec<(String, String)>,
    pub cookies_from_browser: Option<String>,
    pub socket_timeout: u32,
    pub retries: u32,
}

impl BackendRequest {
    pub fn from_strategy(
        strategy: &ExtractionStrategy,
        output_template: PathBuf,
        network: &NetworkConfig,
    ) -> Self {
        Self {
            output_template,
            format: strategy.format.to_string(),
            merge_output_format: MERGE_OUTPUT_FORMAT.to_string(),
            user_agent: strategy.user_agent.map(str::to_string),
            headers: strategy
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cookies_from_browser: strategy.cookies_from_browser.map(str::to_string),
            socket_timeout: network.socket_timeout,
            retries: network.retries,
        }
    }
}

/// Pluggable media extraction capability
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Download `url` according to `request`, writing the file next to the
    /// output template. Error text may carry "login"/"private" markers.
    async fn download(
        &self,
        url: &str,
        request: &BackendRequest,
    ) -> Result<MediaMetadata, DownloadError>;
}
