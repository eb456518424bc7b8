use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::MediaMetadata;
use crate::downloader::traits::{BackendRequest, ExtractionBackend};
use crate::downloader::utils::{last_line, run_output_with_timeout};

/// Extraction backend driving the `yt-dlp` binary
pub struct YtDlpBackend {
    ytdlp_bin: String,
    process_timeout: Duration,
}

impl YtDlpBackend {
    pub fn new(ytdlp_bin: impl Into<String>, process_timeout: Duration) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
            process_timeout,
        }
    }

    /// Build command arguments for one attempt
    pub fn build_args(url: &str, request: &BackendRequest) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--no-update".to_string(),
            // print the info JSON and still download
            "--dump-json".to_string(),
            "--no-simulate".to_string(),
            "-o".to_string(),
            request.output_template.to_string_lossy().to_string(),
            "-f".to_string(),
            request.format.clone(),
            "--merge-output-format".to_string(),
            request.merge_output_format.clone(),
            // remux only, and move the index up front for streaming playback
            "--ppa".to_string(),
            "Merger+ffmpeg:-c:v copy -c:a copy -movflags +faststart".to_string(),
            "--socket-timeout".to_string(),
            request.socket_timeout.to_string(),
            "--retries".to_string(),
            request.retries.to_string(),
        ];

        if let Some(ua) = &request.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.clone());
        }

        for (name, value) in &request.headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }

        if let Some(browser) = &request.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl ExtractionBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        url: &str,
        request: &BackendRequest,
    ) -> Result<MediaMetadata, DownloadError> {
        let args = Self::build_args(url, request);
        let output = run_output_with_timeout(&self.ytdlp_bin, &args, self.process_timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("yt-dlp exited with {}", output.status)
            } else {
                stderr
            };
            return Err(message.into());
        }

        // The file on disk is what counts; metadata is best effort
        match parse_metadata(&output.stdout) {
            Ok(meta) => Ok(meta),
            Err(e) => {
                warn!("yt-dlp metadata unreadable: {}", e);
                Ok(MediaMetadata::default())
            }
        }
    }
}

fn parse_metadata(stdout: &[u8]) -> Result<MediaMetadata, DownloadError> {
    let line = last_line(stdout);
    let meta: MediaMetadata = serde_json::from_str(&line)
        .map_err(|e| DownloadError::ParseError(format!("JSON parse error: {}", e)))?;
    debug!(?meta, "parsed yt-dlp metadata");
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{NetworkConfig, Platform};
    use crate::downloader::strategies::strategies_for;
    use std::path::PathBuf;

    fn request_for(platform: Platform, index: usize) -> BackendRequest {
        BackendRequest::from_strategy(
            &strategies_for(platform)[index],
            PathBuf::from("/tmp/w/attempt-1/raw_video.%(ext)s"),
            &NetworkConfig::default(),
        )
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_args_carry_strategy_options() {
        let req = request_for(Platform::TikTok, 1);
        let args = YtDlpBackend::build_args("https://vm.tiktok.com/ZM123/", &req);

        assert_eq!(value_after(&args, "-f"), Some("best[ext=mp4]/best"));
        assert_eq!(
            value_after(&args, "-o"),
            Some("/tmp/w/attempt-1/raw_video.%(ext)s")
        );
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "--socket-timeout"), Some("30"));
        assert_eq!(value_after(&args, "--retries"), Some("3"));
        assert!(value_after(&args, "--user-agent").unwrap().starts_with("TikTok"));
        assert!(!args.contains(&"--cookies-from-browser".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://vm.tiktok.com/ZM123/"));
    }

    #[test]
    fn test_cookie_strategy_has_no_user_agent() {
        let args = YtDlpBackend::build_args("u", &request_for(Platform::TikTok, 2));
        assert_eq!(value_after(&args, "--cookies-from-browser"), Some("chrome"));
        assert!(value_after(&args, "--user-agent").is_none());
    }

    #[test]
    fn test_headers_become_add_header() {
        let args = YtDlpBackend::build_args("u", &request_for(Platform::Instagram, 0));
        let headers: Vec<_> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "--add-header")
            .map(|(i, _)| args[i + 1].as_str())
            .collect();
        assert_eq!(headers.len(), 3);
        assert!(headers.contains(&"Sec-Fetch-Mode:navigate"));
    }

    #[test]
    fn test_parse_metadata_uses_last_json_line() {
        let stdout = b"[info] something\n{\"title\":\"Funny Clip\",\"vcodec\":\"h264\",\"width\":576,\"height\":1024,\"duration\":12.5}\n";
        let meta = parse_metadata(stdout).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Funny Clip"));
        assert_eq!(meta.width, Some(576));
        assert_eq!(meta.duration, Some(12.5));
    }

    #[test]
    fn test_parse_metadata_tolerates_nulls_and_extra_keys() {
        let stdout = br#"{"id":"7","title":null,"width":null,"height":720,"formats":[],"vcodec":"avc1.64001F"}"#;
        let meta = parse_metadata(stdout).unwrap();
        assert!(meta.title.is_none());
        assert!(meta.width.is_none());
        assert_eq!(meta.height, Some(720));
        assert_eq!(meta.display_title(), "Video");
    }

    #[test]
    fn test_parse_metadata_rejects_garbage() {
        assert!(matches!(
            parse_metadata(b"not json"),
            Err(DownloadError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let backend = YtDlpBackend::new("savebot-missing-yt-dlp", Duration::from_secs(5));
        let err = backend
            .download("https://vm.tiktok.com/x/", &request_for(Platform::TikTok, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }
}
