// Error types for the download pipeline

use thiserror::Error;

use super::diagnostics::{diagnose_error, BlockingReason};

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// Network timeout while talking to the platform
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// The platform refused access (private post, login wall)
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// yt-dlp or ffmpeg not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The backend does not recognize the URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse backend JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Unknown error with details
    #[error("{0}")]
    Unknown(String),
}

impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        // Platform-side refusals share their patterns with the engine's diagnosis
        match diagnose_error(&s) {
            Some(reason) if reason.is_fatal() => return Self::AccessDenied(s),
            Some(BlockingReason::NetworkTimeout) => return Self::NetworkTimeout(s),
            Some(BlockingReason::UnsupportedUrl) => return Self::InvalidUrl(s),
            _ => {}
        }

        let lower = s.to_lowercase();
        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid url") {
            return Self::InvalidUrl(s);
        }

        if lower.contains("json") {
            return Self::ParseError(s);
        }

        Self::Unknown(s)
    }
}

impl From<&str> for DownloadError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

/// Failure of a child process started through `utils::run_output_with_timeout`
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("i/o error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ProcessError> for DownloadError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::Spawn { .. } => Self::ToolNotFound(e.to_string()),
            ProcessError::Timeout { .. } => Self::NetworkTimeout(e.to_string()),
            ProcessError::Io { .. } => Self::ExecutionError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_text_is_access_denied() {
        let err = DownloadError::from("ERROR: [Instagram] abc: login required to view".to_string());
        assert!(matches!(err, DownloadError::AccessDenied(_)));
    }

    #[test]
    fn private_text_is_access_denied() {
        let err = DownloadError::from("This account is Private");
        assert!(matches!(err, DownloadError::AccessDenied(_)));
    }

    #[test]
    fn timeout_text_is_network_timeout() {
        let err = DownloadError::from("Read timed out. (read timeout=30)");
        assert!(matches!(err, DownloadError::NetworkTimeout(_)));
    }

    #[test]
    fn classification_agrees_with_diagnosis() {
        let err = DownloadError::from("Please sign in to view this video");
        assert!(matches!(err, DownloadError::AccessDenied(_)));

        let err = DownloadError::from("ERROR: Unsupported URL: https://example.com");
        assert!(matches!(err, DownloadError::InvalidUrl(_)));

        // Rate limits are worth another strategy, so they stay generic
        let err = DownloadError::from("HTTP Error 429: Too Many Requests");
        assert!(matches!(err, DownloadError::Unknown(_)));
    }

    #[test]
    fn unknown_keeps_message_verbatim() {
        let err = DownloadError::from("HTTP Error 404: Not Found");
        assert_eq!(err.to_string(), "HTTP Error 404: Not Found");
    }

    #[test]
    fn spawn_failure_maps_to_tool_not_found() {
        let err: DownloadError = ProcessError::Spawn {
            program: "yt-dlp".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }
        .into();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }
}
