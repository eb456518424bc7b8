// Failure diagnostics - identifies why a platform refused a download
//
// Analyzes backend error text to determine:
// - Type of blocking (login wall, private post, rate limit, ...)
// - Whether another strategy is worth trying

/// Reasons why a platform might refuse a download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// Login wall
    LoginRequired,

    /// Private account or post
    PrivateContent,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Network timeout
    NetworkTimeout,

    /// HTTP 403 Forbidden
    Http403Forbidden,

    /// Post deleted or unavailable
    Unavailable,

    /// Backend does not understand the URL
    UnsupportedUrl,
}

impl BlockingReason {
    /// Fatal reasons end the request: a different identity will not help
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LoginRequired | Self::PrivateContent)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::LoginRequired => "Login required",
            Self::PrivateContent => "Private content",
            Self::RateLimited => "Rate limited by the platform",
            Self::NetworkTimeout => "Network timeout",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::Unavailable => "Video unavailable",
            Self::UnsupportedUrl => "URL not recognized by the backend",
        }
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    // Check patterns in order of specificity

    if lower.contains("login") || lower.contains("log in") || lower.contains("sign in") {
        return Some(BlockingReason::LoginRequired);
    }

    if lower.contains("private") {
        return Some(BlockingReason::PrivateContent);
    }

    if lower.contains("429") || lower.contains("too many requests") || lower.contains("rate-limit")
        || lower.contains("rate limit")
    {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("timed out") || lower.contains("timeout") {
        return Some(BlockingReason::NetworkTimeout);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("unsupported url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    if lower.contains("404")
        || lower.contains("not available")
        || lower.contains("unavailable")
        || lower.contains("has been removed")
    {
        return Some(BlockingReason::Unavailable);
    }

    None
}
