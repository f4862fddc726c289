use serde::Serialize;

/// Closed set of failure classes recognized from backend error output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Sign-in / bot-detection challenge. A property of the request
    /// itself, so no other tool or configuration can fix it.
    AuthRequired,
    /// The URL itself is unusable
    InvalidInput,
    /// Network trouble, rate limiting, timeouts
    Transient,
    /// The tool binary is missing or broken
    ToolUnavailable,
    Unknown,
}

/// Map raw stderr/stdout from a backend into a [`FailureKind`].
///
/// Substring matching over known platform phrases. False negatives fall
/// through to `Transient`/`Unknown`, which only costs an extra retry.
pub fn classify(error_text: &str) -> FailureKind {
    let lower = error_text.to_lowercase();

    // Sign-in and bot challenges first: these short-circuit the cascade
    if lower.contains("sign in to confirm")
        || lower.contains("confirm you're not a bot")
        || lower.contains("confirm you are not a bot")
        || lower.contains("use --cookies")
        || lower.contains("login required")
        || lower.contains("requires authentication")
        || lower.contains("captcha")
    {
        return FailureKind::AuthRequired;
    }

    if lower.contains("unsupported url")
        || lower.contains("is not a valid url")
        || lower.contains("invalid url")
        || lower.contains("incomplete youtube id")
    {
        return FailureKind::InvalidInput;
    }

    // Only spawn-level phrases: a bare "not found" would swallow
    // ordinary HTTP 404 errors from the platform
    if lower.contains("command not found")
        || lower.contains("no such file")
        || lower.contains("not recognized as an internal")
        || lower.contains("module not found")
        || lower.contains("no module named")
        || lower.contains("failed to spawn")
    {
        return FailureKind::ToolUnavailable;
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("429")
        || lower.contains("too many requests")
        || lower.contains("rate limit")
        || lower.contains("connection reset")
        || lower.contains("connection refused")
        || lower.contains("network")
        || lower.contains("temporary failure")
        || lower.contains("503")
    {
        return FailureKind::Transient;
    }

    FailureKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_challenge_detection() {
        let error = "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot. \
                     Use --cookies-from-browser or --cookies for the authentication.";
        assert_eq!(classify(error), FailureKind::AuthRequired);
    }

    #[test]
    fn test_login_required_detection() {
        assert_eq!(
            classify("ERROR: This video is only available for registered users. Login required"),
            FailureKind::AuthRequired
        );
    }

    #[test]
    fn test_unsupported_url_detection() {
        assert_eq!(
            classify("ERROR: Unsupported URL: https://example.com/clip"),
            FailureKind::InvalidInput
        );
    }

    #[test]
    fn test_tool_missing_detection() {
        assert_eq!(
            classify("sh: yt-dlp: command not found"),
            FailureKind::ToolUnavailable
        );
        assert_eq!(
            classify("/usr/bin/python3: No module named yt_dlp"),
            FailureKind::ToolUnavailable
        );
    }

    #[test]
    fn test_rate_limit_detection() {
        assert_eq!(
            classify("ERROR: HTTP Error 429: Too Many Requests"),
            FailureKind::Transient
        );
    }

    #[test]
    fn test_timeout_detection() {
        assert_eq!(
            classify("ERROR: unable to download video data: The read operation timed out"),
            FailureKind::Transient
        );
    }

    #[test]
    fn test_http_404_is_not_tool_unavailable() {
        // A missing video must not skip the backend's remaining variants
        assert_eq!(
            classify("ERROR: HTTP Error 404: Not Found"),
            FailureKind::Unknown
        );
    }

    #[test]
    fn test_unknown_fallthrough() {
        assert_eq!(classify("something completely unexpected"), FailureKind::Unknown);
        assert_eq!(classify(""), FailureKind::Unknown);
    }

    #[test]
    fn test_auth_wins_over_transient() {
        // A bot challenge wrapped in network noise must still terminate the cascade
        let error = "WARNING: retrying after network error\nERROR: Sign in to confirm you're not a bot";
        assert_eq!(classify(error), FailureKind::AuthRequired);
    }
}
