use once_cell::sync::Lazy;
use regex::Regex;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(www\.|m\.|music\.)?(youtube\.com/watch\?v=|youtu\.be/)[a-zA-Z0-9_-]{6,}")
        .unwrap()
});

static VIDEO_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[?&]v=|youtu\.be/)([a-zA-Z0-9_-]{6,})").unwrap());

/// Validate a URL against the recognized YouTube grammar
pub fn is_valid_youtube_url(url: &str) -> bool {
    if url.len() > 2048 {
        return false;
    }
    URL_REGEX.is_match(url)
}

/// Extract the video ID from a watch or short-link URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_REGEX
        .captures(url)
        .map(|captures| captures[1].to_string())
}

/// Format a byte count as megabytes with two decimals ("4.20")
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(is_valid_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_valid_youtube_url(
            "http://m.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_youtube_url("not-a-url"));
        assert!(!is_valid_youtube_url("https://example.com/watch?v=abcdefg"));
        assert!(!is_valid_youtube_url(
            "https://www.youtube.com/playlist?list=PL123456"
        ));
        assert!(!is_valid_youtube_url(""));
        let oversized = format!(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&junk={}",
            "x".repeat(3000)
        );
        assert!(!is_valid_youtube_url(&oversized));
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("https://example.com"), None);
    }

    #[test]
    fn test_format_size_mb() {
        assert_eq!(format_size_mb(0), "0.00");
        assert_eq!(format_size_mb(1024 * 1024), "1.00");
        assert_eq!(format_size_mb(5 * 1024 * 1024 + 512 * 1024), "5.50");
    }
}
