use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?(?:[^#\s]*&)?v=)([A-Za-z0-9_-]{11})",
        r"(?:youtu\.be/)([A-Za-z0-9_-]{11})",
        r"(?:youtube\.com/embed/)([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static BARE_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").ok());

/// True when `candidate` is exactly an 11 character video id.
pub fn is_valid_video_id(candidate: &str) -> bool {
    BARE_ID
        .as_ref()
        .is_some_and(|re| re.is_match(candidate))
}

/// Pulls a video id out of a watch, short or embed URL, or accepts a bare id.
pub fn extract_video_id(text: &str) -> Option<String> {
    let text = text.trim();
    for pattern in URL_PATTERNS.iter() {
        if let Some(id) = pattern.captures(text).and_then(|c| c.get(1)) {
            return Some(id.as_str().to_string());
        }
    }
    is_valid_video_id(text).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42")
                .as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_extract_bare_id() {
        assert_eq!(extract_video_id(" dQw4w9WgXcQ ").as_deref(), Some("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("a-b_c1234XY"));
    }

    #[test]
    fn test_extract_rejects() {
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id("short"), None);
        assert_eq!(extract_video_id("has spaces in it"), None);
        assert!(!is_valid_video_id("dQw4w9WgXcQQ"));
    }
}
