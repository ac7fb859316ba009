//! Link-inclusion filters for the frontier.
//!
//! These decide whether a discovered link is worth scheduling: scheme
//! validity, known-binary extension exclusion, and same-domain scoping.
//! Excluded links still end up in the archive's outlinks metadata; they are
//! just never navigated to.

use url::Url;

/// File extensions that never resolve to crawlable HTML: images, audio,
/// video, fonts, executables, and archives. Links to these are recorded as
/// outlinks but not scheduled for navigation.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // images
    "ico", "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "svg", "psd",
    // audio
    "mp3", "wav", "ogg", "oga", "flac", "aac", "m4a", "mid", "midi",
    // video
    "mp4", "m4v", "webm", "mkv", "avi", "mov", "wmv", "flv", "mpg", "mpeg", "3gp",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // documents and executables
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "exe", "msi", "bin", "dmg", "apk", "iso",
    // archives
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar", "war",
];

/// Normalize a URL for frontier membership comparison.
///
/// Parses, lowercases the host, and strips the fragment so trivially
/// different spellings of the same resource collapse to one frontier
/// entry. Returns `None` for unparseable or non-http(s) URLs.
#[must_use]
pub fn normalize_for_dedup(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Registrable-domain approximation: lowercased host with a leading `www.`
/// stripped. Good enough for same-domain scoping without a public-suffix
/// table.
#[must_use]
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// True when the two URLs share a registrable domain.
#[must_use]
pub fn same_domain(a: &str, b: &str) -> bool {
    match (registrable_domain(a), registrable_domain(b)) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}

/// True when the URL's path ends in an extension from the exclusion list.
/// URLs with no extension pass.
#[must_use]
pub fn has_excluded_extension(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path();
    let Some(last_segment) = path.rsplit('/').next() else {
        return false;
    };
    let Some((_, ext)) = last_segment.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_lowercase();
    EXCLUDED_EXTENSIONS.contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_fragments_and_rejects_non_http() {
        assert_eq!(
            normalize_for_dedup("https://Example.com/page#section").as_deref(),
            Some("https://example.com/page")
        );
        assert!(normalize_for_dedup("javascript:void(0)").is_none());
        assert!(normalize_for_dedup("mailto:me@example.com").is_none());
        assert!(normalize_for_dedup("not a url").is_none());
    }

    #[test]
    fn domain_comparison_ignores_www_and_case() {
        assert!(same_domain("https://www.example.com/a", "https://EXAMPLE.com/b"));
        assert!(!same_domain("https://example.com/a", "https://other.com/c"));
    }

    #[test]
    fn binary_extensions_are_excluded() {
        assert!(has_excluded_extension("https://example.com/logo.PNG"));
        assert!(has_excluded_extension("https://example.com/dl/archive.tar.gz"));
        assert!(!has_excluded_extension("https://example.com/page"));
        assert!(!has_excluded_extension("https://example.com/page.html"));
    }
}
