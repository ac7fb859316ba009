//! Archive file naming.
//!
//! Two policies: one `.warc` file per archived URL (filesystem-safe
//! transform of the URL plus a date stamp), or a single fixed-name file
//! that the whole crawl appends to.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Per-URL archive path: `<output>/<sanitized-url>-<YYYYmmddHHMMSSfff>.warc`.
///
/// The stamp carries milliseconds so the same URL archived twice within a
/// second (reachable from two seeds) gets distinct files instead of the
/// second truncating the first.
#[must_use]
pub fn warc_path_for_url(output_dir: &Path, url: &str, now: DateTime<Utc>) -> PathBuf {
    let flattened = url
        .trim_end_matches('/')
        .replace("://", "_")
        .replace('/', "_");
    let safe = sanitize_filename::sanitize(flattened);
    let stamp = now.format("%Y%m%d%H%M%S%3f");
    output_dir.join(format!("{safe}-{stamp}.warc"))
}

/// Fixed-name archive path for append mode.
#[must_use]
pub fn warc_path_fixed(output_dir: &Path, name: &str) -> PathBuf {
    let safe = sanitize_filename::sanitize(name);
    if safe.ends_with(".warc") {
        output_dir.join(safe)
    } else {
        output_dir.join(format!("{safe}.warc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn url_paths_are_filesystem_safe_and_stamped() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();
        let path = warc_path_for_url(Path::new("/tmp/archives"), "https://ex.com/a/b", now);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "https_ex.com_a_b-20260829120000000.warc");
        assert!(!name.contains('/'));
    }

    #[test]
    fn same_url_within_one_second_gets_distinct_paths() {
        let base = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();
        let first = warc_path_for_url(Path::new("out"), "https://ex.com/page", base);
        let second = warc_path_for_url(
            Path::new("out"),
            "https://ex.com/page",
            base + chrono::Duration::milliseconds(250),
        );
        assert_ne!(first, second);
    }

    #[test]
    fn fixed_paths_get_warc_extension_once() {
        assert_eq!(
            warc_path_fixed(Path::new("out"), "crawl"),
            Path::new("out").join("crawl.warc")
        );
        assert_eq!(
            warc_path_fixed(Path::new("out"), "crawl.warc"),
            Path::new("out").join("crawl.warc")
        );
    }
}
