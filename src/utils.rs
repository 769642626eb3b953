//! Helpers shared across the pipeline.
//!
//! - Display helpers used by the chapter templates (compass points, times)
//! - Title keyword matching
//! - Image media-type sniffing for embedded lead images
//! - Log truncation and output directory validation

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Convert a bearing in degrees to a 16-point compass direction.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(degrees_to_cardinal(0.0), "N");
/// assert_eq!(degrees_to_cardinal(200.0), "SSW");
/// ```
pub fn degrees_to_cardinal(degrees: f64) -> &'static str {
    let ix = ((degrees + 11.25) / 22.5 - 0.02).floor() as i64;
    COMPASS[ix.rem_euclid(16) as usize]
}

/// `05/06, 02:30PM` style timestamp.
pub fn format_clock<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%m/%d, %I:%M%p").to_string()
}

/// `Tuesday 05/06` style date.
pub fn format_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%A %m/%d").to_string()
}

/// [`format_clock`] for UNIX seconds in local time.
pub fn sec_to_strftime(secs: i64) -> String {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .map(|dt| format_clock(&dt))
        .unwrap_or_default()
}

/// [`format_day`] for UNIX seconds in local time.
pub fn sec_to_day(secs: i64) -> String {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .map(|dt| format_day(&dt))
        .unwrap_or_default()
}

/// True when `title` contains any of `keywords`, ignoring case.
pub fn title_contains_any(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords
        .iter()
        .filter(|kw| !kw.is_empty())
        .any(|kw| title.contains(&kw.to_lowercase()))
}

/// Media type of an image, from its declared content type or its magic bytes.
///
/// Falls back to `image/jpeg`, which most readers will still try to decode.
pub fn image_media_type(content_type: Option<&str>, bytes: &[u8]) -> &'static str {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match declared.as_deref() {
        Some("image/jpeg") | Some("image/jpg") => return "image/jpeg",
        Some("image/png") => return "image/png",
        Some("image/gif") => return "image/gif",
        Some("image/webp") => return "image/webp",
        _ => {}
    }

    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// File extension for a media type produced by [`image_media_type`].
pub fn image_extension(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and byte count
/// indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_degrees_to_cardinal() {
        assert_eq!(degrees_to_cardinal(0.0), "N");
        assert_eq!(degrees_to_cardinal(11.0), "N");
        assert_eq!(degrees_to_cardinal(12.0), "NNE");
        assert_eq!(degrees_to_cardinal(90.0), "E");
        assert_eq!(degrees_to_cardinal(200.0), "SSW");
        assert_eq!(degrees_to_cardinal(270.0), "W");
        assert_eq!(degrees_to_cardinal(350.0), "N");
        assert_eq!(degrees_to_cardinal(360.0), "N");
    }

    #[test]
    fn test_format_clock_and_day() {
        let dt = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 5, 6, 14, 30, 0)
            .unwrap();
        assert_eq!(format_clock(&dt), "05/06, 02:30PM");
        assert_eq!(format_day(&dt), "Tuesday 05/06");
        assert_eq!(format_day(&dt.with_timezone(&Utc)), "Tuesday 05/06");
    }

    #[test]
    fn test_title_contains_any() {
        let keywords = vec!["video:".to_string(), String::new()];
        assert!(title_contains_any("VIDEO: Flooding downtown", &keywords));
        assert!(!title_contains_any("Flooding downtown", &keywords));
        assert!(!title_contains_any("anything", &[]));
    }

    #[test]
    fn test_image_media_type() {
        assert_eq!(image_media_type(Some("image/png; q=1"), b""), "image/png");
        assert_eq!(image_media_type(Some("IMAGE/JPG"), b""), "image/jpeg");
        assert_eq!(image_media_type(None, b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(image_media_type(Some("application/octet-stream"), b"GIF89a"), "image/gif");
        assert_eq!(image_media_type(None, b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(image_media_type(None, b"\xff\xd8\xff"), "image/jpeg");
        assert_eq!(image_extension("image/webp"), "webp");
        assert_eq!(image_extension("image/jpeg"), "jpg");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("ééé", 1);
        assert_eq!(result, "é…(+4 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("books/today");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }
}
