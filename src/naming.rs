//! Centralized name conventions: post directory paths and staged image filenames.
//!
//! ## Post paths
//!
//! Every post lives at `YYYY/MM/DD[_N]` under the storage root. The suffix is
//! the same-day sequence number and only appears when it is non-zero, so the
//! first post of a day has no suffix at all:
//!
//! - `(2024-05-10, 0)` ↔ `"2024/05/10"`
//! - `(2024-05-10, 1)` ↔ `"2024/05/10_1"`
//! - `(2024-05-10, 12)` ↔ `"2024/05/10_12"`
//!
//! [`encode_post_path`] and [`decode_post_path`] are exact inverses for every
//! valid date and sequence number. Paths always use `/`, whatever the platform,
//! because the same string is reused in object keys and URLs.
//!
//! ## Image names
//!
//! Staged images are renamed when they are transcoded into `img/`:
//!
//! - `IMG_Photo.HEIC` → `iphoto.jpg` (camera prefix shortened, forced JPEG)
//! - `Cover.PNG` → `cover.png` (PNG keeps its format)
//! - `sunset.JPEG` → `sunset.jpg`

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Extensions accepted in the staging directory (compared lower-cased).
pub const STAGED_IMAGE_EXTENSIONS: &[&str] = &["heic", "webp", "avif", "jpg", "jpeg", "png"];

/// Prefix cameras put on every file; shortened to `i` on import.
const CAMERA_PREFIX: &str = "IMG_";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Malformed post path '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl PathError {
    fn malformed(path: &str, reason: impl Into<String>) -> Self {
        PathError::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Build the relative path `YYYY/MM/DD[_N]` for a post.
pub fn encode_post_path(date: NaiveDate, sequence: u32) -> String {
    let base = format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day());
    if sequence > 0 {
        format!("{base}_{sequence}")
    } else {
        base
    }
}

/// Recover `(date, sequence)` from a relative post path.
///
/// Accepts both `/` and `\` as separators. Only paths [`encode_post_path`]
/// could have produced are accepted: exactly three components, a 4-digit
/// year, 2-digit month and day, and an optional `_N` suffix with `N > 0` and
/// no leading zero.
pub fn decode_post_path(path: &str) -> Result<(NaiveDate, u32), PathError> {
    let parts: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() != 3 {
        return Err(PathError::malformed(
            path,
            format!("expected YYYY/MM/DD[_N], found {} components", parts.len()),
        ));
    }

    let (day_part, sequence) = match parts[2].split_once('_') {
        Some((day, seq)) => (day, parse_sequence(path, seq)?),
        None => (parts[2], 0),
    };

    let year = parse_field::<i32>(path, "year", parts[0], 4)?;
    let month = parse_field::<u32>(path, "month", parts[1], 2)?;
    let day = parse_field::<u32>(path, "day", day_part, 2)?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PathError::malformed(path, "not a calendar date"))?;

    Ok((date, sequence))
}

/// A fixed-width, digits-only field.
fn parse_field<T: std::str::FromStr>(
    path: &str,
    what: &str,
    raw: &str,
    width: usize,
) -> Result<T, PathError> {
    if raw.len() != width || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(PathError::malformed(
            path,
            format!("bad {what} '{raw}', expected {width} digits"),
        ));
    }
    raw.parse()
        .map_err(|_| PathError::malformed(path, format!("bad {what} '{raw}'")))
}

/// The `N` of a `_N` suffix: digits only, non-zero, no leading zero.
fn parse_sequence(path: &str, raw: &str) -> Result<u32, PathError> {
    let bad = || PathError::malformed(path, format!("bad sequence number '{raw}'"));
    if raw.is_empty() || raw.starts_with('0') || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    raw.parse().map_err(|_| bad())
}

/// Post slug: compact date, followed by the sequence number when non-zero.
///
/// - `(2024-05-10, 0)` → `"20240510"`
/// - `(2024-05-10, 2)` → `"202405102"`
pub fn post_slug(date: NaiveDate, sequence: u32) -> String {
    let compact = date.format("%Y%m%d").to_string();
    if sequence > 0 {
        format!("{compact}{sequence}")
    } else {
        compact
    }
}

/// Lower-cased extension of a filename, if it has one.
pub fn extension_lower(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Whether a staged file has one of the accepted image extensions.
pub fn is_staged_image(filename: &str) -> bool {
    extension_lower(filename).is_some_and(|ext| STAGED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Destination filename for a staged image, or `None` if it is not an image.
///
/// Steps, in order: a leading `IMG_` (case-sensitive) becomes `i`; the
/// extension becomes `.jpg` unless the source was PNG; the result is
/// lower-cased.
pub fn normalize_image_name(filename: &str) -> Option<String> {
    if !is_staged_image(filename) {
        return None;
    }
    let ext = extension_lower(filename)?;

    let renamed = match filename.strip_prefix(CAMERA_PREFIX) {
        Some(rest) => format!("i{rest}"),
        None => filename.to_string(),
    };

    let renamed = if ext == "png" {
        renamed
    } else {
        // Extension length is unchanged by the prefix rewrite above.
        let stem_len = renamed.len() - ext.len();
        format!("{}jpg", &renamed[..stem_len])
    };

    Some(renamed.to_lowercase())
}

/// Cover images are exempt from unused-image pruning.
pub fn is_cover_image(filename: &str) -> bool {
    filename.starts_with("cover.")
}
