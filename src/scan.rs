//! Discovery of unpublished posts.
//!
//! Walks one year of the storage tree and reconstructs a [`Post`] for every
//! directory that still carries the `img/` marker:
//!
//! ```text
//! content/post/                   # storage root
//! └── 2024/
//!     ├── 05/
//!     │   ├── 10/
//!     │   │   ├── index.md
//!     │   │   └── img/            # marker → Post(2024-05-10, 0)
//!     │   └── 10_1/
//!     │       └── img/            # marker → Post(2024-05-10, 1)
//!     └── 06/
//!         └── 01/
//!             └── index.md        # already published: skipped
//! ```
//!
//! Posts come back in lexical path order, which is the order `publish` works
//! through them.

use crate::naming::PathError;
use crate::types::{IMAGE_DIR, Post};
use chrono::Datelike;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{0}")]
    MalformedPath(#[from] PathError),
}

/// `0` means the current calendar year.
pub fn resolve_year(year: i32) -> i32 {
    if year == 0 {
        chrono::Local::now().year()
    } else {
        year
    }
}

/// Find every unpublished post of `year` under `root`.
pub fn scan(root: &Path, year: i32) -> Result<Vec<Post>, ScanError> {
    let year = resolve_year(year);
    let year_dir = root.join(format!("{year:04}"));
    debug!(path = %year_dir.display(), "Scanning for unpublished posts");

    let mut posts = Vec::new();
    let mut walker = WalkDir::new(&year_dir)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: year_dir.clone(),
            source,
        })?;

        if !entry.file_type().is_dir() || entry.file_name() != IMAGE_DIR {
            continue;
        }
        // Nothing below a marker directory is a post.
        walker.skip_current_dir();

        let Some(post_dir) = entry.path().parent() else {
            continue;
        };
        let relative = relative_post_path(root, post_dir);
        let post = Post::from_relative_path(root, &relative)?;
        debug!(post = %post.relative_path(), "Found unpublished post");
        posts.push(post);
    }

    Ok(posts)
}

/// `post_dir` relative to `root`, joined with `/`.
fn relative_post_path(root: &Path, post_dir: &Path) -> String {
    let relative = post_dir.strip_prefix(root).unwrap_or(post_dir);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn finds_posts_with_marker_directory() {
        let tmp = TempDir::new().unwrap();
        make_post_dir(tmp.path(), "2024/05/10", true);
        make_post_dir(tmp.path(), "2024/05/10_1", true);
        make_post_dir(tmp.path(), "2024/06/01", false);

        let posts = scan(tmp.path(), 2024).unwrap();
        assert_eq!(relative_paths(&posts), vec!["2024/05/10", "2024/05/10_1"]);
        assert_eq!(posts[0].date(), date(2024, 5, 10));
        assert_eq!(posts[0].sequence(), 0);
        assert_eq!(posts[1].sequence(), 1);
    }

    #[test]
    fn posts_come_back_in_path_order() {
        let tmp = TempDir::new().unwrap();
        make_post_dir(tmp.path(), "2024/12/01", true);
        make_post_dir(tmp.path(), "2024/01/31", true);
        make_post_dir(tmp.path(), "2024/01/02_2", true);
        make_post_dir(tmp.path(), "2024/01/02", true);

        let posts = scan(tmp.path(), 2024).unwrap();
        assert_eq!(
            relative_paths(&posts),
            vec!["2024/01/02", "2024/01/02_2", "2024/01/31", "2024/12/01"]
        );
    }

    #[test]
    fn other_years_are_ignored() {
        let tmp = TempDir::new().unwrap();
        make_post_dir(tmp.path(), "2023/05/10", true);
        make_post_dir(tmp.path(), "2024/05/10", true);

        let posts = scan(tmp.path(), 2023).unwrap();
        assert_eq!(relative_paths(&posts), vec!["2023/05/10"]);
    }

    #[test]
    fn files_named_img_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("2024/05/10");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("img"), "not a directory").unwrap();

        assert!(scan(tmp.path(), 2024).unwrap().is_empty());
    }

    #[test]
    fn nested_img_inside_marker_is_not_a_post() {
        let tmp = TempDir::new().unwrap();
        make_post_dir(tmp.path(), "2024/05/10", true);
        fs::create_dir_all(tmp.path().join("2024/05/10/img/img")).unwrap();

        let posts = scan(tmp.path(), 2024).unwrap();
        assert_eq!(relative_paths(&posts), vec!["2024/05/10"]);
    }

    #[test]
    fn empty_year_yields_no_posts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("2024/05")).unwrap();
        assert!(scan(tmp.path(), 2024).unwrap().is_empty());
    }

    #[test]
    fn missing_year_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            scan(tmp.path(), 2024),
            Err(ScanError::Walk { .. })
        ));
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(&tmp.path().join("nope"), 2024).is_err());
    }

    #[test]
    fn malformed_marker_location_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("2024/drafts/img")).unwrap();
        assert!(matches!(
            scan(tmp.path(), 2024),
            Err(ScanError::MalformedPath(_))
        ));
    }

    #[test]
    fn unpadded_marker_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        make_post_dir(tmp.path(), "2024/5/10", true);
        assert!(matches!(
            scan(tmp.path(), 2024),
            Err(ScanError::MalformedPath(_))
        ));
    }

    #[test]
    fn non_canonical_sequence_marker_is_error() {
        for rel in ["2024/05/11_01", "2024/05/12_0"] {
            let tmp = TempDir::new().unwrap();
            make_post_dir(tmp.path(), rel, true);
            assert!(
                matches!(scan(tmp.path(), 2024), Err(ScanError::MalformedPath(_))),
                "{rel}"
            );
        }
    }

    #[test]
    fn scanned_posts_point_at_existing_directories() {
        let tmp = TempDir::new().unwrap();
        make_post_dir(tmp.path(), "2024/05/10", true);
        make_post_dir(tmp.path(), "2024/05/10_2", true);

        for post in scan(tmp.path(), 2024).unwrap() {
            assert!(post.image_dir().is_dir(), "{}", post.relative_path());
        }
    }

    #[test]
    fn scanned_posts_round_trip_through_codec() {
        let tmp = TempDir::new().unwrap();
        let original = Post::new(tmp.path(), date(2024, 5, 10), 1);
        fs::create_dir_all(original.image_dir()).unwrap();

        let posts = scan(tmp.path(), 2024).unwrap();
        assert_eq!(posts, vec![original]);
    }

    #[test]
    fn year_zero_means_current_year() {
        assert_eq!(resolve_year(0), chrono::Local::now().year());
        assert_eq!(resolve_year(2019), 2019);
    }
}
