//! Shared types used across all pipeline stages.
//!
//! A [`Post`] is an immutable snapshot of one dated content folder. It is built
//! either from explicit input (the `new` command) or from a scan (the `publish`
//! command) and is never mutated afterwards; every path a stage touches is
//! derived from it.

use crate::naming::{self, PathError};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Content file name inside each post directory.
pub const CONTENT_FILE: &str = "index.md";
/// Staging subdirectory for source images awaiting processing.
pub const STAGING_DIR: &str = "img_src";
/// Published image subdirectory. Its presence marks a post as unpublished.
pub const IMAGE_DIR: &str = "img";

/// One dated content unit with an optional same-day sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    date: NaiveDate,
    sequence: u32,
    /// `YYYY/MM/DD[_N]`, always `/`-separated.
    relative_path: String,
    /// Storage root joined with `relative_path`.
    dir: PathBuf,
}

/// Where a post sits in its lifecycle, read from the filesystem.
///
/// Publishing is one-way: once the marker directory is gone the post is never
/// picked up by a scan again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostState {
    /// No post directory on disk.
    Missing,
    /// Directory exists and still carries the `img/` marker.
    Unpublished,
    /// Directory exists, marker is gone.
    Published,
}

impl Post {
    pub fn new(storage_root: &Path, date: NaiveDate, sequence: u32) -> Self {
        let relative_path = naming::encode_post_path(date, sequence);
        let dir = relative_path
            .split('/')
            .fold(storage_root.to_path_buf(), |acc, part| acc.join(part));
        Self {
            date,
            sequence,
            relative_path,
            dir,
        }
    }

    /// Rebuild a post from its storage-relative path (`2024/05/10_1`).
    pub fn from_relative_path(storage_root: &Path, relative: &str) -> Result<Self, PathError> {
        let (date, sequence) = naming::decode_post_path(relative)?;
        Ok(Self::new(storage_root, date, sequence))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slug(&self) -> String {
        naming::post_slug(self.date, self.sequence)
    }

    pub fn content_file(&self) -> PathBuf {
        self.dir.join(CONTENT_FILE)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.dir.join(STAGING_DIR)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.dir.join(IMAGE_DIR)
    }

    pub fn state(&self) -> PostState {
        if !self.dir.is_dir() {
            PostState::Missing
        } else if self.image_dir().is_dir() {
            PostState::Unpublished
        } else {
            PostState::Published
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn paths_derive_from_date_and_sequence() {
        let post = Post::new(Path::new("/blog"), date(2024, 5, 10), 1);
        assert_eq!(post.relative_path(), "2024/05/10_1");
        assert_eq!(post.dir(), Path::new("/blog/2024/05/10_1"));
        assert_eq!(post.content_file(), Path::new("/blog/2024/05/10_1/index.md"));
        assert_eq!(post.staging_dir(), Path::new("/blog/2024/05/10_1/img_src"));
        assert_eq!(post.image_dir(), Path::new("/blog/2024/05/10_1/img"));
    }

    #[test]
    fn slug_matches_naming() {
        let post = Post::new(Path::new("/blog"), date(2024, 5, 10), 0);
        assert_eq!(post.slug(), "20240510");
    }

    #[test]
    fn from_relative_path_round_trips() {
        let post = Post::from_relative_path(Path::new("/blog"), "2024/05/10_1").unwrap();
        assert_eq!(post, Post::new(Path::new("/blog"), date(2024, 5, 10), 1));
    }

    #[test]
    fn from_relative_path_rejects_garbage() {
        assert!(Post::from_relative_path(Path::new("/blog"), "drafts/x").is_err());
    }

    #[test]
    fn state_follows_marker_directory() {
        let tmp = TempDir::new().unwrap();
        let post = Post::new(tmp.path(), date(2024, 5, 10), 0);
        assert_eq!(post.state(), PostState::Missing);

        std::fs::create_dir_all(post.image_dir()).unwrap();
        assert_eq!(post.state(), PostState::Unpublished);

        std::fs::remove_dir(post.image_dir()).unwrap();
        assert_eq!(post.state(), PostState::Published);
    }
}
