//! Shared test utilities: building storage trees and staging files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let post = scaffolded_post(tmp.path(), "2024/05/10");
//! stage_files(&post, &["IMG_1.JPG", "notes.txt"]);
//! ```

use crate::config::TemplateConfig;
use crate::scaffold::scaffold;
use crate::types::Post;
use std::path::Path;

// =========================================================================
// Storage tree setup
// =========================================================================

/// Create `root/<relative>` and, if `marker`, its `img/` directory.
pub fn make_post_dir(root: &Path, relative: &str, marker: bool) {
    let dir = root.join(relative);
    std::fs::create_dir_all(&dir).unwrap();
    if marker {
        std::fs::create_dir_all(dir.join("img")).unwrap();
    }
}

/// Scaffold a post at `relative` with the default template.
pub fn scaffolded_post(root: &Path, relative: &str) -> Post {
    let post = Post::from_relative_path(root, relative).unwrap();
    scaffold(&post, &TemplateConfig::default()).unwrap();
    post
}

/// Drop placeholder files into the post's staging directory.
pub fn stage_files(post: &Post, names: &[&str]) {
    for name in names {
        std::fs::write(post.staging_dir().join(name), format!("source:{name}")).unwrap();
    }
}

/// Drop placeholder files into the post's published image directory.
pub fn put_images(post: &Post, names: &[&str]) {
    for name in names {
        std::fs::write(post.image_dir().join(name), format!("image:{name}")).unwrap();
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Relative paths of scanned posts, in order.
pub fn relative_paths(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.relative_path()).collect()
}

/// Sorted file names in a directory. Panics if it cannot be read.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Content file text. Panics if missing.
pub fn content_of(post: &Post) -> String {
    std::fs::read_to_string(post.content_file())
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", post.content_file().display()))
}
