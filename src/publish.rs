//! Publishing: push a post's images to object storage and point its links there.
//!
//! ## Steps
//!
//! For one post, in this order, with no retry and no rollback:
//!
//! 1. **Prune**: delete files in `img/` whose name appears nowhere in
//!    `index.md`. Files starting with `cover.` are always kept.
//! 2. **Upload**: `put` every remaining file under
//!    `<key_prefix>/<YYYY/MM/DD[_N]>/img/<file>`.
//! 3. **Rewrite**: point `](img/…)` links and the `image:` cover field at
//!    the remote URL (see [`crate::rewrite`]).
//! 4. **Cleanup**: remove `img/` and `img_src/`.
//!
//! A failure at any step leaves earlier steps applied. Because `img/` is the
//! marker a scan looks for, a post that failed before cleanup is picked up
//! again by the next run.
//!
//! A post with no `img/` directory is already published: nothing happens.
//!
//! ## Year batch
//!
//! [`publish_year`] scans one year and publishes each post in scan order,
//! stopping at the first failure.

use crate::config::RemoteConfig;
use crate::naming;
use crate::rewrite::{self, CoverImage};
use crate::scan::{self, ScanError};
use crate::storage::{ObjectStore, StoreError, content_type_for};
use crate::types::{Post, PostState};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Upload of {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Publishing {post} failed: {source}")]
    Publish {
        post: String,
        #[source]
        source: PublishError,
    },
}

/// What publishing one post did.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PublishReport {
    /// The post had no `img/` directory; nothing was done.
    pub skipped: bool,
    /// Files deleted from `img/` as unreferenced.
    pub pruned: Vec<String>,
    /// Object keys written, in upload order.
    pub uploaded: Vec<String>,
    /// Cover image the frontmatter ended up pointing at.
    pub cover: Option<CoverImage>,
}

/// Result of publishing a whole year.
#[derive(Debug, Default)]
pub struct YearReport {
    pub year: i32,
    /// Each published post's relative path and report, in scan order.
    pub posts: Vec<(String, PublishReport)>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PublishError + '_ {
    move |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Publish one post.
pub fn publish(
    store: &impl ObjectStore,
    post: &Post,
    remote: &RemoteConfig,
) -> Result<PublishReport, PublishError> {
    let state = post.state();
    if state != PostState::Unpublished {
        debug!(post = %post.relative_path(), ?state, "Not unpublished, nothing to publish");
        return Ok(PublishReport {
            skipped: true,
            ..PublishReport::default()
        });
    }

    let mut report = PublishReport {
        pruned: prune_unused(post)?,
        ..PublishReport::default()
    };
    report.uploaded = upload_images(store, post, remote)?;
    report.cover = Some(rewrite_content(post, remote)?);
    remove_image_dirs(post)?;

    info!(
        post = %post.relative_path(),
        uploaded = report.uploaded.len(),
        pruned = report.pruned.len(),
        "Published post"
    );
    Ok(report)
}

/// Delete files in `img/` that the content file never mentions. Returns their names.
pub fn prune_unused(post: &Post) -> Result<Vec<String>, PublishError> {
    let content_path = post.content_file();
    let content = fs::read(&content_path).map_err(io_error(&content_path))?;

    let mut pruned = Vec::new();
    for (name, path) in image_files(&post.image_dir())? {
        if naming::is_cover_image(&name) || contains_bytes(&content, name.as_bytes()) {
            continue;
        }
        fs::remove_file(&path).map_err(io_error(&path))?;
        debug!(file = %name, "Removed unused image");
        pruned.push(name);
    }
    Ok(pruned)
}

/// Byte-level substring search; the content file need not be UTF-8.
fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Upload every file in `img/`. Returns the keys written.
pub fn upload_images(
    store: &impl ObjectStore,
    post: &Post,
    remote: &RemoteConfig,
) -> Result<Vec<String>, PublishError> {
    let mut uploaded = Vec::new();
    for (name, path) in image_files(&post.image_dir())? {
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        let key = remote.object_key(post.relative_path(), &name);

        store
            .put(&key, &bytes, &content_type_for(&path))
            .map_err(|source| PublishError::Upload {
                key: key.clone(),
                source,
            })?;
        info!(key = %key, "Uploaded image");
        uploaded.push(key);
    }
    Ok(uploaded)
}

/// Rewrite the content file's image links to remote URLs.
pub fn rewrite_content(post: &Post, remote: &RemoteConfig) -> Result<CoverImage, PublishError> {
    let content_path = post.content_file();
    let content = fs::read_to_string(&content_path).map_err(io_error(&content_path))?;

    let cover = CoverImage::detect(&post.image_dir());
    let remote_dir = remote.remote_post_dir(post.relative_path());
    let rewritten = rewrite::rewrite_links(&content, &remote_dir, cover);

    fs::write(&content_path, rewritten).map_err(io_error(&content_path))?;
    debug!(path = %content_path.display(), cover = ?cover, "Rewrote image links");
    Ok(cover)
}

/// Remove `img/` and `img_src/`. Missing directories are fine.
pub fn remove_image_dirs(post: &Post) -> Result<(), PublishError> {
    for dir in [post.image_dir(), post.staging_dir()] {
        match fs::remove_dir_all(&dir) {
            Ok(()) => debug!(path = %dir.display(), "Removed directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&dir)(e)),
        }
    }
    Ok(())
}

/// Publish every unpublished post of `year` under `root`, in scan order.
pub fn publish_year(
    store: &impl ObjectStore,
    root: &Path,
    year: i32,
    remote: &RemoteConfig,
) -> Result<YearReport, BatchError> {
    let year = scan::resolve_year(year);
    let posts = scan::scan(root, year)?;
    info!(year, count = posts.len(), "Publishing year");

    let mut report = YearReport {
        year,
        posts: Vec::with_capacity(posts.len()),
    };
    for post in &posts {
        let post_report = publish(store, post, remote).map_err(|source| BatchError::Publish {
            post: post.relative_path().to_string(),
            source,
        })?;
        report
            .posts
            .push((post.relative_path().to_string(), post_report));
    }
    Ok(report)
}

/// Regular files in `dir`, sorted by name.
fn image_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, PublishError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let file_type = entry.file_type().map_err(io_error(dir))?;
        if file_type.is_dir() {
            continue;
        }
        files.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::MemoryStore;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn remote() -> RemoteConfig {
        RemoteConfig {
            bucket: "media".into(),
            key_prefix: "prefix".into(),
            image_base_url: "https://cdn.example.com".into(),
            ..RemoteConfig::default()
        }
    }

    fn append(post: &Post, text: &str) {
        let mut content = content_of(post);
        content.push_str(text);
        fs::write(post.content_file(), content).unwrap();
    }

    // =========================================================================
    // Prune
    // =========================================================================

    #[test]
    fn prune_keeps_referenced_and_cover() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        fs::write(post.content_file(), "only a.jpg is mentioned").unwrap();
        put_images(&post, &["cover.jpg", "a.jpg", "b.jpg"]);

        let pruned = prune_unused(&post).unwrap();

        assert_eq!(pruned, vec!["b.jpg"]);
        assert_eq!(dir_listing(&post.image_dir()), vec!["a.jpg", "cover.jpg"]);
    }

    #[test]
    fn prune_is_substring_match() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        // Mentioned in prose rather than a link still counts.
        append(&post, "draft note: use x.jpg later\n");
        put_images(&post, &["x.jpg", "y.png"]);

        prune_unused(&post).unwrap();
        assert_eq!(dir_listing(&post.image_dir()), vec!["x.jpg"]);
    }

    #[test]
    fn prune_keeps_any_cover_extension() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        put_images(&post, &["cover.png", "cover.webp"]);

        assert!(prune_unused(&post).unwrap().is_empty());
    }

    #[test]
    fn prune_reads_non_utf8_content() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        let mut content = b"legacy \xff\xfe text ".to_vec();
        content.extend_from_slice(b"![](img/kept.jpg)\n");
        fs::write(post.content_file(), content).unwrap();
        put_images(&post, &["kept.jpg", "gone.jpg"]);

        assert_eq!(prune_unused(&post).unwrap(), vec!["gone.jpg"]);
        assert_eq!(dir_listing(&post.image_dir()), vec!["kept.jpg"]);
    }

    #[test]
    fn byte_search() {
        assert!(contains_bytes(b"see a.jpg here", b"a.jpg"));
        assert!(!contains_bytes(b"see a.jp", b"a.jpg"));
        assert!(!contains_bytes(b"", b"a.jpg"));
    }

    #[test]
    fn prune_without_content_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        fs::remove_file(post.content_file()).unwrap();

        assert!(matches!(
            prune_unused(&post),
            Err(PublishError::Io { .. })
        ));
    }

    // =========================================================================
    // Upload
    // =========================================================================

    #[test]
    fn upload_uses_prefixed_keys_and_content_types() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10_1");
        put_images(&post, &["a.jpg", "cover.png"]);

        let store = MemoryStore::new();
        let keys = upload_images(&store, &post, &remote()).unwrap();

        assert_eq!(
            keys,
            vec!["prefix/2024/05/10_1/img/a.jpg", "prefix/2024/05/10_1/img/cover.png"]
        );
        let cover = store.get("prefix/2024/05/10_1/img/cover.png").unwrap();
        assert_eq!(cover.content_type, "image/png");
        assert_eq!(cover.bytes, b"image:cover.png");
    }

    // =========================================================================
    // Full publish
    // =========================================================================

    #[test]
    fn publish_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        append(&post, "![](img/i1.jpg)\n\n");
        put_images(&post, &["i1.jpg", "unused.jpg", "cover.jpg"]);

        let store = MemoryStore::new();
        let report = publish(&store, &post, &remote()).unwrap();

        assert!(!report.skipped);
        assert_eq!(report.pruned, vec!["unused.jpg"]);
        assert_eq!(
            store.keys(),
            vec!["prefix/2024/05/10/img/cover.jpg", "prefix/2024/05/10/img/i1.jpg"]
        );
        assert_eq!(report.cover, Some(CoverImage::Jpg));

        let content = content_of(&post);
        assert!(content.contains("![](https://cdn.example.com/2024/05/10/img/i1.jpg?d=300x300)"));
        assert!(content.contains(
            "image: https://cdn.example.com/2024/05/10/img/cover.jpg?d=300x300\n"
        ));
        assert!(!post.image_dir().exists());
        assert!(!post.staging_dir().exists());
        assert_eq!(post.state(), PostState::Published);
    }

    #[test]
    fn publish_without_cover_drops_image_field() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        append(&post, "![](img/a.jpg)\n\n");
        put_images(&post, &["a.jpg"]);

        let report = publish(&MemoryStore::new(), &post, &remote()).unwrap();
        assert_eq!(report.cover, Some(CoverImage::None));
        assert!(!content_of(&post).contains("image:"));
    }

    #[test]
    fn publish_with_png_cover() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        put_images(&post, &["cover.png"]);

        publish(&MemoryStore::new(), &post, &remote()).unwrap();
        assert!(content_of(&post).contains(
            "image: https://cdn.example.com/2024/05/10/img/cover.png?d=300x300\n"
        ));
    }

    #[test]
    fn publish_without_image_dir_is_noop() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        fs::remove_dir(post.image_dir()).unwrap();
        let before = content_of(&post);

        let store = MemoryStore::new();
        let report = publish(&store, &post, &remote()).unwrap();

        assert!(report.skipped);
        assert!(store.keys().is_empty());
        assert_eq!(content_of(&post), before);
        // img_src is only cleaned as part of a real publish.
        assert!(post.staging_dir().is_dir());
    }

    #[test]
    fn publish_of_missing_post_is_noop() {
        let tmp = TempDir::new().unwrap();
        let post = Post::from_relative_path(tmp.path(), "2024/05/10").unwrap();
        assert_eq!(post.state(), PostState::Missing);

        let store = MemoryStore::new();
        let report = publish(&store, &post, &remote()).unwrap();
        assert!(report.skipped);
        assert!(store.keys().is_empty());
        assert!(!post.dir().exists());
    }

    #[test]
    fn second_publish_is_noop() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        append(&post, "![](img/a.jpg)\n\n");
        put_images(&post, &["a.jpg"]);

        let store = MemoryStore::new();
        publish(&store, &post, &remote()).unwrap();
        let after_first = content_of(&post);

        let report = publish(&store, &post, &remote()).unwrap();
        assert!(report.skipped);
        assert_eq!(store.keys().len(), 1);
        assert_eq!(content_of(&post), after_first);
    }

    #[test]
    fn upload_failure_keeps_earlier_uploads_and_local_links() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        append(&post, "![](img/a.jpg)\n\n![](img/b.jpg)\n\n![](img/c.jpg)\n\n");
        put_images(&post, &["a.jpg", "b.jpg", "c.jpg"]);
        let before = content_of(&post);

        let store = MemoryStore::failing_on("b.jpg");
        let result = publish(&store, &post, &remote());

        assert!(matches!(
            result,
            Err(PublishError::Upload { ref key, .. }) if key == "prefix/2024/05/10/img/b.jpg"
        ));
        assert_eq!(store.keys(), vec!["prefix/2024/05/10/img/a.jpg"]);
        assert_eq!(content_of(&post), before);
        // Marker survives, so the post is retried on the next run.
        assert_eq!(post.state(), PostState::Unpublished);
    }

    #[test]
    fn remove_image_dirs_tolerates_missing() {
        let tmp = TempDir::new().unwrap();
        let post = scaffolded_post(tmp.path(), "2024/05/10");
        fs::remove_dir(post.staging_dir()).unwrap();

        remove_image_dirs(&post).unwrap();
        assert!(!post.image_dir().exists());
        assert!(post.content_file().exists());
    }

    // =========================================================================
    // Year batch
    // =========================================================================

    #[test]
    fn publish_year_in_scan_order() {
        let tmp = TempDir::new().unwrap();
        for rel in ["2024/06/01", "2024/05/10_1", "2024/05/10"] {
            let post = scaffolded_post(tmp.path(), rel);
            append(&post, "![](img/a.jpg)\n\n");
            put_images(&post, &["a.jpg"]);
        }

        let store = MemoryStore::new();
        let report = publish_year(&store, tmp.path(), 2024, &remote()).unwrap();

        assert_eq!(report.year, 2024);
        let order: Vec<&str> = report.posts.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(order, vec!["2024/05/10", "2024/05/10_1", "2024/06/01"]);
        assert_eq!(
            store.keys(),
            vec![
                "prefix/2024/05/10/img/a.jpg",
                "prefix/2024/05/10_1/img/a.jpg",
                "prefix/2024/06/01/img/a.jpg",
            ]
        );
    }

    #[test]
    fn publish_year_stops_at_first_failure() {
        let tmp = TempDir::new().unwrap();
        let first = scaffolded_post(tmp.path(), "2024/05/10");
        let failing = scaffolded_post(tmp.path(), "2024/05/11");
        let untouched = scaffolded_post(tmp.path(), "2024/05/12");
        append(&first, "![](img/ok.jpg)\n\n");
        put_images(&first, &["ok.jpg"]);
        append(&failing, "![](img/bad.jpg)\n\n");
        put_images(&failing, &["bad.jpg"]);
        append(&untouched, "![](img/ok.jpg)\n\n");
        put_images(&untouched, &["ok.jpg"]);

        let store = MemoryStore::failing_on("bad.jpg");
        let result = publish_year(&store, tmp.path(), 2024, &remote());

        assert!(matches!(
            result,
            Err(BatchError::Publish { ref post, .. }) if post == "2024/05/11"
        ));
        assert_eq!(first.state(), PostState::Published);
        assert_eq!(failing.state(), PostState::Unpublished);
        assert_eq!(untouched.state(), PostState::Unpublished);
        assert_eq!(store.keys(), vec!["prefix/2024/05/10/img/ok.jpg"]);
    }

    #[test]
    fn publish_year_refuses_non_canonical_marker() {
        let tmp = TempDir::new().unwrap();
        let good = scaffolded_post(tmp.path(), "2024/05/10");
        put_images(&good, &["cover.jpg"]);
        make_post_dir(tmp.path(), "2024/05/11_01", true);

        let store = MemoryStore::new();
        let result = publish_year(&store, tmp.path(), 2024, &remote());
        assert!(matches!(result, Err(BatchError::Scan(ScanError::MalformedPath(_)))));
        assert!(store.keys().is_empty());
        assert_eq!(good.state(), PostState::Unpublished);
    }

    #[test]
    fn publish_year_with_missing_year_is_scan_error() {
        let tmp = TempDir::new().unwrap();
        let result = publish_year(&MemoryStore::new(), tmp.path(), 2024, &remote());
        assert!(matches!(result, Err(BatchError::Scan(_))));
    }
}
