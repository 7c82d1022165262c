//! Content file link rewriting.
//!
//! Rewriting is textual, not a markdown parse. Two patterns are touched:
//!
//! ```text
//! ![](img/i1.jpg)            →  ![](<remote dir>img/i1.jpg?d=300x300)
//! image: img/cover.jpg       →  image: <remote dir>img/cover.jpg?d=300x300
//! ```
//!
//! where `<remote dir>` is `<image_base_url>/<YYYY/MM/DD[_N]>/`.
//!
//! The `image:` frontmatter line depends on which cover file survived pruning:
//! `cover.jpg` wins, `cover.png` swaps the extension, and with neither the line
//! is dropped.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Query suffix appended to every rewritten image URL.
pub const IMAGE_QUERY: &str = "?d=300x300";

static LOCAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\((img/[^)]+)\)").expect("valid regex"));
static COVER_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"image: img/cover\..{3}").expect("valid regex"));
static COVER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^image: img/cover\..{3}\n?").expect("valid regex"));
static COVER_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"image: (img/cover\..{3})").expect("valid regex"));

/// Cover image present in a post's `img/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverImage {
    Jpg,
    Png,
    None,
}

impl CoverImage {
    /// Look for `cover.jpg`, then `cover.png`, in `image_dir`.
    pub fn detect(image_dir: &Path) -> Self {
        if image_dir.join("cover.jpg").is_file() {
            CoverImage::Jpg
        } else if image_dir.join("cover.png").is_file() {
            CoverImage::Png
        } else {
            CoverImage::None
        }
    }
}

/// Rewrite local image links and the cover field to point at `remote_dir`.
///
/// `remote_dir` must end with `/`.
pub fn rewrite_links(content: &str, remote_dir: &str, cover: CoverImage) -> String {
    let link_replacement = format!("]({remote_dir}${{1}}{IMAGE_QUERY})");
    let content = LOCAL_LINK.replace_all(content, link_replacement.as_str());

    let content = match cover {
        CoverImage::Jpg => content,
        CoverImage::Png => COVER_FIELD
            .replace_all(&content, "image: img/cover.png")
            .into_owned()
            .into(),
        CoverImage::None => COVER_LINE.replace_all(&content, "").into_owned().into(),
    };

    let cover_replacement = format!("image: {remote_dir}${{1}}{IMAGE_QUERY}");
    COVER_REF
        .replace_all(&content, cover_replacement.as_str())
        .into_owned()
}
