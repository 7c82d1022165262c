//! CLI output formatting for every command.
//!
//! Posts are shown by their relative path (`2024/05/10_1`), which is both their
//! identity and their location. Details go on indented lines below.
//!
//! # Output Format
//!
//! ## New
//!
//! ```text
//! 2024/05/10_1 (slug 202405101)
//!     Created: img_src/
//!     Created: img/
//!     Created: index.md
//!     IMG_0412.HEIC → img/i0412.jpg
//!     Skipped: notes.txt
//! ```
//!
//! ## Scan
//!
//! ```text
//! 2024: 2 unpublished posts
//! 001 2024/05/10
//! 002 2024/05/10_1
//! ```
//!
//! ## Publish
//!
//! ```text
//! 2024/05/10
//!     Pruned: unused.jpg
//!     Uploaded: blog/2024/05/10/img/cover.jpg
//!     Uploaded: blog/2024/05/10/img/i1.jpg
//!     Cover: jpg
//!
//! Published 1 post, 2 images
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::process::ProcessReport;
use crate::publish::{PublishReport, YearReport};
use crate::rewrite::CoverImage;
use crate::scaffold::ScaffoldReport;
use crate::types::Post;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn cover_label(cover: CoverImage) -> &'static str {
    match cover {
        CoverImage::Jpg => "jpg",
        CoverImage::Png => "png",
        CoverImage::None => "none (image field removed)",
    }
}

// ============================================================================
// New
// ============================================================================

/// Post header plus what scaffolding and image processing changed.
pub fn format_new_output(
    post: &Post,
    scaffold: &ScaffoldReport,
    process: &ProcessReport,
) -> Vec<String> {
    let mut lines = vec![format!("{} (slug {})", post.relative_path(), post.slug())];

    for dir in &scaffold.created_dirs {
        if let Some(name) = dir.strip_prefix(post.dir()).ok().and_then(|p| p.to_str()) {
            if !name.is_empty() {
                lines.push(format!("{}Created: {}/", indent(1), name));
            }
        }
    }
    if scaffold.created_content_file {
        lines.push(format!("{}Created: {}", indent(1), crate::types::CONTENT_FILE));
    }

    lines.extend(format_process_report(process));
    lines
}

pub fn print_new_output(post: &Post, scaffold: &ScaffoldReport, process: &ProcessReport) {
    for line in format_new_output(post, scaffold, process) {
        println!("{}", line);
    }
}

/// One line per processed or skipped staging file, indented under the post.
pub fn format_process_report(report: &ProcessReport) -> Vec<String> {
    let mut lines = Vec::new();
    for image in &report.images {
        lines.push(format!(
            "{}{} → img/{}",
            indent(1),
            image.source,
            image.output
        ));
    }
    for name in &report.skipped {
        lines.push(format!("{}Skipped: {}", indent(1), name));
    }
    lines
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(year: i32, posts: &[Post]) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {}",
        year,
        plural(posts.len(), "unpublished post")
    )];
    for (i, post) in posts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), post.relative_path()));
    }
    lines
}

pub fn print_scan_output(year: i32, posts: &[Post]) {
    for line in format_scan_output(year, posts) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish
// ============================================================================

/// Details of one published post.
pub fn format_publish_report(relative_path: &str, report: &PublishReport) -> Vec<String> {
    let mut lines = vec![relative_path.to_string()];
    if report.skipped {
        lines.push(format!("{}Already published", indent(1)));
        return lines;
    }
    for name in &report.pruned {
        lines.push(format!("{}Pruned: {}", indent(1), name));
    }
    for key in &report.uploaded {
        lines.push(format!("{}Uploaded: {}", indent(1), key));
    }
    if let Some(cover) = report.cover {
        lines.push(format!("{}Cover: {}", indent(1), cover_label(cover)));
    }
    lines
}

pub fn print_publish_report(relative_path: &str, report: &PublishReport) {
    for line in format_publish_report(relative_path, report) {
        println!("{}", line);
    }
}

/// All posts published for a year, followed by a summary line.
pub fn format_year_report(report: &YearReport) -> Vec<String> {
    if report.posts.is_empty() {
        return vec![format!("{}: nothing to publish", report.year)];
    }

    let mut lines = Vec::new();
    for (path, post_report) in &report.posts {
        lines.extend(format_publish_report(path, post_report));
    }
    let images: usize = report.posts.iter().map(|(_, r)| r.uploaded.len()).sum();
    lines.push(String::new());
    lines.push(format!(
        "Published {}, {}",
        plural(report.posts.len(), "post"),
        plural(images, "image")
    ));
    lines
}

pub fn print_year_report(report: &YearReport) {
    for line in format_year_report(report) {
        println!("{}", line);
    }
}
