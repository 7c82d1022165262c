//! New post scaffolding.
//!
//! Creates the post directory, both image subdirectories, and the content file:
//!
//! ```text
//! <root>/2024/05/10/
//! ├── index.md      # written once from the template, never overwritten
//! ├── img_src/      # drop camera images here
//! └── img/          # normalized images; also the "unpublished" marker
//! ```
//!
//! Everything here is additive. Running it again on an existing post only
//! fills in what is missing.

use crate::config::TemplateConfig;
use crate::types::Post;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a scaffold run changed on disk.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    /// Directories that did not exist before.
    pub created_dirs: Vec<PathBuf>,
    /// Whether `index.md` was written by this run.
    pub created_content_file: bool,
}

/// Render the initial `index.md` for a post.
pub fn render_content_file(post: &Post, template: &TemplateConfig) -> String {
    format!(
        "---\n\
         title: \n\
         slug: {slug}\n\
         date: {date}\n\
         image: img/cover.jpg\n\
         categories:\n\
         - {category}\n\
         tags:\n\
         ---\n\
         \n\
         ## {heading}\n\
         \n",
        slug = post.slug(),
        date = post.date().format("%Y-%m-%d"),
        category = template.category,
        heading = template.heading,
    )
}

/// Create the post's directories and content file, leaving existing ones alone.
pub fn scaffold(post: &Post, template: &TemplateConfig) -> Result<ScaffoldReport, ScaffoldError> {
    let mut report = ScaffoldReport::default();

    for dir in [post.dir().to_path_buf(), post.staging_dir(), post.image_dir()] {
        if dir.is_dir() {
            continue;
        }
        fs::create_dir_all(&dir).map_err(|source| ScaffoldError::Io {
            path: dir.clone(),
            source,
        })?;
        debug!(path = %dir.display(), "Created directory");
        report.created_dirs.push(dir);
    }

    report.created_content_file = write_content_file_once(post, template)?;
    Ok(report)
}

/// Write `index.md` unless it already exists. Returns whether it was written.
fn write_content_file_once(post: &Post, template: &TemplateConfig) -> Result<bool, ScaffoldError> {
    let path = post.content_file();
    let io_err = |source| ScaffoldError::Io {
        path: path.clone(),
        source,
    };

    // create_new makes the existence check and the create a single step.
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "Content file exists, leaving it untouched");
            return Ok(false);
        }
        Err(e) => return Err(io_err(e)),
    };

    file.write_all(render_content_file(post, template).as_bytes())
        .map_err(io_err)?;
    info!(path = %path.display(), "Created content file");
    Ok(true)
}
