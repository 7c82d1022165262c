//! Staged image processing.
//!
//! Moves images from `img_src/` into `img/`, normalizing each one on the way:
//!
//! ```text
//! img_src/IMG_0412.HEIC   →  img/i0412.jpg    (fit into 1024x1024)
//! img_src/Cover.PNG       →  img/cover.png
//! img_src/notes.txt       →  (ignored, stays put)
//! ```
//!
//! Each successfully transcoded source is deleted, and one markdown image
//! reference per output is appended to `index.md`:
//!
//! ```text
//! ![](img/i0412.jpg)
//!
//! ```
//!
//! Files are handled one at a time in file-name order. A transcoder failure
//! stops the run: outputs already written stay in `img/`, the failing source
//! and everything after it stay in `img_src/`, and nothing is appended to the
//! content file for that run.

use crate::config::ImagesConfig;
use crate::imaging::{BackendError, ImageBackend, fit_image};
use crate::naming;
use crate::types::Post;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transcoding {source_path} failed: {error}")]
    Transcode {
        source_path: PathBuf,
        #[source]
        error: BackendError,
    },
}

/// One staged image that made it into `img/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Original file name in `img_src/`.
    pub source: String,
    /// Normalized file name in `img/`.
    pub output: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Processed images, in processing order.
    pub images: Vec<ProcessedImage>,
    /// Staged files left alone (not an allowed image type).
    pub skipped: Vec<String>,
}

/// Markdown reference appended for each processed image.
pub fn image_reference(filename: &str) -> String {
    format!("![](img/{filename})\n\n")
}

/// Normalize every staged image of `post` and reference it from the content file.
pub fn process_images(
    backend: &impl ImageBackend,
    post: &Post,
    settings: &ImagesConfig,
) -> Result<ProcessReport, ProcessError> {
    let staging_dir = post.staging_dir();
    let image_dir = post.image_dir();
    let mut report = ProcessReport::default();

    let mut entries = fs::read_dir(&staging_dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(output_name) = naming::normalize_image_name(&name) else {
            debug!(file = %name, "Skipping non-image file in staging directory");
            report.skipped.push(name);
            continue;
        };

        let source_path = entry.path();
        let output_path = image_dir.join(&output_name);
        fit_image(backend, &source_path, &output_path, settings).map_err(|error| {
            ProcessError::Transcode {
                source_path: source_path.clone(),
                error,
            }
        })?;
        fs::remove_file(&source_path)?;
        info!(source = %name, output = %output_name, "Processed image");

        report.images.push(ProcessedImage {
            source: name,
            output: output_name,
        });
    }

    append_references(post, &report.images)?;
    Ok(report)
}

fn append_references(post: &Post, images: &[ProcessedImage]) -> Result<(), ProcessError> {
    if images.is_empty() {
        return Ok(());
    }

    let mut file = OpenOptions::new().append(true).open(post.content_file())?;
    for image in images {
        file.write_all(image_reference(&image.output).as_bytes())?;
    }
    debug!(count = images.len(), "Appended image references");
    Ok(())
}
