//! High-level image operations: turn settings into backend calls.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, ResizeParams};
use super::{MagickBackend, RustBackend};
use crate::config::{BackendKind, ImagesConfig};
use std::path::Path;

/// Plan the resize of one staged image without executing it.
pub fn plan_resize(source: &Path, output: &Path, settings: &ImagesConfig) -> ResizeParams {
    ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        max_width: settings.max_size,
        max_height: settings.max_size,
        quality: Quality::new(settings.quality),
    }
}

/// Fit `source` into the configured bounding box, writing `output`.
pub fn fit_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &ImagesConfig,
) -> Result<(), BackendError> {
    backend.resize(&plan_resize(source, output, settings))
}

/// Build the backend selected in config.
pub fn backend_from_config(settings: &ImagesConfig) -> Box<dyn ImageBackend> {
    match settings.backend {
        BackendKind::ImageMagick => Box::new(MagickBackend::new(settings.magick_command.clone())),
        BackendKind::Rust => Box::new(RustBackend::new()),
    }
}
