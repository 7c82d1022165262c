//! Image transcoding backend trait and shared error type.
//!
//! The [`ImageBackend`] trait is the one capability the pipeline needs from an
//! image tool: fit a source image into a bounding box and write it out.
//!
//! Two implementations ship:
//! - [`RustBackend`](super::rust_backend::RustBackend): in-process, `image` crate.
//! - [`MagickBackend`](super::magick_backend::MagickBackend): ImageMagick `convert`.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported format: {0}")]
    Unsupported(String),
}

/// Trait for image transcoding backends.
pub trait ImageBackend {
    /// Fit `params.source` into the bounding box and write `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for &B {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        (**self).resize(params)
    }
}

impl<B: ImageBackend + ?Sized> ImageBackend for Box<B> {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        (**self).resize(params)
    }
}
