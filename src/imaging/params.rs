//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. They sit between
//! [`operations`](super::operations), which decides where a staged image goes,
//! and the [`backend`](super::backend), which does the pixel work. Tests swap in
//! a recording backend without touching operation logic.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Fit `source` into a `max_width` x `max_height` box and write it to `output`.
///
/// The output format follows the output extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl ResizeParams {
    /// ImageMagick geometry string, e.g. `1024x1024`.
    pub fn geometry(&self) -> String {
        format!("{}x{}", self.max_width, self.max_height)
    }
}
