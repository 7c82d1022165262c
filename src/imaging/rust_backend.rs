//! Pure Rust transcoding backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate |
//! | Fit to bounding box | [`fit_within`](super::calculations::fit_within) + `resize_exact` (Lanczos3) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! HEIC and AVIF have no pure-Rust decoder compiled in; those sources fail with
//! [`BackendError::Unsupported`]. Use the ImageMagick backend for them.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::ResizeParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use tracing::debug;

/// Source extensions this backend can decode.
const DECODABLE: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let ext = extension_of(path);
    let format = DECODABLE
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
        .ok_or_else(|| {
            BackendError::Unsupported(format!(
                "cannot decode .{ext} in-process ({}); use the imagemagick backend",
                path.display()
            ))
        })?;

    let mut reader = ImageReader::open(path)?;
    reader.set_format(format);
    reader.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

fn create_writer(path: &Path) -> Result<std::io::BufWriter<std::fs::File>, BackendError> {
    Ok(std::io::BufWriter::new(std::fs::File::create(path)?))
}

fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    match extension_of(path).as_str() {
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                create_writer(path)?,
                quality as u8,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))
        }
        "png" => {
            let encoder = image::codecs::png::PngEncoder::new(create_writer(path)?);
            img.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))
        }
        other => Err(BackendError::Unsupported(format!(
            "output format .{other}"
        ))),
    }
}

impl ImageBackend for RustBackend {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let (width, height) = fit_within(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        debug!(
            source = %params.source.display(),
            from = %format!("{}x{}", img.width(), img.height()),
            to = %format!("{width}x{height}"),
            "Resizing in-process"
        );
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}
