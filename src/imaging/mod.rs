//! Image transcoding.
//!
//! | Operation | Backend |
//! |---|---|
//! | **Fit to box, JPEG/PNG out** | [`RustBackend`] (`image` crate, Lanczos3) |
//! | **Fit to box, any input** | [`MagickBackend`] (`convert -resize WxH`) |
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (unit testable)
//! - **Parameters**: data structures describing an operation
//! - **Backend**: [`ImageBackend`] trait + implementations
//! - **Operations**: settings → backend calls

pub mod backend;
mod calculations;
pub mod magick_backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::fit_within;
pub use magick_backend::MagickBackend;
pub use operations::{backend_from_config, fit_image, plan_resize};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
