//! ImageMagick transcoding backend.
//!
//! Runs `<command> <source> -resize WxH <output>`. ImageMagick picks the output
//! format from the output extension and reads every format the staging
//! directory accepts, HEIC included (given a delegate-enabled build).
//!
//! The call blocks until the process exits. There is no timeout.

use super::backend::{BackendError, ImageBackend};
use super::params::ResizeParams;
use std::ffi::OsString;
use std::process::Command;
use tracing::debug;

pub struct MagickBackend {
    command: String,
}

impl MagickBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self::new("convert")
    }
}

/// Arguments passed after the command name.
pub fn resize_args(params: &ResizeParams) -> Vec<OsString> {
    vec![
        params.source.clone().into_os_string(),
        OsString::from("-resize"),
        OsString::from(params.geometry()),
        params.output.clone().into_os_string(),
    ]
}

impl ImageBackend for MagickBackend {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        debug!(
            command = %self.command,
            source = %params.source.display(),
            output = %params.output.display(),
            geometry = %params.geometry(),
            "Running ImageMagick"
        );

        let output = Command::new(&self.command)
            .args(resize_args(params))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::ProcessingFailed(format!(
                "{} exited with {} for {}: {}",
                self.command,
                output.status,
                params.source.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}
