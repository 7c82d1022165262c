//! Configuration: where posts live, where images go, how they are resized.
//!
//! Configuration is built once at start-up and handed to every stage by
//! reference. There is no global state.
//!
//! ## Sources (later wins)
//!
//! 1. Stock defaults ([`SiteConfig::default`])
//! 2. `postpress.toml` (sparse; only the keys you want to change)
//! 3. Environment variables (a `.env` file in the working directory is loaded
//!    first by the binary)
//!
//! ## Configuration Options
//!
//! ```toml
//! storage_root = "content/post"   # Root of the YYYY/MM/DD[_N] tree
//!
//! [remote]
//! bucket = ""                     # S3 bucket receiving published images
//! region = "ap-northeast-1"
//! # endpoint = "https://..."      # Custom S3-compatible endpoint (path-style)
//! key_prefix = ""                 # Object keys: <key_prefix>/YYYY/MM/DD/img/<file>
//! image_base_url = ""             # Public URL that serves <key_prefix>
//!
//! [images]
//! max_size = 1024                 # Bounding box edge, pixels
//! quality = 90                    # JPEG quality (rust backend)
//! backend = "imagemagick"         # "imagemagick" or "rust"
//! magick_command = "convert"
//!
//! [template]
//! category = "テスト"
//! heading = "きっかけ"
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `POST_DIR` | `storage_root` |
//! | `AWS_REGION` | `remote.region` |
//! | `S3_ENDPOINT` | `remote.endpoint` |
//! | `S3_BUCKET_NAME` | `remote.bucket` |
//! | `S3_KEY_PREFIX` | `remote.key_prefix` |
//! | `REMOTE_IMG_BASE_URL` | `remote.image_base_url` |
//!
//! Unknown keys in the TOML file are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "postpress.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Root of the `YYYY/MM/DD[_N]` post tree.
    pub storage_root: PathBuf,
    /// Remote object storage and the public URL in front of it.
    pub remote: RemoteConfig,
    /// Image normalization settings.
    pub images: ImagesConfig,
    /// Content file template placeholders.
    pub template: TemplateConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("content/post"),
            remote: RemoteConfig::default(),
            images: ImagesConfig::default(),
            template: TemplateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub bucket: String,
    pub region: String,
    /// Custom S3-compatible endpoint. Switches the client to path-style URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub key_prefix: String,
    pub image_base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "ap-northeast-1".to_string(),
            endpoint: None,
            key_prefix: String::new(),
            image_base_url: String::new(),
        }
    }
}

impl RemoteConfig {
    /// Object key for a published image: `<key_prefix>/<post path>/img/<file>`.
    ///
    /// A trailing `/` on the prefix is ignored; an empty prefix yields a key
    /// starting at the post path.
    pub fn object_key(&self, relative_path: &str, filename: &str) -> String {
        let prefix = self.key_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("{relative_path}/img/{filename}")
        } else {
            format!("{prefix}/{relative_path}/img/{filename}")
        }
    }

    /// Public directory URL for a post: `<image_base_url>/<post path>/`.
    pub fn remote_post_dir(&self, relative_path: &str) -> String {
        format!(
            "{}/{}/",
            self.image_base_url.trim_end_matches('/'),
            relative_path
        )
    }
}

/// Which transcoder turns staged images into published ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Shell out to ImageMagick's `convert`. Reads every staged format, HEIC included.
    ImageMagick,
    /// In-process `image` crate. JPEG, PNG and WebP sources only.
    Rust,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Edge of the square bounding box images are fitted into.
    pub max_size: u32,
    /// JPEG quality (1-100), used by the rust backend.
    pub quality: u32,
    pub backend: BackendKind,
    /// Command used by the ImageMagick backend.
    pub magick_command: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_size: 1024,
            quality: 90,
            backend: BackendKind::ImageMagick,
            magick_command: "convert".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Placeholder entry under `categories:`.
    pub category: String,
    /// First body heading.
    pub heading: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            category: "テスト".to_string(),
            heading: "きっかけ".to_string(),
        }
    }
}

impl SiteConfig {
    /// Validate values every command depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage_root must not be empty".into(),
            ));
        }
        if self.images.max_size == 0 {
            return Err(ConfigError::Validation(
                "images.max_size must be non-zero".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Validate the remote settings publishing needs.
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        if self.remote.bucket.is_empty() {
            return Err(ConfigError::Validation(
                "remote.bucket (S3_BUCKET_NAME) is required to publish".into(),
            ));
        }
        if self.remote.image_base_url.is_empty() {
            return Err(ConfigError::Validation(
                "remote.image_base_url (REMOTE_IMG_BASE_URL) is required to publish".into(),
            ));
        }
        Ok(())
    }

    /// Overlay environment variables using `lookup` (normally `std::env::var`).
    ///
    /// Empty values are treated as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("POST_DIR") {
            self.storage_root = PathBuf::from(v);
        }
        if let Some(v) = get("AWS_REGION") {
            self.remote.region = v;
        }
        if let Some(v) = get("S3_ENDPOINT") {
            self.remote.endpoint = Some(v);
        }
        if let Some(v) = get("S3_BUCKET_NAME") {
            self.remote.bucket = v;
        }
        if let Some(v) = get("S3_KEY_PREFIX") {
            self.remote.key_prefix = v;
        }
        if let Some(v) = get("REMOTE_IMG_BASE_URL") {
            self.remote.image_base_url = v;
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`; tables merge key-by-key.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as raw TOML. `Ok(None)` when the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load `path` over the stock defaults, then apply environment overrides and validate.
pub fn load_config(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let mut config: SiteConfig = merged.try_into()?;
    config.apply_env(env);
    config.validate()?;
    Ok(config)
}

/// Load `KEY=value` lines from `path` into the process environment.
///
/// Returns `Ok(false)` when the file does not exist. Variables already set in
/// the environment are not overwritten.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// A fully-commented stock config, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# post-press configuration
# ========================
# All settings are optional. Values shown are the defaults.
# Environment variables (or a .env file) override anything set here:
#   POST_DIR, AWS_REGION, S3_ENDPOINT, S3_BUCKET_NAME, S3_KEY_PREFIX,
#   REMOTE_IMG_BASE_URL
# Unknown keys will cause an error.

# Root of the YYYY/MM/DD[_N] post tree.
storage_root = "content/post"

# ---------------------------------------------------------------------------
# Remote storage (required for publish)
# ---------------------------------------------------------------------------
[remote]
bucket = ""
region = "ap-northeast-1"
# Custom S3-compatible endpoint; enables path-style addressing.
# endpoint = "https://s3.example.com"

# Objects are stored as <key_prefix>/YYYY/MM/DD[_N]/img/<file>.
key_prefix = ""

# Public URL serving <key_prefix>. Local links become
# <image_base_url>/YYYY/MM/DD[_N]/img/<file>?d=300x300
image_base_url = ""

# ---------------------------------------------------------------------------
# Image normalization
# ---------------------------------------------------------------------------
[images]
# Images are fitted into a max_size x max_size box, aspect ratio preserved.
max_size = 1024

# JPEG quality (1-100), rust backend only.
quality = 90

# "imagemagick" reads every staged format (HEIC, AVIF, ...).
# "rust" needs no external tools but only reads JPEG, PNG and WebP.
backend = "imagemagick"
magick_command = "convert"

# ---------------------------------------------------------------------------
# New post template
# ---------------------------------------------------------------------------
[template]
category = "テスト"
heading = "きっかけ"
"##
}
