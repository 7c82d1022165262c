//! # Post Press
//!
//! Asset pipeline for a date-keyed static blog. A post is a directory named
//! after its date, holding a markdown content file and its images:
//!
//! ```text
//! content/post/2024/05/10_1/
//! ├── index.md      # frontmatter + body
//! ├── img_src/      # camera images waiting to be normalized
//! └── img/          # normalized images; present ⇔ post not yet published
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! new       create directories + index.md; normalize img_src/ → img/,
//!           append ![](img/…) references            (repeatable)
//! publish   prune unused img/ files → upload to S3 → rewrite links to the
//!           public URL → delete img/ and img_src/
//! ```
//!
//! The `img/` directory doubles as the "unpublished" flag: [`scan`] finds
//! posts by looking for it, and publishing removes it. There is no other
//! state file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Date ⇄ `YYYY/MM/DD[_N]` codec, slugs, image file name normalization |
//! | [`types`] | [`types::Post`] and its derived paths and lifecycle state |
//! | [`dates`] | Lenient parsing of dates typed on the command line |
//! | [`config`] | `postpress.toml` loading, environment overrides, validation |
//! | [`scan`] | Find unpublished posts of a year |
//! | [`scaffold`] | Create a post's directories and content file |
//! | [`process`] | Normalize staged images and reference them from the content file |
//! | [`imaging`] | Transcoder backends: ImageMagick and pure-Rust |
//! | [`publish`] | Publish one post or a whole year |
//! | [`rewrite`] | Textual link and cover rewriting |
//! | [`storage`] | Object store capability and its S3 implementation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Injected Collaborators
//!
//! The transcoder ([`imaging::ImageBackend`]) and object store
//! ([`storage::ObjectStore`]) are traits passed into the operations that need
//! them. Configuration is one [`config::SiteConfig`] value built at start-up
//! and passed by reference; nothing reads global state.
//!
//! ## Textual Rewriting
//!
//! Content files are loosely structured markdown with YAML-ish frontmatter.
//! Links are rewritten with two regular expressions rather than a parser, so
//! anything outside the `](img/…)` and `image: img/cover.…` patterns is left
//! byte-for-byte alone.
//!
//! ## No Rollback
//!
//! Every step runs once, in order, and stops at the first failure. Work done
//! before the failure stays done. Since `img/` is only removed as the final
//! step, a failed post is found again by the next scan and can be re-run.

pub mod config;
pub mod dates;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod publish;
pub mod rewrite;
pub mod scaffold;
pub mod scan;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
