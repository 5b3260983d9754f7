//! # paperstack-core
//!
//! Core types, traits, and abstractions for the paperstack document organizer.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other paperstack crates depend on.

pub mod defaults;
pub mod error;
pub mod files;
pub mod logging;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use files::{
    detect_content_type, file_extension, format_size, is_native_text, preview_kind,
    sanitize_filename, year_label, PreviewKind,
};
pub use models::*;
pub use tags::{normalize_tag, normalize_tags, parse_tag_csv, slugify};
pub use traits::*;
