//! Shared utilities.
//!
//! - [`config`] - query settings loaded from the user config directory
//! - [`encoding`] - varint and posting codecs, little-endian helpers
//! - [`progress`] - progress bars (no-op without the `progress` feature)
//! - [`tokenizer`] - word tokenization and term counting

pub mod config;
pub mod encoding;
pub mod progress;
pub mod tokenizer;

pub use config::*;
pub use encoding::*;
pub use tokenizer::*;
