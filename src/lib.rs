//! # Altesse Tools
//!
//! Batch file tools built on one bounded worker pool.
//!
//! ## What It Does
//! - **Duplicate cleanup** - find files with identical content, delete all
//!   but one copy of each
//! - **Image conversion** - convert many images at once to PNG, JPEG, WebP,
//!   AVIF, BMP or TIFF
//! - **Batch rename** - rename many files at once, keeping extensions
//! - **Usage statistics** - track how much space conversions saved
//!
//! ## Architecture
//! - `core` - The batch engine (no persistent state, no UI)
//! - `events` - Event-driven progress reporting
//! - `stats` - JSON usage statistics file
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;
pub mod stats;

// Re-export commonly used types at the crate root
pub use error::{AltesseError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG` wins
/// over `default_level` when set. Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
