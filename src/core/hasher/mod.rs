//! # Hasher Module
//!
//! Computes content digests for files.
//!
//! ## Supported Algorithms
//! - **BLAKE3** - Cryptographic, default. Collisions are not a practical concern
//! - **XXH3-128** - Non-cryptographic, faster on slow CPUs
//!
//! ## How It Works
//! Files are streamed in fixed-size chunks, so memory use stays constant no
//! matter how large the file is. The digest is returned as lowercase hex.
//!
//! Two files with equal digests are treated as identical. There is no
//! byte-by-byte verification pass.
//!
//! ## Example
//! ```rust,ignore
//! use altesse_tools::core::hasher::{ContentHasher, DigestAlgorithm};
//!
//! let hasher = ContentHasher::new(DigestAlgorithm::Blake3);
//! let digest = hasher.hash_file(&path)?;
//! ```

mod digest;

pub use digest::{ContentHasher, CHUNK_SIZE};

use serde::{Deserialize, Serialize};

/// Available digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// BLAKE3, 256-bit
    #[default]
    Blake3,
    /// XXH3, 128-bit
    Xxh3,
}

impl DigestAlgorithm {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            DigestAlgorithm::Blake3 => "BLAKE3 - cryptographic 256-bit digest",
            DigestAlgorithm::Xxh3 => "XXH3 - fast non-cryptographic 128-bit digest",
        }
    }

    /// Length of the hex digest in characters
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Blake3 => 64,
            DigestAlgorithm::Xxh3 => 32,
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestAlgorithm::Blake3 => write!(f, "blake3"),
            DigestAlgorithm::Xxh3 => write!(f, "xxh3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_blake3() {
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Blake3);
    }

    #[test]
    fn display_names() {
        assert_eq!(DigestAlgorithm::Blake3.to_string(), "blake3");
        assert_eq!(DigestAlgorithm::Xxh3.to_string(), "xxh3");
    }
}
