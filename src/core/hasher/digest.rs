//! Streaming file digests.

use super::DigestAlgorithm;
use crate::error::HashError;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// Bytes read per chunk
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Hashes file contents with a fixed-size read buffer.
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    algorithm: DigestAlgorithm,
    chunk_size: usize,
}

impl ContentHasher {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Override the read chunk size (minimum 1 byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Hash a file's full contents.
    ///
    /// Open and read failures are reported with the path. A digest is only
    /// returned once the whole file has been read.
    pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.hash_reader(file).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Hash everything a reader yields until EOF.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<String> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(state.finalize_hex())
    }

    /// Hash an in-memory buffer
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        let mut state = DigestState::new(self.algorithm);
        state.update(data);
        state.finalize_hex()
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default())
    }
}

enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Xxh3(Box<Xxh3>),
}

impl DigestState {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Blake3 => DigestState::Blake3(Box::new(blake3::Hasher::new())),
            DigestAlgorithm::Xxh3 => DigestState::Xxh3(Box::new(Xxh3::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Blake3(hasher) => {
                hasher.update(data);
            }
            DigestState::Xxh3(hasher) => hasher.update(data),
        }
    }

    fn finalize_hex(&self) -> String {
        match self {
            DigestState::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
            DigestState::Xxh3(hasher) => format!("{:032x}", hasher.digest128()),
        }
    }
}
