//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! Fingerprints are BLAKE3 digests over the full file content. Files are
//! read in fixed [`BLOCK_SIZE`] blocks so memory use stays bounded
//! regardless of file size. Each file is opened, read to completion and
//! closed within a single call.
//!
//! The [`ContentHasher`] trait is the seam the duplicate detector hashes
//! through; [`Hasher`] is the production implementation.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::HashError;

/// A 32-byte BLAKE3 content fingerprint.
pub type Hash = [u8; 32];

/// Read block size for streaming hashing and comparison (64 KiB).
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Something that can fingerprint the full content of a file.
///
/// Implementations must be deterministic: identical content always yields
/// an identical fingerprint.
pub trait ContentHasher: Send + Sync {
    /// Compute the fingerprint of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    fn full_hash(&self, path: &Path) -> Result<Hash, HashError>;
}

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    block_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher that reads [`BLOCK_SIZE`] blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            block_size: BLOCK_SIZE,
        }
    }

    /// Override the read block size. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// The read block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates read errors from `reader`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Hash> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Hash an in-memory byte slice.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Hash {
        *blake3::hash(data).as_bytes()
    }
}

impl ContentHasher for Hasher {
    fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let hash = self
            .hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))?;
        log::trace!("Hashed {}: {}", path.display(), hash_to_hex(&hash));
        Ok(hash)
    }
}

/// Compare two files byte-for-byte.
///
/// Used to confirm a fingerprint match. Files of different length are
/// never identical; otherwise both files are streamed block by block and
/// the comparison stops at the first differing block.
///
/// # Errors
///
/// Returns a [`HashError`] for whichever file could not be read.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool, HashError> {
    let mut file_a = File::open(a).map_err(|e| HashError::from_io(a, e))?;
    let mut file_b = File::open(b).map_err(|e| HashError::from_io(b, e))?;

    let len_a = file_a.metadata().map_err(|e| HashError::from_io(a, e))?.len();
    let len_b = file_b.metadata().map_err(|e| HashError::from_io(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; BLOCK_SIZE];
    let mut buf_b = vec![0u8; BLOCK_SIZE];

    loop {
        let n_a = read_block(&mut file_a, &mut buf_a).map_err(|e| HashError::from_io(a, e))?;
        let n_b = read_block(&mut file_b, &mut buf_b).map_err(|e| HashError::from_io(b, e))?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible; returns fewer bytes only at end of file.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Format a hash as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
