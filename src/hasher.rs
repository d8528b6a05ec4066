//! Content digests for integrity checking.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size for chunked hashing.
const CHUNK_SIZE: usize = 4096;

/// Computes the SHA-256 digest of a file as lowercase hex.
///
/// The file is folded into the digest in fixed-size chunks, so memory use
/// stays constant regardless of file size.
///
/// # Errors
///
/// Returns the underlying IO error when the file cannot be opened or read
/// (permission denied, vanished mid-scan). Callers omit the path from their
/// hash map and keep going rather than aborting the scan.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
