/// Content fingerprinting via xxh3
///
/// Streams a file's bytes through a 64-bit xxh3 digest and renders it as
/// a fixed-width hex string. The fingerprint detects accidental content
/// change only - it is collision-weak by modern standards and must not
/// be treated as integrity-grade.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Read size for the streaming hash loop
const CHUNK_SIZE: usize = 64 * 1024;

/// Fingerprint a file's full content
///
/// Reads in fixed-size chunks so arbitrarily large assets never get
/// buffered whole. Identical bytes always yield the identical
/// fingerprint, regardless of path or timestamps.
///
/// # Returns
/// * `Ok(fingerprint)` - 16 hex digit fingerprint
/// * `Err(message)` - the I/O error, verbatim, if the file became
///   unreadable (e.g., deleted between stat and read)
pub fn fingerprint_file(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| e.to_string())?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:016x}", hasher.digest()))
}

/// Fingerprint an in-memory buffer
///
/// Produces the same fingerprint `fingerprint_file` would for a file
/// with these bytes.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    format!("{:016x}", xxh3_64(bytes))
}
