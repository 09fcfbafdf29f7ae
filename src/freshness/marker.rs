//! Content-hash freshness markers (blake3).
//!
//! Crushed stylesheets start with a comment line naming the hash of the source
//! they were built from and the hash of the transform options:
//!
//! ```text
//! /*respipe:hash:3f2a9c01d4e5b6a7:0c1d2e3f40516273*/
//! ```
//!
//! An output is fresh when the marker for the current source and options is
//! present, so editing the source *or* changing crush variables both rebuild.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Compute blake3 hash of file contents as hex.
///
/// Returns `None` if the file cannot be read.
pub fn compute_file_hash(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }

    Some(hasher.finalize().to_hex().to_string())
}

/// Build marker: `/*respipe:hash:SOURCEHASH:OPTIONSHASH*/`
pub fn build_marker(source_hash: &str, options_hash: &str) -> String {
    format!(
        "/*respipe:hash:{}:{}*/",
        &source_hash[..16.min(source_hash.len())],
        &options_hash[..16.min(options_hash.len())]
    )
}

/// Check if output is fresh by comparing its embedded marker.
pub fn is_fresh(source: &Path, output: &Path, options_hash: &str) -> bool {
    if !output.exists() {
        return false;
    }

    let Some(source_hash) = compute_file_hash(source) else {
        return false;
    };

    let Ok(output_content) = fs::read(output) else {
        return false;
    };

    let marker = build_marker(&source_hash, options_hash);
    output_content
        .windows(marker.len())
        .any(|w| w == marker.as_bytes())
}
