//! Unified hashing utilities using blake3.
//!
//! Artifact names and option fingerprints end up on disk and in URLs, so the
//! hash must be stable across builds and platforms.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let name = hash::digest("/js/jquery"); // -> 32 hex chars
//! ```

use std::collections::BTreeMap;

/// Length of the hex digest embedded in artifact names.
pub const DIGEST_LEN: usize = 32;

/// Compute a 32-char hex digest of the given bytes.
#[inline]
pub fn digest<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let hash = blake3::hash(data.as_ref());
    hex::encode(&hash.as_bytes()[..DIGEST_LEN / 2])
}

/// Hash a set of build options.
///
/// Keys are sorted (`BTreeMap`) before serializing, so two maps with the same
/// entries always produce the same hash regardless of insertion order.
pub fn options_hash(options: &BTreeMap<String, String>) -> String {
    let json = serde_json::to_string(options).unwrap_or_default();
    digest(&json)
}
