//! Mtime-based freshness detection.
//!
//! Cache records store whole-second modification times. Comparison is exact
//! equality, not "newer than": a source copied in from another machine may
//! carry an older mtime than the artifact built from its predecessor, and
//! must still invalidate it.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Whole-second Unix modification time.
pub type ModTime = u64;

/// Get the modification time of a file in whole seconds.
///
/// Returns `None` if the file doesn't exist or its mtime cannot be read.
pub fn mod_time(path: &Path) -> Option<ModTime> {
    let modified = path.metadata().and_then(|m| m.modified()).ok()?;
    Some(to_secs(modified))
}

/// Modification time, `0` for missing files.
///
/// Bundles record a neutral fingerprint for absent members instead of
/// aborting.
pub fn mod_time_or_zero(path: &Path) -> ModTime {
    mod_time(path).unwrap_or(0)
}

fn to_secs(time: SystemTime) -> ModTime {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) fn set_mod_time(path: &Path, secs: ModTime) {
    use std::time::Duration;
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}
