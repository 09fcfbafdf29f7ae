//! Freshness detection: integer mtimes for cache records, embedded content
//! markers for crushed stylesheets.

mod marker;
pub mod mtime;

pub use marker::{build_marker, compute_file_hash, is_fresh};
pub use mtime::{ModTime, mod_time, mod_time_or_zero};
