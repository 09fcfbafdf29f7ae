//! Shared helpers: hashing, doc-root path mapping, external commands.

pub mod exec;
pub mod hash;
pub mod path;
