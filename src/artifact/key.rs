//! Artifact names.
//!
//! | Class  | Name                                            |
//! |--------|-------------------------------------------------|
//! | single | `{stem}-{digest(dirname)}.{ext}`                |
//! | bundle | `{stem(last source)}BNDL-{digest(paths)}.{ext}` |
//!
//! Single files hash their web directory, so `/a/app.js` and `/b/app.js`
//! get different artifacts. Bundles hash the ordered, comma-joined input
//! paths: the same inputs in the same order always name the same artifact.

use crate::registry::AssetKind;
use crate::utils::hash::digest;
use crate::utils::path::web;

/// `/js/jquery/plugin.js` → `plugin-<digest("/js/jquery")>.js`
pub fn single_key(path: &str, kind: AssetKind) -> String {
    format!(
        "{}-{}.{}",
        web::stem(path),
        digest(web::dirname(path)),
        kind.extension()
    )
}

/// Name of the bundle built from `paths` (in order).
///
/// `last_source` is the original path of the last member, before any
/// rewriting, so the name stays readable.
pub fn bundle_key(paths: &[String], last_source: &str, kind: AssetKind) -> String {
    format!(
        "{}BNDL-{}.{}",
        web::stem(last_source),
        digest(&paths.join(",")),
        kind.extension()
    )
}
