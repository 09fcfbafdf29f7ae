//! Resolution errors.
//!
//! Only structural problems surface here. Missing resources, cache trouble
//! and failed builds degrade to a plainer URL instead.

use thiserror::Error;

use crate::artifact::PublishError;
use crate::registry::AssetKind;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("`{path}` can't be bundled with {expected} resources")]
    MixedResourceTypes { expected: AssetKind, path: String },

    #[error("`{0}` is neither a script nor a stylesheet")]
    UnsupportedType(String),

    #[error("couldn't write bundle")]
    BundleWrite(#[source] PublishError),
}
