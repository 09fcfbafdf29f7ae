//! respipe - a web asset pipeline.
//!
//! Resolves stylesheet and script references to versioned URLs, minifying
//! scripts, crushing stylesheets and bundling lists of resources on the way.
//! Built artifacts are tracked per directory so unchanged inputs are served
//! from disk, and slow compiler builds are staged for a separate runner
//! while a quick fallback is served in the meantime.
//!
//! ```ignore
//! use respipe::{PipelineConfig, ResolveOptions, ResourceRef, Resolver};
//!
//! let resolver = Resolver::new(PipelineConfig::load(None)?);
//! let url = resolver.resolve(&ResourceRef::name("imagefill"), &ResolveOptions::default())?;
//! // https://static.example.edu/js/min/imageFill-1f0c….js?v=2tmp
//! ```

#[macro_use]
pub mod logger;

pub mod artifact;
pub mod cache;
pub mod config;
pub mod freshness;
pub mod minify;
pub mod registry;
pub mod resolver;
pub mod stage;
pub mod style;
pub mod utils;

pub use config::PipelineConfig;
pub use registry::{AssetKind, ResourceRef, ResourceSpec, VersionRegistry};
pub use resolver::{Crush, ResolveError, ResolveOptions, Resolver};
