//! `respipe source`: what an artifact was built from.

use anyhow::{Result, bail};
use respipe::{PipelineConfig, Resolver};

pub fn run_source(artifact: &str, config: PipelineConfig) -> Result<()> {
    let resolver = Resolver::new(config);
    let Some(sources) = resolver.source_files(artifact) else {
        bail!("no build record for `{artifact}`");
    };
    for source in sources {
        println!("{source}");
    }
    Ok(())
}
