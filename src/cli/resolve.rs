//! `respipe resolve`: print the URL for one resource or a bundle.

use std::sync::Arc;

use anyhow::Result;
use respipe::config::StageMode;
use respipe::log;
use respipe::stage::{JobRunner, WorkerQueue};
use respipe::style::{CrushMethod, StyleOptions};
use respipe::{Crush, PipelineConfig, ResolveOptions, ResourceRef, Resolver};

use super::ResolveArgs;

pub fn run_resolve(args: &ResolveArgs, config: PipelineConfig) -> Result<()> {
    let request = parse_refs(&args.refs);
    let options = resolve_options(args);

    // In-process workers must finish before the process exits.
    let workers = (config.js.stage.mode == StageMode::Worker).then(|| {
        Arc::new(WorkerQueue::start(
            config.js.stage.workers,
            JobRunner::from_config(&config),
        ))
    });

    let resolver = match &workers {
        Some(queue) => Resolver::new_with_queue(config, queue.clone()),
        None => Resolver::new(config),
    };

    let url = resolver.resolve(&request, &options)?;
    if url.is_empty() {
        log!("warning"; "nothing resolved for {}", args.refs.join(" "));
    } else {
        println!("{url}");
    }

    if let Some(queue) = workers {
        queue.wait_idle();
    }
    Ok(())
}

fn parse_refs(refs: &[String]) -> ResourceRef {
    match refs {
        [single] => ResourceRef::parse(single),
        _ => ResourceRef::Group(refs.iter().map(|r| ResourceRef::parse(r)).collect()),
    }
}

fn resolve_options(args: &ResolveArgs) -> ResolveOptions {
    let crush = if args.no_crush {
        Crush::Disabled
    } else if args.inline {
        Crush::With(StyleOptions {
            method: CrushMethod::Inline,
            ..StyleOptions::default()
        })
    } else {
        Crush::Enabled
    };

    ResolveOptions::default()
        .with_minify(!args.no_minify)
        .with_crush(crush)
        .with_host(!args.no_host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(refs: &[&str]) -> ResolveArgs {
        ResolveArgs {
            refs: refs.iter().map(|r| r.to_string()).collect(),
            no_minify: false,
            no_crush: false,
            no_host: false,
            inline: false,
        }
    }

    #[test]
    fn test_parse_refs() {
        assert_eq!(parse_refs(&args(&["imagefill"]).refs), ResourceRef::name("imagefill"));

        let ResourceRef::Group(items) = parse_refs(&args(&["a", "/js/b.js@2"]).refs) else {
            panic!("expected group");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1],
            ResourceRef::Spec(respipe::ResourceSpec::new("/js/b.js").with_version(2))
        );
    }

    #[test]
    fn test_resolve_options_from_flags() {
        let mut flags = args(&["a"]);
        assert_eq!(resolve_options(&flags), ResolveOptions::default());

        flags.no_crush = true;
        flags.no_host = true;
        let options = resolve_options(&flags);
        assert_eq!(options.crush, Crush::Disabled);
        assert!(!options.include_host);

        flags.no_crush = false;
        flags.inline = true;
        let Crush::With(style) = resolve_options(&flags).crush else {
            panic!("expected inline crush");
        };
        assert_eq!(style.method, CrushMethod::Inline);
    }
}
