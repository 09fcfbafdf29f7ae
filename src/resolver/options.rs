//! Per-call resolution options.

use crate::style::{CrushMethod, StyleOptions};

/// Stylesheet crushing for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Crush {
    /// Only resources with `crush = true` are crushed.
    Disabled,
    /// Crush every stylesheet without `crush = false`.
    #[default]
    Enabled,
    /// Like `Enabled`, with transform options.
    With(StyleOptions),
}

impl Crush {
    pub fn requested(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Transform options; `minify` can only turn minification off.
    pub(crate) fn style_options(&self, minify: bool) -> StyleOptions {
        let mut options = match self {
            Self::With(options) => options.clone(),
            _ => StyleOptions::default(),
        };
        options.minify &= minify;
        options
    }

    /// Options for crushing a bundle member: always a file, minified unless
    /// minification is off site-wide.
    pub(crate) fn member_options(&self, minify: bool) -> StyleOptions {
        StyleOptions {
            method: CrushMethod::File,
            ..self.style_options(minify)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Minify scripts (also subject to `site.minify`).
    pub minify: bool,
    pub crush: Crush,
    /// Prefix URLs with `site.host`.
    pub include_host: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            minify: true,
            crush: Crush::Enabled,
            include_host: true,
        }
    }
}

impl ResolveOptions {
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn with_crush(mut self, crush: Crush) -> Self {
        self.crush = crush;
        self
    }

    pub fn with_host(mut self, include_host: bool) -> Self {
        self.include_host = include_host;
        self
    }
}
