//! In-process minification for JS and CSS.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. These produce the
//! temporary fallback artifacts and run staged jobs when no external
//! compiler is configured.

use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, CompressOptionsUnused, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;

use crate::registry::AssetKind;

/// Minify JavaScript source code.
///
/// Sources are classic browser scripts: top-level declarations are globals
/// other scripts read, so they are neither dropped nor renamed.
pub fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::script()).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(false),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions {
            unused: CompressOptionsUnused::Keep,
            ..CompressOptions::smallest()
        }),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify `source`, falling back to the input when it doesn't parse.
pub fn minify_or_passthrough(kind: AssetKind, source: &str) -> String {
    let minified = match kind {
        AssetKind::Script => minify_js(source),
        AssetKind::Style => minify_css(source),
    };
    minified.unwrap_or_else(|| {
        crate::debug!("minify"; "{} source didn't parse, kept as is", kind);
        source.to_owned()
    })
}

/// Minify each file on its own and join the results, one per line.
///
/// Sources are minified separately so one file's syntax error only leaves
/// that file unminified.
pub fn minify_files(kind: AssetKind, sources: &[PathBuf]) -> std::io::Result<String> {
    let mut out = String::new();
    for source in sources {
        let content = fs::read_to_string(source)?;
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&minify_or_passthrough(kind, &content));
    }
    Ok(out)
}

/// Drop one leading `/* ... */` header block (and the whitespace after it).
pub fn strip_leading_comment(source: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)\A/\*.*?\*/[ \t\r\n]?").expect("valid header regex"));
    re.replace(source, "")
}
