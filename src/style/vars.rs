//! `$(name)` placeholders.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Replace every `$(name)` with its value. Unknown names are left as is.
pub fn substitute<'a>(css: &'a str, vars: &BTreeMap<String, String>) -> Cow<'a, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\$\([ \t]*([A-Za-z0-9_-]+)[ \t]*\)").expect("valid var regex"));

    re.replace_all(css, |caps: &Captures<'_>| match vars.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute() {
        let vars = BTreeMap::from([
            ("brand".to_string(), "#004990".to_string()),
            ("gap-sm".to_string(), "4px".to_string()),
        ]);
        assert_eq!(
            substitute("a{color:$(brand);margin:$( gap-sm )}", &vars),
            "a{color:#004990;margin:4px}"
        );
        assert_eq!(substitute("a{color:$(unknown)}", &vars), "a{color:$(unknown)}");
        assert!(matches!(substitute("a{}", &vars), Cow::Borrowed(_)));
    }
}
