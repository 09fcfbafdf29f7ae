//! Web-path helpers.
//!
//! Resource paths are URL paths (`/js/jquery/select2.js`), not OS paths, so
//! they are split on `/` directly instead of going through `std::path`.

/// Directory part: `/js/a.js` → `/js`, `/a.js` → `/`.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// File name part: `/js/a.min.js` → `a.min.js`.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension without the dot: `/js/a.min.js` → `Some("js")`.
pub fn extension(path: &str) -> Option<&str> {
    let name = basename(path);
    name.rfind('.')
        .filter(|&idx| idx > 0)
        .map(|idx| &name[idx + 1..])
}

/// File name without its extension: `/js/a.min.js` → `a.min`.
pub fn stem(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Join a directory (`/js/min/`) and a file name.
pub fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}
