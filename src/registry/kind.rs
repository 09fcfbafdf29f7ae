use crate::utils::path::web;

/// Resource type, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Script,
    Style,
}

impl AssetKind {
    pub fn from_path(path: &str) -> Option<Self> {
        match web::extension(path)? {
            "js" => Some(Self::Script),
            "css" => Some(Self::Style),
            _ => None,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
