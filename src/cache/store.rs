//! Cache document persistence.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::ArtifactClass;
use super::record::ArtifactRecord;

/// Artifact key → record, one document per artifact class.
///
/// Ordered so the file on disk is stable between runs.
pub type CacheDocument = BTreeMap<String, ArtifactRecord>;

/// Where cache documents live.
///
/// `load` reports a missing document as an empty one; read and parse
/// failures are errors so the caller can decide how loud to be.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    fn load(&self, class: ArtifactClass) -> io::Result<CacheDocument>;
    fn save(&self, class: ArtifactClass, doc: &CacheDocument) -> io::Result<()>;
    /// Human readable location, for log messages.
    fn location(&self, class: ArtifactClass) -> String;
}

/// JSON documents stored next to the artifacts they describe.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, class: ArtifactClass) -> PathBuf {
        self.dir.join(class.file_name())
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self, class: ArtifactClass) -> io::Result<CacheDocument> {
        let path = self.path(class);
        if !path.exists() {
            return Ok(CacheDocument::new());
        }

        let json = fs::read_to_string(&path)?;
        if json.trim().is_empty() {
            return Ok(CacheDocument::new());
        }
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn save(&self, class: ArtifactClass, doc: &CacheDocument) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(class);
        let json = serde_json::to_string_pretty(doc)?;

        // Readers never observe a half-written document
        let tmp = self
            .dir
            .join(format!("{}.{}.tmp", class.file_name(), std::process::id()));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    fn location(&self, class: ArtifactClass) -> String {
        self.path(class).display().to_string()
    }
}

/// In-memory store for embedders that keep the cache elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<FxHashMap<ArtifactClass, CacheDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, class: ArtifactClass) -> io::Result<CacheDocument> {
        Ok(self.docs.lock().get(&class).cloned().unwrap_or_default())
    }

    fn save(&self, class: ArtifactClass, doc: &CacheDocument) -> io::Result<()> {
        self.docs.lock().insert(class, doc.clone());
        Ok(())
    }

    fn location(&self, class: ArtifactClass) -> String {
        format!("<memory>/{}", class.file_name())
    }
}
