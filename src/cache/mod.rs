//! Artifact cache: per-directory records of what each built artifact was
//! made from.
//!
//! Every artifact directory holds one document per [`ArtifactClass`]. A
//! record is written after each successful build and read on every
//! resolution; nothing here deletes records. I/O failures never surface as
//! errors: a broken document reads as empty and a failed commit is logged,
//! so the pipeline degrades to rebuilding.

mod record;
mod store;

pub use record::{ArtifactRecord, ModTimes, Validity};
pub use store::{CacheDocument, JsonFileStore, MemoryStore, RecordStore};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sidecar extension marking an artifact as a temporary fallback build.
pub const TEMP_FLAG_EXT: &str = "tmpFlag";

/// Version suffix for URLs that point at a temporary artifact.
pub const TEMP_VERSION_SUFFIX: &str = "tmp";

/// Path of the temporary flag for `artifact` (`a-1f.js` → `a-1f.js.tmpFlag`).
pub fn temp_flag(artifact: &Path) -> PathBuf {
    let mut name = OsString::from(artifact.as_os_str());
    name.push(".");
    name.push(TEMP_FLAG_EXT);
    PathBuf::from(name)
}

/// Whether `artifact` is still the temporary fallback build.
pub fn is_temporary(artifact: &Path) -> bool {
    temp_flag(artifact).exists()
}

/// Artifact classes, each with its own cache document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactClass {
    /// One minified source file.
    Single,
    /// Several sources joined into one file.
    Bundle,
}

impl ArtifactClass {
    pub const ALL: [Self; 2] = [Self::Single, Self::Bundle];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Single => ".cacheinfo",
            Self::Bundle => ".bundleinfo",
        }
    }
}

/// Cache handle for one artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    store: Arc<dyn RecordStore>,
}

impl ArtifactCache {
    /// Cache backed by JSON documents inside `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::with_store(Arc::new(JsonFileStore::new(dir)))
    }

    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn document(&self, class: ArtifactClass) -> CacheDocument {
        match self.store.load(class) {
            Ok(doc) => doc,
            Err(e) => {
                crate::debug!("cache"; "unreadable {}: {}", self.store.location(class), e);
                CacheDocument::new()
            }
        }
    }

    pub fn lookup(&self, class: ArtifactClass, key: &str) -> Option<ArtifactRecord> {
        self.document(class).remove(key)
    }

    /// Look up `key` and compare it with the current state of its sources.
    pub fn check(
        &self,
        class: ArtifactClass,
        key: &str,
        artifact: &Path,
        current: &ModTimes,
        options_hash: &str,
        custom_options: bool,
    ) -> Validity {
        let record = self.lookup(class, key);
        Validity::check(
            record.as_ref(),
            artifact.exists(),
            current,
            options_hash,
            custom_options,
        )
    }

    /// Store `record` under `key`, replacing any previous one.
    ///
    /// Returns `false` (after a warning) when the document can't be written.
    pub fn commit(&self, class: ArtifactClass, key: &str, record: ArtifactRecord) -> bool {
        let mut doc = self.document(class);
        doc.insert(key.to_owned(), record);
        match self.store.save(class, &doc) {
            Ok(()) => true,
            Err(e) => {
                crate::log!("warning"; "couldn't write {}: {}", self.store.location(class), e);
                false
            }
        }
    }

    /// Source files recorded for an artifact, searching every class.
    pub fn source_files(&self, key: &str) -> Option<Vec<String>> {
        ArtifactClass::ALL
            .into_iter()
            .find_map(|class| self.lookup(class, key))
            .map(|record| record.source_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(time: u64, source: &str) -> ArtifactRecord {
        ArtifactRecord::new(ModTimes::Single(time), "opts", vec![source.into()])
    }

    #[test]
    fn test_temp_flag_path() {
        assert_eq!(
            temp_flag(Path::new("/www/js/min/a-1f.js")),
            PathBuf::from("/www/js/min/a-1f.js.tmpFlag")
        );
    }

    #[test]
    fn test_commit_then_lookup() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::open(dir.path());

        assert!(cache.lookup(ArtifactClass::Single, "a-1f.js").is_none());
        assert!(cache.commit(ArtifactClass::Single, "a-1f.js", record(3, "/js/a.js")));
        assert!(cache.commit(ArtifactClass::Single, "b-2e.js", record(4, "/js/b.js")));

        let found = cache.lookup(ArtifactClass::Single, "a-1f.js").unwrap();
        assert_eq!(found.source_mod_times, ModTimes::Single(3));
        // other keys survive a commit
        assert!(cache.lookup(ArtifactClass::Single, "b-2e.js").is_some());
        assert!(cache.lookup(ArtifactClass::Bundle, "a-1f.js").is_none());
    }

    #[test]
    fn test_commit_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::open(dir.path());
        cache.commit(ArtifactClass::Single, "a.js", record(1, "/js/a.js"));
        cache.commit(ArtifactClass::Single, "a.js", record(2, "/js/a.js"));

        let found = cache.lookup(ArtifactClass::Single, "a.js").unwrap();
        assert_eq!(found.source_mod_times, ModTimes::Single(2));
    }

    #[test]
    fn test_corrupt_document_reads_empty_and_recovers() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".cacheinfo"), "garbage").unwrap();
        let cache = ArtifactCache::open(dir.path());

        assert!(cache.lookup(ArtifactClass::Single, "a.js").is_none());
        assert!(cache.commit(ArtifactClass::Single, "a.js", record(1, "/js/a.js")));
        assert!(cache.lookup(ArtifactClass::Single, "a.js").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_skips_commit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores directory permissions
        if fs::write(locked.join("probe"), "").is_ok() {
            return;
        }

        let cache = ArtifactCache::open(&locked);
        assert!(!cache.commit(ArtifactClass::Single, "a.js", record(1, "/js/a.js")));
        assert!(cache.lookup(ArtifactClass::Single, "a.js").is_none());
    }

    #[test]
    fn test_check_uses_artifact_presence() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::open(dir.path());
        let artifact = dir.path().join("a.js");
        cache.commit(ArtifactClass::Single, "a.js", record(5, "/js/a.js"));

        let current = ModTimes::Single(5);
        assert_eq!(
            cache.check(ArtifactClass::Single, "a.js", &artifact, &current, "opts", false),
            Validity::Stale
        );
        fs::write(&artifact, "x").unwrap();
        assert_eq!(
            cache.check(ArtifactClass::Single, "a.js", &artifact, &current, "opts", false),
            Validity::Valid
        );
    }

    #[test]
    fn test_source_files_searches_both_classes() {
        let cache = ArtifactCache::with_store(Arc::new(MemoryStore::new()));
        cache.commit(
            ArtifactClass::Bundle,
            "bBNDL-9a.js",
            ArtifactRecord::new(
                ModTimes::Ordered(vec![1, 2]),
                "",
                vec!["/js/a.js".into(), "/js/b.js".into()],
            ),
        );

        assert_eq!(
            cache.source_files("bBNDL-9a.js").unwrap(),
            vec!["/js/a.js".to_string(), "/js/b.js".to_string()]
        );
        assert!(cache.source_files("nope.js").is_none());
    }
}
