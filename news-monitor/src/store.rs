use crate::fingerprint::Fingerprint;
use crate::types::Result;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Persisted, bounded set of fingerprints of articles that were already delivered.
///
/// Membership lives in a `HashSet`; `order` keeps insertion order so that
/// eviction drops the oldest entries first.
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: Option<PathBuf>,
    max_stored: usize,
    members: HashSet<Fingerprint>,
    order: Vec<Fingerprint>,
}

impl FingerprintStore {
    /// Load the store from `path`. A missing or unreadable file yields an empty store.
    pub fn load(path: impl Into<PathBuf>, max_stored: usize) -> Self {
        let path = path.into();
        let loaded = match read_fingerprints(&path) {
            Ok(fps) => {
                info!("Loaded {} processed fingerprints from {}", fps.len(), path.display());
                fps
            }
            Err(LoadError::Missing) => {
                warn!("No fingerprint file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(LoadError::Unreadable(reason)) => {
                warn!("Fingerprint file {} is unreadable ({}), starting empty", path.display(), reason);
                Vec::new()
            }
        };

        let mut store = Self {
            path: Some(path),
            max_stored,
            members: HashSet::with_capacity(loaded.len()),
            order: Vec::with_capacity(loaded.len()),
        };
        store.insert_all(loaded);
        store
    }

    /// A store without a backing file. Commits only change memory.
    pub fn in_memory(max_stored: usize) -> Self {
        Self {
            path: None,
            max_stored,
            members: HashSet::new(),
            order: Vec::new(),
        }
    }

    /// Same contents, detached from the backing file.
    pub fn detached(&self) -> Self {
        Self {
            path: None,
            ..self.clone()
        }
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.members.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn max_stored(&self) -> usize {
        self.max_stored
    }

    /// Fingerprints in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.order.iter()
    }

    /// Merge `fingerprints`, evict if over capacity, then persist.
    ///
    /// Returns how many fingerprints were new. Write failures are logged and
    /// otherwise ignored; the in-memory state is kept either way.
    pub fn commit<I>(&mut self, fingerprints: I) -> usize
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let added = self.insert_all(fingerprints);
        self.evict_if_needed();

        if let Some(path) = &self.path {
            match write_fingerprints(path, &self.order) {
                Ok(()) => debug!("Saved {} fingerprints to {}", self.order.len(), path.display()),
                Err(e) => error!("Failed to save fingerprints to {}: {}", path.display(), e),
            }
        }

        added
    }

    fn insert_all<I>(&mut self, fingerprints: I) -> usize
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut added = 0;
        for fp in fingerprints {
            if self.members.insert(fp.clone()) {
                self.order.push(fp);
                added += 1;
            }
        }
        added
    }

    fn evict_if_needed(&mut self) {
        if self.order.len() <= self.max_stored {
            return;
        }

        let keep = self.max_stored / 2;
        let drop = self.order.len() - keep;
        for fp in self.order.drain(..drop) {
            self.members.remove(&fp);
        }
        info!("Evicted {} oldest fingerprints, {} kept", drop, keep);
    }
}

enum LoadError {
    Missing,
    Unreadable(String),
}

fn read_fingerprints(path: &Path) -> std::result::Result<Vec<Fingerprint>, LoadError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(LoadError::Missing),
        Err(e) => return Err(LoadError::Unreadable(e.to_string())),
    };
    serde_json::from_str(&content).map_err(|e| LoadError::Unreadable(e.to_string()))
}

/// Write to a sibling temp file and rename it over the target.
fn write_fingerprints(path: &Path, fingerprints: &[Fingerprint]) -> Result<()> {
    let json = serde_json::to_string_pretty(fingerprints)?;

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, json)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn fp(n: usize) -> Fingerprint {
        Fingerprint::from(format!("{:032x}", n))
    }

    #[test]
    fn eviction_keeps_newest_half() {
        let mut store = FingerprintStore::in_memory(10);
        store.commit((0..8).map(fp));
        assert_eq!(store.len(), 8);

        // 8 + 4 = 12 > 10, trimmed down to 5
        store.commit((8..12).map(fp));
        assert_eq!(store.len(), 5);
        let kept: Vec<_> = store.iter().cloned().collect();
        assert_eq!(kept, (7..12).map(fp).collect::<Vec<_>>());
        assert!(!store.contains(&fp(0)));
        assert!(store.contains(&fp(11)));
    }

    #[test]
    fn at_capacity_is_not_evicted() {
        let mut store = FingerprintStore::in_memory(4);
        store.commit((0..4).map(fp));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn duplicates_in_one_commit_count_once() {
        let mut store = FingerprintStore::in_memory(10);
        let added = store.commit(vec![fp(1), fp(1), fp(2)]);
        assert_eq!(added, 2);
        assert_eq!(store.len(), 2);
    }

    /// Records the level of every event emitted while it is the default subscriber.
    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl<S: Subscriber> Layer<S> for LevelRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    fn levels_logged_by_load(path: &Path) -> Vec<Level> {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(LevelRecorder(levels.clone()));
        let store = tracing::subscriber::with_default(subscriber, || FingerprintStore::load(path, 10));
        assert!(store.is_empty());
        let levels = levels.lock().unwrap().clone();
        levels
    }

    #[test]
    fn missing_and_corrupt_files_warn() {
        let dir = tempfile::TempDir::new().unwrap();

        let missing = dir.path().join("absent.json");
        assert!(levels_logged_by_load(&missing).contains(&Level::WARN));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "[1, 2").unwrap();
        assert!(levels_logged_by_load(&corrupt).contains(&Level::WARN));
    }

    #[test]
    fn detached_copy_does_not_touch_original() {
        let mut original = FingerprintStore::in_memory(10);
        original.commit(vec![fp(1)]);
        let mut copy = original.detached();
        copy.commit(vec![fp(2)]);
        assert!(!original.contains(&fp(2)));
        assert!(copy.contains(&fp(1)));
    }
}
