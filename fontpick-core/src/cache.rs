//! Scan cache keyed by environment fingerprint (made by FontLab https://www.fontlab.com/)
//!
//! Two layers:
//!
//! - [`ScanCache`] lives as long as the process. One entry per fingerprint,
//!   no TTL, dropped only by [`ScanCache::invalidate`] or [`ScanCache::clear`].
//! - [`PersistentStore`] optionally mirrors entries to JSON files so a new
//!   process can skip the scan when the fingerprint still matches.
//!
//! Concurrency: at most one compute runs per fingerprint. A second caller
//! asking for the same fingerprint while the first is computing blocks on
//! the same cell and receives the first caller's result. If that compute
//! fails the cell stays empty and the next caller computes again.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FontPickError, Result};
use crate::fingerprint::{Fingerprint, CACHE_FORMAT_VERSION};
use crate::record::ScanResult;

type Slot = Arc<OnceCell<Arc<ScanResult>>>;

#[derive(Debug, Default)]
pub struct ScanCache {
    slots: Mutex<HashMap<Fingerprint, Slot>>,
    store: Option<PersistentStore>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that also reads and writes `store`.
    pub fn with_store(store: PersistentStore) -> Self {
        Self {
            slots: Mutex::default(),
            store: Some(store),
        }
    }

    pub fn store(&self) -> Option<&PersistentStore> {
        self.store.as_ref()
    }

    /// Return the entry for `fingerprint`, running `compute` only on a miss.
    pub fn get_or_compute<F>(&self, fingerprint: &Fingerprint, compute: F) -> Result<Arc<ScanResult>>
    where
        F: FnOnce() -> Result<ScanResult>,
    {
        let slot = {
            let mut slots = self.lock();
            slots.entry(fingerprint.clone()).or_default().clone()
        };

        if let Some(hit) = slot.get() {
            debug!(%fingerprint, "scan cache hit");
            return Ok(hit.clone());
        }

        let result = slot.get_or_try_init(|| {
            if let Some(stored) = self.load_persisted(fingerprint) {
                return Ok(Arc::new(stored));
            }
            debug!(%fingerprint, "scan cache miss, computing");
            let fresh = compute()?;
            self.persist(&fresh);
            Ok::<_, FontPickError>(Arc::new(fresh))
        })?;
        Ok(result.clone())
    }

    /// Entry for `fingerprint` if one is already computed.
    pub fn peek(&self, fingerprint: &Fingerprint) -> Option<Arc<ScanResult>> {
        self.lock()
            .get(fingerprint)
            .and_then(|slot| slot.get().cloned())
    }

    /// Forget `fingerprint` here and in the persistent store.
    pub fn invalidate(&self, fingerprint: &Fingerprint) {
        self.lock().remove(fingerprint);
        if let Some(store) = &self.store {
            if let Err(err) = store.remove(fingerprint) {
                warn!(%fingerprint, error = %err, "could not remove persisted scan");
            }
        }
    }

    /// Forget every in-process entry. Persisted files stay.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_persisted(&self, fingerprint: &Fingerprint) -> Option<ScanResult> {
        let store = self.store.as_ref()?;
        match store.load(fingerprint) {
            Ok(found) => found,
            Err(err) => {
                warn!(%fingerprint, error = %err, "ignoring unreadable persisted scan");
                None
            }
        }
    }

    fn persist(&self, result: &ScanResult) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(result) {
                warn!(fingerprint = %result.fingerprint(), error = %err, "could not persist scan");
            }
        }
    }
}

/// On-disk envelope; the version guards against layout changes.
#[derive(Serialize, Deserialize)]
struct StoredScan {
    format_version: u32,
    fingerprint: Fingerprint,
    result: ScanResult,
}

/// Directory of `scan-<fingerprint>.json` files.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    dir: PathBuf,
}

impl PersistentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("scan-{}.json", fingerprint.as_str()))
    }

    /// Load the scan stored for `fingerprint`.
    ///
    /// A missing file is `Ok(None)`. A file whose envelope names another
    /// fingerprint or format version is deleted and also yields `Ok(None)`.
    pub fn load(&self, fingerprint: &Fingerprint) -> Result<Option<ScanResult>> {
        let path = self.path_for(fingerprint);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(cache_error(&path, anyhow!(err))),
        };

        let stored: StoredScan = serde_json::from_slice(&bytes)
            .with_context(|| format!("decoding {}", path.display()))
            .map_err(|err| cache_error(&path, err))?;

        if stored.format_version != CACHE_FORMAT_VERSION
            || &stored.fingerprint != fingerprint
            || stored.result.fingerprint() != fingerprint
        {
            warn!(path = %path.display(), "persisted scan is stale, discarding");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        debug!(path = %path.display(), "loaded persisted scan");
        Ok(Some(stored.result))
    }

    pub fn save(&self, result: &ScanResult) -> Result<PathBuf> {
        let path = self.path_for(result.fingerprint());
        let envelope = StoredScan {
            format_version: CACHE_FORMAT_VERSION,
            fingerprint: result.fingerprint().clone(),
            result: result.clone(),
        };

        let write = || -> anyhow::Result<()> {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("creating cache directory {}", self.dir.display()))?;
            let json = serde_json::to_vec(&envelope)?;
            let tmp = path.with_extension("json.tmp");
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            Ok(())
        };
        write().map_err(|err| cache_error(&path, err))?;

        match self.prune_superseded(result.fingerprint()) {
            Ok(0) => {}
            Ok(pruned) => debug!(pruned, "removed superseded persisted scans"),
            Err(err) => warn!(error = %err, "could not prune superseded persisted scans"),
        }
        Ok(path)
    }

    /// Delete scans of the same platform stored under any other fingerprint.
    ///
    /// Fingerprints look like `<platform>-<hash>`; scans of other platforms
    /// sharing the directory are left alone.
    pub fn prune_superseded(&self, keep: &Fingerprint) -> Result<usize> {
        let platform = keep.as_str().split('-').next().unwrap_or_default();
        let prefix = format!("scan-{platform}-");
        let keep_name = format!("scan-{}.json", keep.as_str());
        self.remove_matching(|name| name.starts_with(&prefix) && name.ends_with(".json") && name != keep_name)
    }

    pub fn remove(&self, fingerprint: &Fingerprint) -> Result<()> {
        let path = self.path_for(fingerprint);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(cache_error(&path, anyhow!(err))),
        }
    }

    /// Delete every stored scan; returns how many files were removed.
    pub fn purge(&self) -> Result<usize> {
        self.remove_matching(|name| name.starts_with("scan-") && name.ends_with(".json"))
    }

    fn remove_matching(&self, wanted: impl Fn(&str) -> bool) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(cache_error(&self.dir, anyhow!(err))),
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if wanted(&name) {
                fs::remove_file(entry.path()).map_err(|err| cache_error(&entry.path(), anyhow!(err)))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn cache_error(path: &Path, source: anyhow::Error) -> FontPickError {
    FontPickError::Cache {
        path: path.to_path_buf(),
        source,
    }
}
