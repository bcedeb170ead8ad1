//! Environment fingerprint for scan-cache validity (made by FontLab https://www.fontlab.com/)
//!
//! A fingerprint is cheap on purpose: it walks directories and stats font
//! files but never opens one. Per directory it records the directory's
//! modification time, how many font files sit directly inside, and a digest
//! of each file's name, size and modification time. Installing, removing or
//! overwriting a font moves the fingerprint and the cache recomputes; an
//! untouched tree hashes identically no matter in which order the walker
//! visits it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};
use xxhash_rust::xxh3::Xxh3;

use crate::discovery::is_font;
use crate::platform::Platform;
use crate::scan::ScanOptions;

/// Bumped whenever the scan result layout or classification rules change.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed fingerprint string (e.g. read from a store).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DirState {
    path: PathBuf,
    present: bool,
    font_files: u64,
    /// Order-independent sum of per-file `(name, size, mtime)` hashes.
    files_digest: u64,
    mtime_nanos: u128,
}

/// Fingerprint the font-directory state of `directories` on `platform`.
pub fn fingerprint(platform: Platform, directories: &[PathBuf], opts: &ScanOptions) -> Fingerprint {
    let mut states = Vec::new();
    for root in directories {
        collect_dir_states(root, opts, &mut states);
    }
    states.sort();
    states.dedup();

    let mut hasher = Xxh3::new();
    hasher.update(platform.id().as_bytes());
    hasher.update(&CACHE_FORMAT_VERSION.to_le_bytes());
    hasher.update(&(opts.max_depth as u64).to_le_bytes());
    hasher.update(&[opts.follow_symlinks as u8]);
    for state in &states {
        hasher.update(state.path.to_string_lossy().as_bytes());
        hasher.update(&[0, state.present as u8]);
        hasher.update(&state.font_files.to_le_bytes());
        hasher.update(&state.files_digest.to_le_bytes());
        hasher.update(&state.mtime_nanos.to_le_bytes());
    }

    Fingerprint(format!("{}-{:016x}", platform.id(), hasher.digest()))
}

fn collect_dir_states(root: &Path, opts: &ScanOptions, states: &mut Vec<DirState>) {
    if !root.is_dir() {
        states.push(DirState {
            path: root.to_path_buf(),
            present: false,
            font_files: 0,
            files_digest: 0,
            mtime_nanos: 0,
        });
        return;
    }

    let mut current: Vec<DirState> = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(opts.follow_symlinks)
        .max_depth(opts.max_depth);
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() {
            current.push(DirState {
                path: entry.path().to_path_buf(),
                present: true,
                font_files: 0,
                files_digest: 0,
                mtime_nanos: mtime_nanos(entry.path()),
            });
        } else if is_font(entry.path()) {
            if let Some(parent) = entry.path().parent() {
                if let Some(dir) = current.iter_mut().rev().find(|d| d.path == parent) {
                    dir.font_files += 1;
                    dir.files_digest = dir.files_digest.wrapping_add(file_digest(&entry));
                }
            }
        }
    }
    states.extend(current);
}

fn file_digest(entry: &DirEntry) -> u64 {
    let (size, modified) = match entry.metadata() {
        Ok(meta) => (meta.len(), modified_nanos(meta.modified().ok())),
        Err(_) => (0, 0),
    };
    let mut hasher = Xxh3::new();
    hasher.update(entry.file_name().to_string_lossy().as_bytes());
    hasher.update(&size.to_le_bytes());
    hasher.update(&modified.to_le_bytes());
    hasher.digest()
}

fn mtime_nanos(path: &Path) -> u128 {
    modified_nanos(path.metadata().and_then(|m| m.modified()).ok())
}

fn modified_nanos(time: Option<SystemTime>) -> u128 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
