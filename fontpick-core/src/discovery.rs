//! Font file discovery for fontpick-core (made by FontLab https://www.fontlab.com/)

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory depth the walker never descends past; bounds symlink cycles.
pub const MAX_SCAN_DEPTH: usize = 8;

/// Path to a candidate font file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSourceRef {
    pub path: PathBuf,
}

/// Trait for enumerating fonts from some backing store.
pub trait FontDiscovery {
    fn discover(&self) -> Result<Vec<FontSourceRef>>;
}

/// Recursive, depth-bounded filesystem walker that collects font containers.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    roots: Vec<PathBuf>,
    follow_symlinks: bool,
    max_depth: usize,
}

impl PathDiscovery {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = roots.into_iter().map(Into::into).collect();
        Self {
            roots,
            follow_symlinks: false,
            max_depth: MAX_SCAN_DEPTH,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl FontDiscovery for PathDiscovery {
    /// Missing roots and unreadable entries are skipped; the result is
    /// sorted and free of duplicates so overlapping roots are harmless.
    fn discover(&self) -> Result<Vec<FontSourceRef>> {
        let mut found = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                debug!(root = %root.display(), "font directory missing, skipping");
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(self.follow_symlinks)
                .max_depth(self.max_depth);
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if entry.file_type().is_file() && is_font(entry.path()) {
                    found.push(FontSourceRef {
                        path: entry.path().to_path_buf(),
                    });
                }
            }
        }

        found.sort();
        found.dedup();
        Ok(found)
    }
}

/// Single fonts (`ttf`, `otf`) and collections (`ttc`, `otc`).
pub fn is_font(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return false,
    };

    matches!(ext.as_str(), "ttf" | "otf" | "ttc" | "otc")
}
