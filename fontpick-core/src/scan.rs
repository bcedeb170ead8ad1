//! Scanner: font files in, face skeletons out (made by FontLab https://www.fontlab.com/)

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use read_fonts::tables::name::{Name, NameId};
use read_fonts::{FontRef, TableProvider};
use tracing::{info, warn};

use crate::discovery::{FontDiscovery, PathDiscovery, MAX_SCAN_DEPTH};
use crate::error::{FontPickError, Result};
use crate::record::{FontStyle, ScanWarning};

const FS_SELECTION_ITALIC: u16 = 1 << 0;
const FS_SELECTION_BOLD: u16 = 1 << 5;
const FS_SELECTION_OBLIQUE: u16 = 1 << 9;
const BOLD_WEIGHT_THRESHOLD: u16 = 600;
const ENGLISH_US: u16 = 0x0409;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub follow_symlinks: bool,
    pub jobs: Option<usize>,
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            jobs: None,
            max_depth: MAX_SCAN_DEPTH,
        }
    }
}

/// Raw facts about one face, before classification and scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSkeleton {
    pub family: String,
    pub path: PathBuf,
    pub face_index: Option<u32>,
    pub style: FontStyle,
    pub weight: u16,
    pub file_size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Unique by `(family, style)`, ordered by `(path, face_index)`.
    pub skeletons: Vec<FontSkeleton>,
    pub warnings: Vec<ScanWarning>,
}

/// Walk `directories` and parse every font container found.
///
/// Unparseable files are reported in [`ScanOutput::warnings`]; only a
/// failure to set up the worker pool is returned as an error.
pub fn scan(directories: &[PathBuf], opts: &ScanOptions) -> Result<ScanOutput> {
    let started = Instant::now();
    let discovery = PathDiscovery::new(directories.iter().cloned())
        .follow_symlinks(opts.follow_symlinks)
        .max_depth(opts.max_depth);
    let candidates = discovery.discover().map_err(|source| FontPickError::Scan {
        path: directories.first().cloned().unwrap_or_default(),
        source,
    })?;

    let run_scan = || -> Vec<(PathBuf, anyhow::Result<LoadedFile>)> {
        candidates
            .par_iter()
            .map(|loc| (loc.path.clone(), load_skeletons(&loc.path)))
            .collect()
    };

    let parsed = if let Some(jobs) = opts.jobs {
        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|err| FontPickError::Scan {
                path: PathBuf::new(),
                source: anyhow!(err),
            })?;
        pool.install(run_scan)
    } else {
        run_scan()
    };

    let mut faces = Vec::new();
    let mut warnings = Vec::new();
    for (path, outcome) in parsed {
        match outcome {
            Ok(loaded) => {
                faces.extend(loaded.skeletons);
                for skipped in loaded.warnings {
                    warn!(path = %skipped.path.display(), error = %skipped.message, "skipping unreadable face");
                    warnings.push(skipped);
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "skipping unreadable font");
                warnings.push(ScanWarning {
                    path,
                    message: format!("{err:#}"),
                });
            }
        }
    }

    let skeletons = dedup_faces(faces);
    info!(
        files = candidates.len(),
        faces = skeletons.len(),
        skipped = warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "font scan finished"
    );

    Ok(ScanOutput {
        skeletons,
        warnings,
    })
}

/// Open face `index` of a (possibly collection) font buffer.
pub(crate) fn open_face(data: &[u8], index: Option<u32>) -> anyhow::Result<FontRef<'_>> {
    let font = match index {
        Some(idx) => FontRef::from_index(data, idx)?,
        None => FontRef::new(data)?,
    };
    Ok(font)
}

/// Faces recovered from one file, plus the members of a collection that
/// had to be skipped.
#[derive(Debug, Default)]
struct LoadedFile {
    skeletons: Vec<FontSkeleton>,
    warnings: Vec<ScanWarning>,
}

fn load_skeletons(path: &Path) -> anyhow::Result<LoadedFile> {
    let data = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    if data.is_empty() {
        return Err(anyhow!("empty font file"));
    }
    let file_size = data.len() as u64;
    let mut loaded = LoadedFile::default();
    let mut first_error = None;

    for (position, font) in FontRef::fonts(&data).enumerate() {
        let face = font
            .map_err(anyhow::Error::from)
            .and_then(|font| skeleton_for(&font, &data, path, file_size));
        match face {
            Ok(skeleton) => loaded.skeletons.push(skeleton),
            Err(err) => {
                let err = err.context(format!("parsing face {position} of {}", path.display()));
                loaded.warnings.push(ScanWarning {
                    path: path.to_path_buf(),
                    message: format!("{err:#}"),
                });
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if loaded.skeletons.is_empty() {
        return Err(first_error.unwrap_or_else(|| anyhow!("container holds no faces")));
    }
    Ok(loaded)
}

fn skeleton_for(
    font: &FontRef,
    data: &[u8],
    path: &Path,
    file_size: u64,
) -> anyhow::Result<FontSkeleton> {
    check_table_bounds(font, data.len())?;
    font.cmap().context("reading cmap table")?;
    let family = match family_name(font)? {
        Some(family) => family,
        None => file_stem(path).ok_or_else(|| anyhow!("font has no usable family name"))?,
    };
    let (style, weight) = style_and_weight(font);

    Ok(FontSkeleton {
        family,
        path: path.to_path_buf(),
        face_index: font.ttc_index(),
        style,
        weight,
        file_size,
    })
}

/// Every table the directory promises must lie inside the file.
fn check_table_bounds(font: &FontRef, len: usize) -> anyhow::Result<()> {
    for record in font.table_directory.table_records() {
        let end = u64::from(record.offset()) + u64::from(record.length());
        if end > len as u64 {
            return Err(anyhow!(
                "table {} ends at byte {end}, past the end of the {len}-byte file",
                record.tag()
            ));
        }
    }
    Ok(())
}

/// Legacy family name (ID 1) first since its RIBBI model matches [`FontStyle`];
/// the typographic family (ID 16) only fills in when ID 1 is absent.
///
/// A `name` table that does not parse is an error; one without a family
/// entry yields `None`.
fn family_name(font: &FontRef) -> anyhow::Result<Option<String>> {
    let name_table = font.name().context("reading name table")?;
    Ok(best_name_in(
        &name_table,
        &[NameId::FAMILY_NAME, NameId::TYPOGRAPHIC_FAMILY_NAME],
    ))
}

fn subfamily_name(font: &FontRef) -> Option<String> {
    best_name(
        font,
        &[NameId::SUBFAMILY_NAME, NameId::TYPOGRAPHIC_SUBFAMILY_NAME],
    )
}

fn best_name(font: &FontRef, wanted: &[NameId]) -> Option<String> {
    let name_table = font.name().ok()?;
    best_name_in(&name_table, wanted)
}

fn best_name_in(name_table: &Name<'_>, wanted: &[NameId]) -> Option<String> {
    let data = name_table.string_data();
    let mut best: Option<(usize, bool, String)> = None;

    for record in name_table.name_record() {
        if !record.is_unicode() {
            continue;
        }
        let Some(rank) = wanted.iter().position(|id| *id == record.name_id()) else {
            continue;
        };
        let Ok(entry) = record.string(data) else {
            continue;
        };
        let rendered = entry.to_string().trim().to_string();
        if rendered.is_empty() {
            continue;
        }
        let english = record.platform_id() == 0 || record.language_id() == ENGLISH_US;
        let better = match &best {
            None => true,
            Some((best_rank, best_english, _)) => {
                rank < *best_rank || (rank == *best_rank && english && !*best_english)
            }
        };
        if better {
            best = Some((rank, english, rendered));
        }
    }

    best.map(|(_, _, name)| name)
}

fn style_and_weight(font: &FontRef) -> (FontStyle, u16) {
    if let Ok(os2) = font.os2() {
        let bits = os2.fs_selection().bits();
        let weight = os2.us_weight_class();
        let bold = bits & FS_SELECTION_BOLD != 0 || weight >= BOLD_WEIGHT_THRESHOLD;
        let italic = bits & (FS_SELECTION_ITALIC | FS_SELECTION_OBLIQUE) != 0;
        return (FontStyle::from_flags(bold, italic), weight);
    }

    let style = subfamily_name(font)
        .map(|sub| style_from_subfamily(&sub))
        .unwrap_or(FontStyle::Regular);
    let weight = if style.is_bold() { 700 } else { 400 };
    (style, weight)
}

pub(crate) fn style_from_subfamily(subfamily: &str) -> FontStyle {
    let lower = subfamily.to_ascii_lowercase();
    let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
    let italic = lower.contains("italic") || lower.contains("oblique");
    FontStyle::from_flags(bold, italic)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Keep the first face per `(family, style)` in `(path, face_index)` order.
pub(crate) fn dedup_faces(mut faces: Vec<FontSkeleton>) -> Vec<FontSkeleton> {
    faces.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then_with(|| a.face_index.cmp(&b.face_index))
    });

    let mut seen: HashSet<(String, FontStyle)> = HashSet::new();
    faces.retain(|face| seen.insert((face.family.clone(), face.style)));
    faces
}
