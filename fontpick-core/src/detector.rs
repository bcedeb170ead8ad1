//! Detector: the public entry points (made by FontLab https://www.fontlab.com/)
//!
//! A [`FontDetector`] owns the resolved font directories and the scan cache.
//! Every call fingerprints the directories first; an unchanged fingerprint
//! reuses the cached [`ScanResult`], a changed one triggers a full
//! scan → classify → score pass.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{PersistentStore, ScanCache};
use crate::classify::classify;
use crate::config::DetectConfig;
use crate::error::Result;
use crate::filter::FontFilter;
use crate::fingerprint::{self, Fingerprint};
use crate::platform::Platform;
use crate::record::{Capabilities, FontRecord, FontStyle, ScanResult, ScanWarning};
use crate::scan::{self, FontSkeleton, ScanOptions};
use crate::score::{self, names_match, ScoreContext};
use crate::select::{select, Requirement, SelectionDecision};

#[derive(Debug)]
pub struct FontDetector {
    platform: Platform,
    config: DetectConfig,
    directories: Vec<PathBuf>,
    cache: ScanCache,
}

impl FontDetector {
    /// Detector for the running OS.
    pub fn new(config: DetectConfig) -> Result<Self> {
        let platform = Platform::current()?;
        Ok(Self::with_platform(platform, config))
    }

    /// Detector that behaves as if running on `platform`.
    pub fn with_platform(platform: Platform, config: DetectConfig) -> Self {
        let directories = config
            .font_dirs
            .clone()
            .unwrap_or_else(|| platform.locate());
        let cache = match &config.cache_dir {
            Some(dir) => ScanCache::with_store(PersistentStore::new(dir)),
            None => ScanCache::new(),
        };
        debug!(%platform, dirs = directories.len(), "font detector ready");

        Self {
            platform,
            config,
            directories,
            cache,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Current fingerprint of the font directories.
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint::fingerprint(self.platform, &self.directories, &self.config.scan)
    }

    /// Scan result for the current fingerprint, computing it on a miss.
    pub fn scan_result(&self) -> Result<Arc<ScanResult>> {
        let fingerprint = self.fingerprint();
        self.cache.get_or_compute(&fingerprint, || {
            build_scan(
                self.platform,
                &self.directories,
                &self.config.scan,
                fingerprint.clone(),
            )
        })
    }

    /// Pick the best installed font for `requirement`.
    ///
    /// `preferred_name` falls back to the configured preferred font. Absence
    /// of a capable font is reported as [`SelectionDecision::NotSelected`].
    pub fn detect(
        &self,
        requirement: Requirement,
        preferred_name: Option<&str>,
    ) -> Result<SelectionDecision> {
        let started = Instant::now();
        let scan = self.scan_result()?;
        let ctx = ScoreContext::new(self.platform, requirement).prefer_color(self.config.prefer_color);
        let preferred = preferred_name.or(self.config.preferred_font.as_deref());

        let decision = select(&scan, &ctx, preferred).with_setup_time(started.elapsed());
        match decision.font() {
            Some(font) => info!(
                %requirement,
                family = font.family_name(),
                score = font.quality_score(),
                "font selected"
            ),
            None => warn!(%requirement, reason = ?decision.reason(), "no capable font installed"),
        }
        Ok(decision)
    }

    /// Drop the cached scan for `fingerprint`. Unknown fingerprints are a no-op.
    pub fn invalidate(&self, fingerprint: &Fingerprint) {
        debug!(%fingerprint, "invalidating scan cache entry");
        self.cache.invalidate(fingerprint);
    }

    /// Drop every in-process entry and every persisted scan.
    pub fn invalidate_all(&self) -> Result<usize> {
        self.cache.clear();
        match self.cache.store() {
            Some(store) => store.purge(),
            None => Ok(0),
        }
    }

    /// Every record of the current scan that passes `filter`.
    pub fn list_fonts(&self, filter: &FontFilter) -> Result<Vec<FontRecord>> {
        let scan = self.scan_result()?;
        Ok(filter.apply(scan.records()).into_iter().cloned().collect())
    }

    /// Chinese selection plus, when emoji fallback is enabled, an emoji one.
    pub fn plan(&self, preferred_name: Option<&str>) -> Result<FontPlan> {
        let primary = self.detect(Requirement::Chinese, preferred_name)?;
        let emoji = if self.config.emoji_fallback {
            Some(self.detect(Requirement::Emoji, None)?)
        } else {
            None
        };

        Ok(FontPlan {
            platform: self.platform,
            primary,
            emoji,
        })
    }
}

/// What a plotting adapter needs to install: the decisions and the family chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontPlan {
    pub platform: Platform,
    pub primary: SelectionDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<SelectionDecision>,
}

impl FontPlan {
    pub fn is_success(&self) -> bool {
        self.primary.is_success()
    }

    /// Selected family, selected emoji family, then platform fallbacks; no duplicates.
    pub fn family_chain(&self) -> Vec<String> {
        let selected = [Some(&self.primary), self.emoji.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|d| d.font())
            .map(|f| f.family_name());

        let mut chain: Vec<String> = Vec::new();
        for family in selected.chain(self.platform.fallback_families().iter().copied()) {
            if !chain.iter().any(|known| names_match(known, family)) {
                chain.push(family.to_string());
            }
        }
        chain
    }
}

/// One full scan → classify → score pass over `directories`.
pub(crate) fn build_scan(
    platform: Platform,
    directories: &[PathBuf],
    opts: &ScanOptions,
    fingerprint: Fingerprint,
) -> Result<ScanResult> {
    let started = Instant::now();
    let output = scan::scan(directories, opts)?;
    let mut warnings = output.warnings;

    let mut families: BTreeMap<String, Vec<FontSkeleton>> = BTreeMap::new();
    for skeleton in output.skeletons {
        families.entry(skeleton.family.clone()).or_default().push(skeleton);
    }

    let built: Vec<(FontRecord, Option<ScanWarning>)> = families
        .into_par_iter()
        .filter_map(|(_, faces)| family_record(platform, &faces))
        .collect();

    let mut records = Vec::with_capacity(built.len());
    for (record, warning) in built {
        records.push(record);
        warnings.extend(warning);
    }

    let result = ScanResult::new(records, fingerprint, warnings);
    info!(
        fingerprint = %result.fingerprint(),
        families = result.len(),
        warnings = result.warnings().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan result built"
    );
    Ok(result)
}

/// Collapse one family's faces into a record. The Regular face represents the
/// family; without one, the first face in path order does.
fn family_record(platform: Platform, faces: &[FontSkeleton]) -> Option<(FontRecord, Option<ScanWarning>)> {
    let representative = faces
        .iter()
        .find(|f| f.style == FontStyle::Regular)
        .or_else(|| faces.first())?;

    let (capabilities, warning) = match classify(representative) {
        Ok(caps) => (caps, None),
        Err(err) => {
            warn!(
                path = %representative.path.display(),
                error = %format!("{err:#}"),
                "classification failed, assuming no capabilities"
            );
            let warning = ScanWarning {
                path: representative.path.clone(),
                message: format!("{err:#}"),
            };
            (Capabilities::default(), Some(warning))
        }
    };

    let record = FontRecord::builder(&representative.family, &representative.path)
        .face_index(representative.face_index)
        .style(representative.style)
        .styles(faces.iter().map(|f| f.style))
        .weight(representative.weight)
        .capabilities(capabilities)
        .file_size(representative.file_size)
        .build();

    Some((score::rescore(&record, platform), warning))
}
