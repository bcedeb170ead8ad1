//! Font records and scan results (made by FontLab https://www.fontlab.com/)

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Style of a single face, or one member of a family's style set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Every variant, in canonical order.
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => FontStyle::Regular,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (true, true) => FontStyle::BoldItalic,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Regular => "regular",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::BoldItalic => "bold_italic",
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived rendering capabilities of a font. Never user input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_chinese: bool,
    pub is_emoji: bool,
    pub is_color_emoji: bool,
}

/// Immutable description of one discovered, classified and scored font family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontRecord {
    family_name: String,
    file_path: PathBuf,
    face_index: Option<u32>,
    style: FontStyle,
    styles: Vec<FontStyle>,
    weight: u16,
    capabilities: Capabilities,
    quality_score: f64,
    priority: u32,
    file_size: u64,
}

impl FontRecord {
    /// Start a record by hand. The pipeline builds records from parsed files;
    /// this is for callers that already know the facts (tests, benches, stores).
    pub fn builder(family_name: impl Into<String>, file_path: impl Into<PathBuf>) -> FontRecordBuilder {
        FontRecordBuilder::new(family_name.into(), file_path.into())
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn face_index(&self) -> Option<u32> {
        self.face_index
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// All style variants installed for this family, sorted and unique.
    pub fn styles(&self) -> &[FontStyle] {
        &self.styles
    }

    pub fn weight(&self) -> u16 {
        self.weight
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Stable identifier: the path, with `#<index>` appended for collection faces.
    pub fn id(&self) -> String {
        if let Some(idx) = self.face_index {
            format!("{}#{idx}", self.file_path.display())
        } else {
            self.file_path.display().to_string()
        }
    }

    /// Copy of this record carrying a new score and priority.
    pub fn rescored(&self, quality_score: f64, priority: u32) -> Self {
        Self {
            quality_score: quality_score.clamp(0.0, 1.0),
            priority,
            ..self.clone()
        }
    }
}

/// Builder for [`FontRecord`].
#[derive(Debug, Clone)]
pub struct FontRecordBuilder {
    record: FontRecord,
}

impl FontRecordBuilder {
    fn new(family_name: String, file_path: PathBuf) -> Self {
        Self {
            record: FontRecord {
                family_name,
                file_path,
                face_index: None,
                style: FontStyle::Regular,
                styles: vec![FontStyle::Regular],
                weight: 400,
                capabilities: Capabilities::default(),
                quality_score: 0.0,
                priority: crate::score::UNRANKED_PRIORITY,
                file_size: 0,
            },
        }
    }

    pub fn face_index(mut self, idx: Option<u32>) -> Self {
        self.record.face_index = idx;
        self
    }

    pub fn style(mut self, style: FontStyle) -> Self {
        self.record.style = style;
        self
    }

    pub fn styles(mut self, styles: impl IntoIterator<Item = FontStyle>) -> Self {
        let mut styles: Vec<FontStyle> = styles.into_iter().collect();
        styles.sort_unstable();
        styles.dedup();
        self.record.styles = styles;
        self
    }

    pub fn weight(mut self, weight: u16) -> Self {
        self.record.weight = weight;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.record.capabilities = capabilities;
        self
    }

    pub fn chinese(mut self, yes: bool) -> Self {
        self.record.capabilities.supports_chinese = yes;
        self
    }

    pub fn emoji(mut self, is_emoji: bool, is_color: bool) -> Self {
        self.record.capabilities.is_emoji = is_emoji;
        self.record.capabilities.is_color_emoji = is_emoji && is_color;
        self
    }

    pub fn quality_score(mut self, score: f64) -> Self {
        self.record.quality_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.record.priority = priority;
        self
    }

    pub fn file_size(mut self, size: u64) -> Self {
        self.record.file_size = size;
        self
    }

    pub fn build(self) -> FontRecord {
        self.record
    }
}

/// A file the scanner had to skip, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Immutable outcome of one Locator → Scanner → Classifier → Scorer pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    records: Vec<FontRecord>,
    created_at: SystemTime,
    fingerprint: Fingerprint,
    #[serde(default)]
    warnings: Vec<ScanWarning>,
}

impl ScanResult {
    /// Assemble a result; records are put into canonical `(family, id)` order.
    pub fn new(
        mut records: Vec<FontRecord>,
        fingerprint: Fingerprint,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        sort_records(&mut records);
        Self {
            records,
            created_at: SystemTime::now(),
            fingerprint,
            warnings,
        }
    }

    pub fn records(&self) -> &[FontRecord] {
        &self.records
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact family lookup.
    pub fn find_family(&self, family: &str) -> Option<&FontRecord> {
        self.records.iter().find(|r| r.family_name == family)
    }
}

fn sort_records(records: &mut [FontRecord]) {
    records.sort_by(|a, b| {
        a.family_name
            .cmp(&b.family_name)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.face_index.cmp(&b.face_index))
    });
}
