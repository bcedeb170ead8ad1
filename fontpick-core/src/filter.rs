//! Record filtering for font listings (made by FontLab https://www.fontlab.com/)

use regex::Regex;

use crate::record::{FontRecord, FontStyle};

/// Conjunction of optional constraints; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct FontFilter {
    name_patterns: Vec<Regex>,
    styles: Vec<FontStyle>,
    chinese_only: bool,
    emoji_only: bool,
    color_emoji_only: bool,
    min_score: Option<f64>,
}

impl FontFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Family name must match at least one pattern.
    pub fn with_name_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.name_patterns = patterns;
        self
    }

    /// Family must ship every listed style.
    pub fn with_styles(mut self, styles: Vec<FontStyle>) -> Self {
        self.styles = styles;
        self
    }

    pub fn require_chinese(mut self, yes: bool) -> Self {
        self.chinese_only = yes;
        self
    }

    pub fn require_emoji(mut self, yes: bool) -> Self {
        self.emoji_only = yes;
        self
    }

    pub fn require_color_emoji(mut self, yes: bool) -> Self {
        self.color_emoji_only = yes;
        self
    }

    pub fn with_min_score(mut self, score: f64) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn matches(&self, record: &FontRecord) -> bool {
        let caps = record.capabilities();
        if self.chinese_only && !caps.supports_chinese {
            return false;
        }
        if self.emoji_only && !caps.is_emoji {
            return false;
        }
        if self.color_emoji_only && !caps.is_color_emoji {
            return false;
        }

        if let Some(min) = self.min_score {
            if record.quality_score() < min {
                return false;
            }
        }

        if !self.styles.iter().all(|s| record.styles().contains(s)) {
            return false;
        }

        if !self.name_patterns.is_empty()
            && !self
                .name_patterns
                .iter()
                .any(|re| re.is_match(record.family_name()))
        {
            return false;
        }

        true
    }

    pub fn apply<'a>(&self, records: &'a [FontRecord]) -> Vec<&'a FontRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
