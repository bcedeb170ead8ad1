//! Quality scoring (made by FontLab https://www.fontlab.com/)
//!
//! A score is a weighted sum of three heuristics, each already in `[0, 1]`,
//! multiplied by a capability factor for the request at hand:
//!
//! | heuristic | weight |
//! |---|---|
//! | family reputation ([`W_REPUTATION`]) | 0.35 |
//! | style completeness ([`W_STYLE`]) | 0.25 |
//! | platform-native default ([`W_NATIVE`]) | 0.40 |
//!
//! The weights sum to exactly 1.0, so a known-best, natively shipped family
//! with all four RIBBI styles that satisfies the request scores 1.0. The
//! native weight is larger than the style weight: a native default always
//! outranks a non-native family that merely ships more styles.

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::record::{FontRecord, FontStyle};
use crate::select::Requirement;

pub const W_REPUTATION: f64 = 0.35;
pub const W_STYLE: f64 = 0.25;
pub const W_NATIVE: f64 = 0.40;

/// Capability factor for an emoji font whose color variant is not the preferred one.
///
/// Kept below `W_STYLE / 4`, the lowest score a matching single-style record
/// can reach, so every preferred-variant font outranks every other one.
pub const COLOR_MISMATCH_FACTOR: f64 = 0.05;

/// Priority of the platform's native default family.
pub const NATIVE_PRIORITY: u32 = 0;

/// Priority of families absent from the platform preference list.
pub const UNRANKED_PRIORITY: u32 = 999;

/// Everything a score depends on besides the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreContext {
    pub platform: Platform,
    pub requirement: Requirement,
    pub prefer_color: bool,
}

impl ScoreContext {
    pub fn new(platform: Platform, requirement: Requirement) -> Self {
        Self {
            platform,
            requirement,
            prefer_color: true,
        }
    }

    pub fn prefer_color(mut self, yes: bool) -> Self {
        self.prefer_color = yes;
        self
    }

    /// Context whose score is stored on the record: emoji-only fonts are
    /// judged as emoji fonts, everything else as Chinese text fonts.
    pub fn primary_for(record: &FontRecord, platform: Platform) -> Self {
        let caps = record.capabilities();
        let requirement = if caps.is_emoji && !caps.supports_chinese {
            Requirement::Emoji
        } else {
            Requirement::Chinese
        };
        Self::new(platform, requirement)
    }

    fn known_families(&self) -> &'static [&'static str] {
        match self.requirement {
            Requirement::Chinese => self.platform.chinese_families(),
            Requirement::Emoji => self.platform.emoji_families(),
        }
    }

    fn native_family(&self) -> &'static str {
        match self.requirement {
            Requirement::Chinese => self.platform.native_chinese_family(),
            Requirement::Emoji => self.platform.native_emoji_family(),
        }
    }
}

/// Score of `record` under `ctx`, in `[0, 1]`.
pub fn score(record: &FontRecord, ctx: &ScoreContext) -> f64 {
    let factor = capability_factor(record, ctx);
    if factor == 0.0 {
        return 0.0;
    }

    let weighted = W_REPUTATION * reputation(record.family_name(), ctx)
        + W_STYLE * style_completeness(record.styles())
        + W_NATIVE * native_bonus(record.family_name(), ctx);

    (factor * weighted).clamp(0.0, 1.0)
}

/// Tie-break rank, lower is better.
pub fn priority(family: &str, ctx: &ScoreContext) -> u32 {
    if names_match(family, ctx.native_family()) {
        return NATIVE_PRIORITY;
    }
    match family_position(family, ctx) {
        Some(idx) => idx as u32 + 1,
        None => UNRANKED_PRIORITY,
    }
}

/// Record with score and priority for its primary context filled in.
pub fn rescore(record: &FontRecord, platform: Platform) -> FontRecord {
    let ctx = ScoreContext::primary_for(record, platform);
    record.rescored(score(record, &ctx), priority(record.family_name(), &ctx))
}

/// `1 - i/n` for position `i` in the known-good list of length `n`; 0 when unknown.
pub fn reputation(family: &str, ctx: &ScoreContext) -> f64 {
    let known = ctx.known_families();
    match family_position(family, ctx) {
        Some(idx) => 1.0 - idx as f64 / known.len() as f64,
        None => 0.0,
    }
}

/// Fraction of the four RIBBI variants present.
pub fn style_completeness(styles: &[FontStyle]) -> f64 {
    let present = FontStyle::ALL
        .iter()
        .filter(|style| styles.contains(style))
        .count();
    present as f64 / FontStyle::ALL.len() as f64
}

pub fn native_bonus(family: &str, ctx: &ScoreContext) -> f64 {
    if names_match(family, ctx.native_family()) {
        1.0
    } else {
        0.0
    }
}

/// 0 when the record cannot serve the request at all.
pub fn capability_factor(record: &FontRecord, ctx: &ScoreContext) -> f64 {
    let caps = record.capabilities();
    match ctx.requirement {
        Requirement::Chinese if caps.supports_chinese => 1.0,
        Requirement::Emoji if caps.is_emoji => {
            if caps.is_color_emoji == ctx.prefer_color {
                1.0
            } else {
                COLOR_MISMATCH_FACTOR
            }
        }
        _ => 0.0,
    }
}

fn family_position(family: &str, ctx: &ScoreContext) -> Option<usize> {
    ctx.known_families()
        .iter()
        .position(|known| names_match(family, known))
}

/// Family comparison ignoring ASCII case and runs of whitespace.
pub fn names_match(a: &str, b: &str) -> bool {
    let mut left = a.split_whitespace();
    let mut right = b.split_whitespace();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l.eq_ignore_ascii_case(r) => continue,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chinese(family: &str, styles: &[FontStyle]) -> FontRecord {
        FontRecord::builder(family, format!("/fonts/{family}.ttf"))
            .styles(styles.iter().copied())
            .chinese(true)
            .build()
    }

    #[test]
    fn weights_sum_to_one() {
        assert!((W_REPUTATION + W_STYLE + W_NATIVE - 1.0).abs() < 1e-12);
    }

    #[test]
    fn native_full_family_reaches_exactly_one() {
        let ctx = ScoreContext::new(Platform::Linux, Requirement::Chinese);
        let record = chinese("Noto Sans CJK SC", &FontStyle::ALL);
        assert_eq!(score(&record, &ctx), 1.0);
    }

    #[test]
    fn capability_mismatch_clamps_to_zero() {
        let ctx = ScoreContext::new(Platform::Linux, Requirement::Chinese);
        let record = FontRecord::builder("Noto Sans CJK SC", "/f.ttf")
            .styles(FontStyle::ALL)
            .build();
        assert_eq!(score(&record, &ctx), 0.0);
    }

    #[test]
    fn unknown_family_scores_from_style_alone() {
        let ctx = ScoreContext::new(Platform::MacOs, Requirement::Chinese);
        let record = chinese("Mystery Hei", &[FontStyle::Regular, FontStyle::Bold]);
        assert!((score(&record, &ctx) - W_STYLE * 0.5).abs() < 1e-12);
    }

    #[test]
    fn same_record_scores_differently_per_requirement() {
        let record = FontRecord::builder("Noto Color Emoji", "/e.ttf")
            .emoji(true, true)
            .build();
        let as_chinese = ScoreContext::new(Platform::Linux, Requirement::Chinese);
        let as_emoji = ScoreContext::new(Platform::Linux, Requirement::Emoji);

        assert_eq!(score(&record, &as_chinese), 0.0);
        assert!(score(&record, &as_emoji) > 0.5);
    }

    #[test]
    fn color_preference_scales_mismatched_variant() {
        let mono = FontRecord::builder("Noto Emoji", "/m.ttf")
            .emoji(true, false)
            .build();
        let prefer_color = ScoreContext::new(Platform::Linux, Requirement::Emoji);
        let prefer_mono = prefer_color.prefer_color(false);

        let penalised = score(&mono, &prefer_color);
        let favoured = score(&mono, &prefer_mono);
        assert!((penalised - favoured * COLOR_MISMATCH_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn mismatched_variant_never_outranks_matching_one() {
        assert!(COLOR_MISMATCH_FACTOR < W_STYLE / FontStyle::ALL.len() as f64);

        let native_color = FontRecord::builder("Noto Color Emoji", "/c.ttf")
            .styles(FontStyle::ALL)
            .emoji(true, true)
            .build();
        let unknown_mono = FontRecord::builder("Plain Glyphs", "/p.ttf")
            .emoji(true, false)
            .build();
        let prefer_mono = ScoreContext::new(Platform::Linux, Requirement::Emoji).prefer_color(false);
        assert!(score(&unknown_mono, &prefer_mono) > score(&native_color, &prefer_mono));
    }

    #[test]
    fn native_bonus_beats_style_completeness() {
        let ctx = ScoreContext::new(Platform::Windows, Requirement::Chinese);
        let native = chinese("Microsoft YaHei", &[FontStyle::Regular]);
        let fuller = chinese("SimHei", &FontStyle::ALL);
        assert!(score(&native, &ctx) > score(&fuller, &ctx));
    }

    #[test]
    fn priority_ranks_native_then_list_then_unknown() {
        let ctx = ScoreContext::new(Platform::MacOs, Requirement::Chinese);
        assert_eq!(priority("PingFang SC", &ctx), NATIVE_PRIORITY);
        assert_eq!(priority("Hiragino Sans GB", &ctx), 2);
        assert_eq!(priority("Comic Sans", &ctx), UNRANKED_PRIORITY);
    }

    #[test]
    fn names_match_ignores_case_and_spacing() {
        assert!(names_match("noto  sans cjk sc", "Noto Sans CJK SC"));
        assert!(!names_match("Noto Sans CJK", "Noto Sans CJK SC"));
    }

    #[test]
    fn primary_context_follows_capabilities() {
        let emoji = FontRecord::builder("E", "/e.ttf").emoji(true, true).build();
        let both = FontRecord::builder("B", "/b.ttf")
            .emoji(true, false)
            .chinese(true)
            .build();
        assert_eq!(
            ScoreContext::primary_for(&emoji, Platform::Linux).requirement,
            Requirement::Emoji
        );
        assert_eq!(
            ScoreContext::primary_for(&both, Platform::Linux).requirement,
            Requirement::Chinese
        );
    }

    fn arb_styles() -> impl Strategy<Value = Vec<FontStyle>> {
        proptest::sample::subsequence(FontStyle::ALL.to_vec(), 0..=4)
    }

    fn arb_family() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("PingFang SC".to_string()),
            Just("Microsoft YaHei".to_string()),
            Just("Noto Sans CJK SC".to_string()),
            Just("Noto Color Emoji".to_string()),
            Just("Segoe UI Emoji".to_string()),
            "[A-Za-z ]{1,24}",
        ]
    }

    fn arb_platform() -> impl Strategy<Value = Platform> {
        prop_oneof![
            Just(Platform::MacOs),
            Just(Platform::Windows),
            Just(Platform::Linux)
        ]
    }

    proptest! {
        #[test]
        fn scores_are_bounded_and_deterministic(
            family in arb_family(),
            styles in arb_styles(),
            chinese in any::<bool>(),
            emoji in any::<bool>(),
            color in any::<bool>(),
            prefer_color in any::<bool>(),
            platform in arb_platform(),
            wants_emoji in any::<bool>(),
        ) {
            let record = FontRecord::builder(family, "/fonts/x.ttf")
                .styles(styles)
                .chinese(chinese)
                .emoji(emoji, color)
                .build();
            let requirement = if wants_emoji { Requirement::Emoji } else { Requirement::Chinese };
            let ctx = ScoreContext::new(platform, requirement).prefer_color(prefer_color);

            let first = score(&record, &ctx);
            let second = score(&record, &ctx);
            prop_assert!((0.0..=1.0).contains(&first));
            prop_assert_eq!(first.to_bits(), second.to_bits());

            let stored = rescore(&record, platform);
            prop_assert!((0.0..=1.0).contains(&stored.quality_score()));
        }
    }
}
