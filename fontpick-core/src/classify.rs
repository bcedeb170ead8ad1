//! Capability classifier (made by FontLab https://www.fontlab.com/)
//!
//! Classification looks at a handful of fixed probe code points instead of
//! the whole character map, so it costs the same for a 40-glyph symbol font
//! and a 60 000-glyph CJK superfamily. Results depend only on file content.

use std::fs;

use anyhow::Context;
use read_fonts::types::Tag;
use read_fonts::{FontRef, TableProvider};
use skrifa::{FontRef as SkrifaFontRef, MetadataProvider};

use crate::platform::emoji_allow_list;
use crate::record::Capabilities;
use crate::scan::{open_face, FontSkeleton};

/// Common simplified-Chinese ideographs: 一 中 文 字 人 的 我 们 这 国.
pub const CJK_PROBES: [char; 10] = [
    '\u{4E00}', '\u{4E2D}', '\u{6587}', '\u{5B57}', '\u{4EBA}', '\u{7684}', '\u{6211}',
    '\u{4EEC}', '\u{8FD9}', '\u{56FD}',
];

/// Minimum mapped [`CJK_PROBES`] for `supports_chinese`.
pub const CJK_MIN_HITS: usize = 8;

/// 😀 😂 👍 🚀 🎉 ❤.
pub const EMOJI_PROBES: [char; 6] = [
    '\u{1F600}', '\u{1F602}', '\u{1F44D}', '\u{1F680}', '\u{1F389}', '\u{2764}',
];

/// Minimum mapped [`EMOJI_PROBES`] for `is_emoji` without an allow-list match.
pub const EMOJI_MIN_HITS: usize = 4;

/// Tables that carry color glyphs: layered vectors, embedded bitmaps, Apple
/// bitmaps and SVG documents.
pub const COLOR_TABLES: [&[u8; 4]; 4] = [b"COLR", b"CBDT", b"sbix", b"SVG "];

/// Read the skeleton's face from disk and classify it.
pub fn classify(skeleton: &FontSkeleton) -> anyhow::Result<Capabilities> {
    let data = fs::read(&skeleton.path)
        .with_context(|| format!("reading font {}", skeleton.path.display()))?;
    let font = open_face(&data, skeleton.face_index)
        .with_context(|| format!("parsing font {}", skeleton.path.display()))?;
    let charmap_font = match skeleton.face_index {
        Some(idx) => SkrifaFontRef::from_index(&data, idx)?,
        None => SkrifaFontRef::new(&data)?,
    };

    Ok(classify_face(&font, &charmap_font, &skeleton.family))
}

/// Pure classification of an already opened face.
pub fn classify_face(font: &FontRef, charmap_font: &SkrifaFontRef, family: &str) -> Capabilities {
    let charmap = charmap_font.charmap();
    let hits = |probes: &[char]| {
        probes
            .iter()
            .filter(|ch| charmap.map(**ch).is_some_and(|gid| gid.to_u32() != 0))
            .count()
    };

    let supports_chinese = hits(&CJK_PROBES) >= CJK_MIN_HITS;
    let emoji_hits = hits(&EMOJI_PROBES);
    let is_emoji = emoji_hits >= EMOJI_MIN_HITS || (is_allow_listed_emoji(family) && emoji_hits > 0);
    let is_color_emoji = is_emoji && has_color_tables(font);

    Capabilities {
        supports_chinese,
        is_emoji,
        is_color_emoji,
    }
}

pub fn is_allow_listed_emoji(family: &str) -> bool {
    let family = family.trim();
    emoji_allow_list().any(|known| known.eq_ignore_ascii_case(family))
}

fn has_color_tables(font: &FontRef) -> bool {
    COLOR_TABLES
        .iter()
        .any(|tag| font.data_for_tag(Tag::new(tag)).is_some())
}
