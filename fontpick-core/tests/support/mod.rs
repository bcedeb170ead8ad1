//! Tiny sfnt factory for tests (made by FontLab https://www.fontlab.com/)
//!
//! Builds just enough of a TrueType file for the scanner and classifier:
//! `cmap` (format 12), `name`, `OS/2`, and optional color tables whose
//! content is never inspected, only their presence.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fontpick_core::classify::{CJK_PROBES, EMOJI_PROBES};

const FS_SELECTION_ITALIC: u16 = 1 << 0;
const FS_SELECTION_BOLD: u16 = 1 << 5;
const FS_SELECTION_REGULAR: u16 = 1 << 6;

#[derive(Debug, Clone)]
pub struct TestFont {
    family: String,
    subfamily: String,
    weight: u16,
    fs_selection: u16,
    chars: Vec<char>,
    extra_tables: Vec<[u8; 4]>,
}

impl TestFont {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            subfamily: "Regular".to_string(),
            weight: 400,
            fs_selection: FS_SELECTION_REGULAR,
            chars: ('A'..='Z').collect(),
            extra_tables: Vec::new(),
        }
    }

    /// Latin plus every CJK probe.
    pub fn chinese(family: &str) -> Self {
        Self::new(family).with_chars(CJK_PROBES)
    }

    /// Monochrome emoji font covering every emoji probe.
    pub fn emoji(family: &str) -> Self {
        Self::new(family).with_chars(EMOJI_PROBES)
    }

    /// Emoji font with a `COLR` table.
    pub fn color_emoji(family: &str) -> Self {
        Self::emoji(family).with_table(*b"COLR")
    }

    pub fn with_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.chars.extend(chars);
        self
    }

    pub fn with_table(mut self, tag: [u8; 4]) -> Self {
        self.extra_tables.push(tag);
        self
    }

    pub fn bold(mut self) -> Self {
        self.weight = 700;
        self.fs_selection = (self.fs_selection & !FS_SELECTION_REGULAR) | FS_SELECTION_BOLD;
        self.subfamily = if self.fs_selection & FS_SELECTION_ITALIC != 0 {
            "Bold Italic".to_string()
        } else {
            "Bold".to_string()
        };
        self
    }

    pub fn italic(mut self) -> Self {
        self.fs_selection = (self.fs_selection & !FS_SELECTION_REGULAR) | FS_SELECTION_ITALIC;
        self.subfamily = if self.fs_selection & FS_SELECTION_BOLD != 0 {
            "Bold Italic".to_string()
        } else {
            "Italic".to_string()
        };
        self
    }

    /// Complete single-font file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.append_sfnt(&mut out);
        out
    }

    fn tables(&self) -> Vec<([u8; 4], Vec<u8>)> {
        let mut tables = vec![
            (*b"OS/2", os2_table(self.weight, self.fs_selection)),
            (*b"cmap", cmap_table(&self.chars)),
            (*b"name", name_table(&[(1, &self.family), (2, &self.subfamily)])),
        ];
        for tag in &self.extra_tables {
            tables.push((*tag, vec![0; 16]));
        }
        tables.sort_by(|a, b| a.0.cmp(&b.0));
        tables
    }

    /// Append a table directory plus tables; offsets are absolute in `out`.
    fn append_sfnt(&self, out: &mut Vec<u8>) {
        let tables = self.tables();
        let num_tables = tables.len() as u16;
        let dir_start = out.len();
        let dir_len = 12 + 16 * tables.len();

        let entry_selector = 15 - num_tables.leading_zeros() as u16;
        let search_range = (1u16 << entry_selector) * 16;
        out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        out.extend_from_slice(&num_tables.to_be_bytes());
        out.extend_from_slice(&search_range.to_be_bytes());
        out.extend_from_slice(&entry_selector.to_be_bytes());
        out.extend_from_slice(&(num_tables * 16 - search_range).to_be_bytes());

        let mut offset = align4(dir_start + dir_len);
        let mut placed = Vec::new();
        for (tag, data) in &tables {
            out.extend_from_slice(tag);
            out.extend_from_slice(&0u32.to_be_bytes());
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            placed.push(offset);
            offset = align4(offset + data.len());
        }

        for ((_, data), at) in tables.iter().zip(placed) {
            out.resize(at, 0);
            out.extend_from_slice(data);
        }
        let end = align4(out.len());
        out.resize(end, 0);
    }
}

/// `ttcf` collection holding `fonts` in order.
pub fn collection_bytes(fonts: &[TestFont]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"ttcf");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(fonts.len() as u32).to_be_bytes());
    let offsets_at = out.len();
    out.resize(offsets_at + 4 * fonts.len(), 0);

    for (i, font) in fonts.iter().enumerate() {
        let start = align4(out.len());
        out.resize(start, 0);
        let slot = offsets_at + 4 * i;
        out[slot..slot + 4].copy_from_slice(&(start as u32).to_be_bytes());
        font.append_sfnt(&mut out);
    }
    out
}

pub fn write_font(dir: &Path, file_name: &str, font: &TestFont) -> PathBuf {
    fs::create_dir_all(dir).expect("create font dir");
    let path = dir.join(file_name);
    fs::write(&path, font.to_bytes()).expect("write font");
    path
}

pub fn write_collection(dir: &Path, file_name: &str, fonts: &[TestFont]) -> PathBuf {
    fs::create_dir_all(dir).expect("create font dir");
    let path = dir.join(file_name);
    fs::write(&path, collection_bytes(fonts)).expect("write collection");
    path
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn os2_table(weight: u16, fs_selection: u16) -> Vec<u8> {
    let mut t = vec![0u8; 96];
    t[0..2].copy_from_slice(&4u16.to_be_bytes());
    t[4..6].copy_from_slice(&weight.to_be_bytes());
    t[6..8].copy_from_slice(&5u16.to_be_bytes());
    t[62..64].copy_from_slice(&fs_selection.to_be_bytes());
    t
}

fn cmap_table(chars: &[char]) -> Vec<u8> {
    let mut cps: Vec<u32> = chars.iter().map(|c| *c as u32).collect();
    cps.sort_unstable();
    cps.dedup();

    let mut t = Vec::new();
    t.extend_from_slice(&0u16.to_be_bytes());
    t.extend_from_slice(&1u16.to_be_bytes());
    t.extend_from_slice(&3u16.to_be_bytes());
    t.extend_from_slice(&10u16.to_be_bytes());
    t.extend_from_slice(&12u32.to_be_bytes());

    let length = 16 + 12 * cps.len() as u32;
    t.extend_from_slice(&12u16.to_be_bytes());
    t.extend_from_slice(&0u16.to_be_bytes());
    t.extend_from_slice(&length.to_be_bytes());
    t.extend_from_slice(&0u32.to_be_bytes());
    t.extend_from_slice(&(cps.len() as u32).to_be_bytes());
    for (i, cp) in cps.iter().enumerate() {
        t.extend_from_slice(&cp.to_be_bytes());
        t.extend_from_slice(&cp.to_be_bytes());
        t.extend_from_slice(&(i as u32 + 1).to_be_bytes());
    }
    t
}

fn name_table(entries: &[(u16, &str)]) -> Vec<u8> {
    let encoded: Vec<(u16, Vec<u8>)> = entries
        .iter()
        .map(|(id, text)| {
            let bytes = text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
            (*id, bytes)
        })
        .collect();

    let count = encoded.len() as u16;
    let string_offset = 6 + 12 * count;
    let mut t = Vec::new();
    t.extend_from_slice(&0u16.to_be_bytes());
    t.extend_from_slice(&count.to_be_bytes());
    t.extend_from_slice(&string_offset.to_be_bytes());

    let mut storage = Vec::new();
    for (id, bytes) in &encoded {
        t.extend_from_slice(&3u16.to_be_bytes());
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&0x0409u16.to_be_bytes());
        t.extend_from_slice(&id.to_be_bytes());
        t.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        t.extend_from_slice(&(storage.len() as u16).to_be_bytes());
        storage.extend_from_slice(bytes);
    }
    t.extend_from_slice(&storage);
    t
}
