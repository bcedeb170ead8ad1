//! Platform locator and per-OS font knowledge (made by FontLab https://www.fontlab.com/)
//!
//! Each supported OS is one variant of [`Platform`], picked once by
//! [`Platform::current`]. Everything that differs between systems (where
//! fonts live, which families are known to be good, which one the OS itself
//! ships as its default) hangs off that enum, so the scanner, classifier and
//! scorer never branch on `cfg!` themselves.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FontPickError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

/// Families a plotting adapter can append after the selected font.
const FALLBACK_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
    "Helvetica",
    "sans-serif",
];

const MACOS_CHINESE: &[&str] = &[
    "PingFang SC",
    "Hiragino Sans GB",
    "STHeiti",
    "Heiti SC",
    "Songti SC",
    "Arial Unicode MS",
    "STSong",
    "STKaiti",
];

const WINDOWS_CHINESE: &[&str] = &[
    "Microsoft YaHei",
    "Microsoft YaHei UI",
    "SimHei",
    "DengXian",
    "SimSun",
    "NSimSun",
    "KaiTi",
    "FangSong",
    "Microsoft JhengHei",
    "Arial Unicode MS",
];

const LINUX_CHINESE: &[&str] = &[
    "Noto Sans CJK SC",
    "Source Han Sans SC",
    "Noto Serif CJK SC",
    "WenQuanYi Zen Hei",
    "WenQuanYi Micro Hei",
    "Droid Sans Fallback",
    "AR PL UMing CN",
    "AR PL UKai CN",
    "Noto Sans CJK TC",
    "Source Han Sans TC",
];

const MACOS_EMOJI: &[&str] = &["Apple Color Emoji", "Noto Color Emoji", "Noto Emoji"];

const WINDOWS_EMOJI: &[&str] = &["Segoe UI Emoji", "Noto Color Emoji", "Segoe UI Symbol"];

const LINUX_EMOJI: &[&str] = &[
    "Noto Color Emoji",
    "Twemoji",
    "JoyPixels",
    "Noto Emoji",
    "Symbola",
];

impl Platform {
    /// Probe the running OS.
    pub fn current() -> Result<Self> {
        Self::from_os_name(env::consts::OS)
    }

    /// Map an `std::env::consts::OS` style name onto a locator variant.
    pub fn from_os_name(os: &str) -> Result<Self> {
        match os {
            "macos" => Ok(Platform::MacOs),
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            other => Err(FontPickError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    /// Ordered system and user font directories for this OS.
    ///
    /// Directories are returned whether or not they exist; the scanner skips
    /// missing ones and the fingerprint records their absence.
    pub fn locate(self) -> Vec<PathBuf> {
        self.locate_with(|key| env::var_os(key))
    }

    /// [`locate`](Self::locate) with an injectable environment lookup.
    pub fn locate_with<F>(self, lookup: F) -> Vec<PathBuf>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let home = lookup("HOME")
            .or_else(|| lookup("USERPROFILE"))
            .map(PathBuf::from);
        let mut dirs = Vec::new();

        match self {
            Platform::MacOs => {
                dirs.push(PathBuf::from("/System/Library/Fonts"));
                dirs.push(PathBuf::from("/Library/Fonts"));
                if let Some(home) = &home {
                    dirs.push(home.join("Library/Fonts"));
                }
            }
            Platform::Windows => {
                let windir = lookup("WINDIR")
                    .or_else(|| lookup("SYSTEMROOT"))
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("C:\\Windows"));
                dirs.push(windir.join("Fonts"));
                if let Some(local) = lookup("LOCALAPPDATA") {
                    dirs.push(PathBuf::from(local).join("Microsoft/Windows/Fonts"));
                } else if let Some(home) = &home {
                    dirs.push(home.join("AppData/Local/Microsoft/Windows/Fonts"));
                }
            }
            Platform::Linux => {
                dirs.push(PathBuf::from("/usr/share/fonts"));
                dirs.push(PathBuf::from("/usr/local/share/fonts"));
                dirs.push(PathBuf::from("/usr/X11R6/lib/X11/fonts"));
                if let Some(home) = &home {
                    dirs.push(home.join(".fonts"));
                    dirs.push(home.join(".local/share/fonts"));
                }
            }
        }

        dirs
    }

    /// Known-good CJK families, best first.
    pub fn chinese_families(self) -> &'static [&'static str] {
        match self {
            Platform::MacOs => MACOS_CHINESE,
            Platform::Windows => WINDOWS_CHINESE,
            Platform::Linux => LINUX_CHINESE,
        }
    }

    /// The CJK family the OS itself ships as its default.
    pub fn native_chinese_family(self) -> &'static str {
        self.chinese_families()[0]
    }

    /// Known emoji families, color variants first.
    pub fn emoji_families(self) -> &'static [&'static str] {
        match self {
            Platform::MacOs => MACOS_EMOJI,
            Platform::Windows => WINDOWS_EMOJI,
            Platform::Linux => LINUX_EMOJI,
        }
    }

    pub fn native_emoji_family(self) -> &'static str {
        self.emoji_families()[0]
    }

    pub fn fallback_families(self) -> &'static [&'static str] {
        FALLBACK_FAMILIES
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Emoji family names across every platform; used by the classifier's
/// allow-list so a Linux host with a copied Apple font is still recognised.
pub fn emoji_allow_list() -> impl Iterator<Item = &'static str> {
    MACOS_EMOJI
        .iter()
        .chain(WINDOWS_EMOJI)
        .chain(LINUX_EMOJI)
        .copied()
}
