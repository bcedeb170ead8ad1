//! Environment-driven configuration (made by FontLab https://www.fontlab.com/)
//!
//! | variable | effect | default |
//! |---|---|---|
//! | `FONTPICK_EMOJI_FALLBACK` | also pick an emoji font | off |
//! | `FONTPICK_EMOJI_COLOR` | prefer color emoji | on |
//! | `FONTPICK_FONT_DIRS` | replace the platform font directories | unset |
//! | `FONTPICK_CACHE_DIR` | persist scans as JSON in this directory | unset |
//! | `FONTPICK_PREFERRED_FONT` | family tried before ranking | unset |
//!
//! Values are validated up front; a malformed boolean fails before any
//! directory is touched.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{FontPickError, Result};
use crate::scan::ScanOptions;

pub const ENV_EMOJI_FALLBACK: &str = "FONTPICK_EMOJI_FALLBACK";
pub const ENV_EMOJI_COLOR: &str = "FONTPICK_EMOJI_COLOR";
pub const ENV_FONT_DIRS: &str = "FONTPICK_FONT_DIRS";
pub const ENV_CACHE_DIR: &str = "FONTPICK_CACHE_DIR";
pub const ENV_PREFERRED_FONT: &str = "FONTPICK_PREFERRED_FONT";

#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Select an emoji font alongside the Chinese one.
    pub emoji_fallback: bool,
    /// Rank color emoji fonts above monochrome ones.
    pub prefer_color: bool,
    /// Replaces [`Platform::locate`](crate::platform::Platform::locate) when set.
    pub font_dirs: Option<Vec<PathBuf>>,
    /// Enables the persisted scan store.
    pub cache_dir: Option<PathBuf>,
    pub preferred_font: Option<String>,
    pub scan: ScanOptions,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            emoji_fallback: false,
            prefer_color: true,
            font_dirs: None,
            cache_dir: None,
            preferred_font: None,
            scan: ScanOptions::default(),
        }
    }
}

impl DetectConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var_os(key))
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let text = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                None => Ok(None),
                Some(raw) => raw
                    .into_string()
                    .map(Some)
                    .map_err(|raw| {
                        FontPickError::config(key, &raw.to_string_lossy(), "value is not valid UTF-8")
                    }),
            }
        };

        let mut config = Self::default();

        if let Some(raw) = text(ENV_EMOJI_FALLBACK)? {
            config.emoji_fallback = parse_bool_token(ENV_EMOJI_FALLBACK, &raw)?;
        }
        if let Some(raw) = text(ENV_EMOJI_COLOR)? {
            config.prefer_color = parse_bool_token(ENV_EMOJI_COLOR, &raw)?;
        }
        if let Some(raw) = text(ENV_FONT_DIRS)? {
            config.font_dirs = Some(parse_dir_list(ENV_FONT_DIRS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CACHE_DIR) {
            if !raw.is_empty() {
                config.cache_dir = Some(PathBuf::from(raw));
            }
        }
        if let Some(raw) = text(ENV_PREFERRED_FONT)? {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.preferred_font = Some(trimmed.to_string());
            }
        }

        Ok(config)
    }

    pub fn with_font_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.font_dirs = Some(dirs);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_preferred_font(mut self, family: impl Into<String>) -> Self {
        self.preferred_font = Some(family.into());
        self
    }

    pub fn with_emoji_fallback(mut self, yes: bool) -> Self {
        self.emoji_fallback = yes;
        self
    }

    pub fn with_prefer_color(mut self, yes: bool) -> Self {
        self.prefer_color = yes;
        self
    }

    pub fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }
}

/// Accepts `true|false|1|0|on|off|yes|no`, trimmed and case-insensitive.
pub fn parse_bool_token(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(FontPickError::config(
            key,
            raw,
            "expected one of true, false, 1, 0, on, off, yes, no",
        )),
    }
}

/// Split on the platform's `PATH` separator (`:` on Unix, `;` on Windows) so
/// drive letters survive.
fn parse_dir_list(key: &str, raw: &str) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for segment in env::split_paths(raw) {
        let trimmed = segment.to_string_lossy().trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        let dir = PathBuf::from(trimmed);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    if dirs.is_empty() {
        return Err(FontPickError::config(key, raw, "no directories listed"));
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SEP: &str = if cfg!(windows) { ";" } else { ":" };

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = DetectConfig::from_lookup(lookup(&[])).expect("config");
        assert!(!config.emoji_fallback);
        assert!(config.prefer_color);
        assert!(config.font_dirs.is_none());
        assert!(config.cache_dir.is_none());
        assert!(config.preferred_font.is_none());
    }

    #[test]
    fn accepts_every_documented_token() {
        for token in ["true", "1", "on", "yes", " TRUE ", "Yes"] {
            assert!(parse_bool_token("K", token).expect(token), "{token}");
        }
        for token in ["false", "0", "off", "no", "OFF", "\tno\n"] {
            assert!(!parse_bool_token("K", token).expect(token), "{token}");
        }
    }

    #[test]
    fn rejects_unknown_tokens() {
        for token in ["", "2", "enable", "y", "truthy"] {
            let err = parse_bool_token(ENV_EMOJI_FALLBACK, token).unwrap_err();
            assert!(matches!(err, FontPickError::Configuration { .. }), "{token}");
            assert!(err.is_structural());
        }
    }

    #[test]
    fn malformed_boolean_fails_the_whole_config() {
        let err = DetectConfig::from_lookup(lookup(&[
            (ENV_EMOJI_FALLBACK, "yes"),
            (ENV_EMOJI_COLOR, "sometimes"),
        ]))
        .unwrap_err();
        match err {
            FontPickError::Configuration { key, value, .. } => {
                assert_eq!(key, ENV_EMOJI_COLOR);
                assert_eq!(value, "sometimes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_every_variable() {
        let config = DetectConfig::from_lookup(lookup(&[
            (ENV_EMOJI_FALLBACK, "on"),
            (ENV_EMOJI_COLOR, "0"),
            (ENV_FONT_DIRS, &format!("/a/fonts{SEP}/b/fonts{SEP}/a/fonts")),
            (ENV_CACHE_DIR, "/tmp/fontpick"),
            (ENV_PREFERRED_FONT, "  Source Han Sans SC "),
        ]))
        .expect("config");

        assert!(config.emoji_fallback);
        assert!(!config.prefer_color);
        assert_eq!(
            config.font_dirs,
            Some(vec![PathBuf::from("/a/fonts"), PathBuf::from("/b/fonts")])
        );
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/fontpick")));
        assert_eq!(config.preferred_font.as_deref(), Some("Source Han Sans SC"));
    }

    #[test]
    fn empty_dir_override_is_an_error() {
        let raw = format!(" {SEP} {SEP} ");
        let err = DetectConfig::from_lookup(lookup(&[(ENV_FONT_DIRS, &raw)])).unwrap_err();
        assert!(matches!(err, FontPickError::Configuration { .. }));
    }

    #[cfg(windows)]
    #[test]
    fn drive_letters_survive_dir_splitting() {
        let dirs = parse_dir_list(ENV_FONT_DIRS, r"C:\Windows\Fonts;D:\MyFonts").expect("dirs");
        assert_eq!(
            dirs,
            vec![PathBuf::from(r"C:\Windows\Fonts"), PathBuf::from(r"D:\MyFonts")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn semicolons_are_part_of_unix_paths() {
        let dirs = parse_dir_list(ENV_FONT_DIRS, "/a/fonts:/odd;name").expect("dirs");
        assert_eq!(dirs, vec![PathBuf::from("/a/fonts"), PathBuf::from("/odd;name")]);
    }
}
