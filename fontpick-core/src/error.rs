//! Error taxonomy for fontpick-core (made by FontLab https://www.fontlab.com/)

use std::path::PathBuf;

/// Structural failures that abort a detection.
///
/// Per-file parse problems never show up here: the scanner turns them into
/// [`ScanWarning`](crate::record::ScanWarning)s. Likewise "no capable font
/// installed" is a regular [`SelectionDecision`](crate::select::SelectionDecision),
/// not an error.
#[derive(Debug, thiserror::Error)]
pub enum FontPickError {
    /// The running OS has no locator variant.
    #[error("unsupported platform: {os} (supported: macos, windows, linux)")]
    UnsupportedPlatform {
        /// Value reported by the platform probe.
        os: String,
    },

    /// Malformed environment or override input.
    #[error("invalid configuration {key}={value:?}: {reason}")]
    Configuration {
        key: String,
        value: String,
        reason: String,
    },

    /// The scan itself could not run (thread pool, unreadable root list, ...).
    #[error("scan failed at {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Persisted scan store could not be read or written.
    #[error("scan cache error at {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl FontPickError {
    pub(crate) fn config(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures that a caller can only fix by changing input or host.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FontPickError>;
