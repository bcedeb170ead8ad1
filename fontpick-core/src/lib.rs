//! fontpick-core: the quiet matchmaker between text and typefaces
//!
//! Some text needs more than Latin letters. Chinese labels want a font with
//! real ideographs, a stray 🚀 wants an emoji font, and a chart that falls
//! back to tofu boxes helps nobody. This library looks at what is actually
//! installed on the machine and names the family most likely to render it.
//!
//! ## Four Steps to a Good Match
//!
//! **Locating**: knowing where fonts live
//! - Fixed system and user directories per OS, or your own list
//! - Missing directories are shrugged off, not mourned
//!
//! **Scanning**: meeting every face once
//! - TTF, OTF, TTC and OTC, collections included
//! - Parallel parsing with Rayon, deterministic results regardless
//! - A broken file becomes a warning, never a failed detection
//!
//! **Classifying and scoring**: learning each family's talents
//! - A handful of probe characters decides Chinese and emoji coverage
//! - Color tables tell color emoji from their monochrome cousins
//! - Reputation, style completeness and native status add up to a score in `[0, 1]`
//!
//! **Selecting**: making the call
//! - A capable preferred family wins outright
//! - Otherwise the best score wins, with stable tie-breaks
//! - "Nothing suitable" is an answer, not an exception
//!
//! ## A Sample Conversation
//!
//! ```rust,no_run
//! use fontpick_core::config::DetectConfig;
//! use fontpick_core::detector::FontDetector;
//! use fontpick_core::select::Requirement;
//!
//! let detector = FontDetector::new(DetectConfig::from_env()?)?;
//! let decision = detector.detect(Requirement::Chinese, None)?;
//!
//! match decision.font() {
//!     Some(font) => println!("rendering Chinese with {}", font.family_name()),
//!     None => println!("no Chinese font installed ({:?})", decision.reason()),
//! }
//! #
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Remembering Without Re-Reading
//!
//! Scans are cached per environment fingerprint: a cheap hash of the font
//! directories' shape. Install a font and the fingerprint moves, so the next
//! call rescans; leave things alone and every call after the first is a map
//! lookup. Point `FONTPICK_CACHE_DIR` somewhere and the memory survives
//! process restarts too.
//!
//! ## The Cast of Characters
//!
//! - [`FontDetector`](detector::FontDetector): the front door
//! - [`FontRecord`](record::FontRecord): one family, its file and its talents
//! - [`ScanResult`](record::ScanResult): everything found under one fingerprint
//! - [`SelectionDecision`](select::SelectionDecision): the verdict
//!
//! ---
//!
//! Crafted with care at FontLab https://www.fontlab.com/

pub mod cache;
pub mod classify;
pub mod config;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod output;
pub mod platform;
pub mod record;
pub mod scan;
pub mod score;
pub mod select;

pub use config::DetectConfig;
pub use detector::{FontDetector, FontPlan};
pub use error::{FontPickError, Result};
pub use fingerprint::Fingerprint;
pub use record::{Capabilities, FontRecord, FontStyle, ScanResult};
pub use select::{Requirement, SelectionDecision};
