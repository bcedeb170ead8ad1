//! Selector: requirement in, decision out (made by FontLab https://www.fontlab.com/)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::record::{FontRecord, ScanResult};
use crate::score::{names_match, priority, score, ScoreContext};

/// Capability a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Chinese,
    Emoji,
}

impl Requirement {
    pub fn is_satisfied_by(self, record: &FontRecord) -> bool {
        let caps = record.capabilities();
        match self {
            Requirement::Chinese => caps.supports_chinese,
            Requirement::Emoji => caps.is_emoji,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Requirement::Chinese => "chinese",
            Requirement::Emoji => "emoji",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Requirement {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chinese" | "cjk" | "zh" => Ok(Requirement::Chinese),
            "emoji" => Ok(Requirement::Emoji),
            other => Err(format!("unknown requirement: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// None of the attempted families is installed.
    NotFound,
    /// Something was installed, but not with the required capability.
    CapabilityMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Missing,
    CapabilityMismatch,
}

/// One family the selector tried, and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub family: String,
    /// `path#index` of the installed record, when one was found.
    pub record_id: Option<String>,
    pub outcome: AttemptOutcome,
}

/// Outcome of a selection. "Nothing suitable installed" is an ordinary
/// outcome here, not an error.
///
/// Serialized flat with a boolean `success` field, the shape plotting
/// adapters consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DecisionRepr", try_from = "DecisionRepr")]
pub enum SelectionDecision {
    Selected {
        font: FontRecord,
        setup_time: Duration,
    },
    NotSelected {
        reason: FailureReason,
        attempted: Vec<Attempt>,
    },
}

#[derive(Serialize, Deserialize)]
struct DecisionRepr {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font: Option<FontRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    setup_time: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attempted: Vec<Attempt>,
}

impl From<SelectionDecision> for DecisionRepr {
    fn from(decision: SelectionDecision) -> Self {
        match decision {
            SelectionDecision::Selected { font, setup_time } => DecisionRepr {
                success: true,
                font: Some(font),
                setup_time: Some(setup_time),
                reason: None,
                attempted: Vec::new(),
            },
            SelectionDecision::NotSelected { reason, attempted } => DecisionRepr {
                success: false,
                font: None,
                setup_time: None,
                reason: Some(reason),
                attempted,
            },
        }
    }
}

impl TryFrom<DecisionRepr> for SelectionDecision {
    type Error = String;

    fn try_from(repr: DecisionRepr) -> Result<Self, Self::Error> {
        if repr.success {
            let font = repr.font.ok_or("successful decision without font")?;
            Ok(SelectionDecision::Selected {
                font,
                setup_time: repr.setup_time.unwrap_or_default(),
            })
        } else {
            let reason = repr.reason.ok_or("failed decision without reason")?;
            Ok(SelectionDecision::NotSelected {
                reason,
                attempted: repr.attempted,
            })
        }
    }
}

impl SelectionDecision {
    pub fn is_success(&self) -> bool {
        matches!(self, SelectionDecision::Selected { .. })
    }

    pub fn font(&self) -> Option<&FontRecord> {
        match self {
            SelectionDecision::Selected { font, .. } => Some(font),
            SelectionDecision::NotSelected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            SelectionDecision::Selected { .. } => None,
            SelectionDecision::NotSelected { reason, .. } => Some(*reason),
        }
    }

    /// Replace the measured setup time of a successful decision.
    pub fn with_setup_time(self, elapsed: Duration) -> Self {
        match self {
            SelectionDecision::Selected { font, .. } => SelectionDecision::Selected {
                font,
                setup_time: elapsed,
            },
            other => other,
        }
    }

    /// Compare ignoring `setup_time`, which differs between otherwise identical runs.
    pub fn same_outcome(&self, other: &SelectionDecision) -> bool {
        match (self, other) {
            (
                SelectionDecision::Selected { font: a, .. },
                SelectionDecision::Selected { font: b, .. },
            ) => a == b,
            (a, b) => a == b,
        }
    }
}

/// Pick the best record in `scan` for `ctx.requirement`.
///
/// A capable `preferred_name` wins outright; otherwise records are ranked by
/// `(score desc, priority asc, family asc)`.
pub fn select(
    scan: &ScanResult,
    ctx: &ScoreContext,
    preferred_name: Option<&str>,
) -> SelectionDecision {
    let requirement = ctx.requirement;
    let mut attempted = Vec::new();

    if let Some(preferred) = preferred_name.map(str::trim).filter(|p| !p.is_empty()) {
        match find_preferred(scan, preferred) {
            Some(record) if requirement.is_satisfied_by(record) => {
                debug!(family = record.family_name(), "preferred font selected");
                return selected(record, ctx);
            }
            Some(record) => {
                warn!(
                    family = record.family_name(),
                    %requirement,
                    "preferred font lacks required capability, ranking alternatives"
                );
                attempted.push(attempt_for(preferred, Some(record)));
            }
            None => {
                debug!(family = preferred, "preferred font not installed");
                attempted.push(attempt_for(preferred, None));
            }
        }
    }

    let mut candidates: Vec<(&FontRecord, f64, u32)> = scan
        .records()
        .iter()
        .filter(|record| requirement.is_satisfied_by(record))
        .map(|record| (record, score(record, ctx), priority(record.family_name(), ctx)))
        .collect();
    candidates.sort_by(|a, b| compare_ranked(a, b));

    if let Some((best, best_score, _)) = candidates.first() {
        debug!(family = best.family_name(), score = best_score, "best ranked font selected");
        return selected(best, ctx);
    }

    let known = match requirement {
        Requirement::Chinese => ctx.platform.chinese_families(),
        Requirement::Emoji => ctx.platform.emoji_families(),
    };
    for family in known {
        if attempted.iter().any(|a: &Attempt| names_match(&a.family, family)) {
            continue;
        }
        attempted.push(attempt_for(family, find_preferred(scan, family)));
    }

    let reason = if attempted
        .iter()
        .any(|a| a.outcome == AttemptOutcome::CapabilityMismatch)
    {
        FailureReason::CapabilityMismatch
    } else {
        FailureReason::NotFound
    };

    SelectionDecision::NotSelected { reason, attempted }
}

fn selected(record: &FontRecord, ctx: &ScoreContext) -> SelectionDecision {
    let contextual = record.rescored(score(record, ctx), priority(record.family_name(), ctx));
    SelectionDecision::Selected {
        font: contextual,
        setup_time: Duration::ZERO,
    }
}

fn compare_ranked(a: &(&FontRecord, f64, u32), b: &(&FontRecord, f64, u32)) -> Ordering {
    b.1.total_cmp(&a.1)
        .then_with(|| a.2.cmp(&b.2))
        .then_with(|| a.0.family_name().cmp(b.0.family_name()))
        .then_with(|| a.0.id().cmp(&b.0.id()))
}

/// Exact family match first, then the case/whitespace-insensitive one.
fn find_preferred<'a>(scan: &'a ScanResult, name: &str) -> Option<&'a FontRecord> {
    scan.find_family(name).or_else(|| {
        scan.records()
            .iter()
            .find(|record| names_match(record.family_name(), name))
    })
}

fn attempt_for(family: &str, record: Option<&FontRecord>) -> Attempt {
    Attempt {
        family: family.to_string(),
        record_id: record.map(FontRecord::id),
        outcome: if record.is_some() {
            AttemptOutcome::CapabilityMismatch
        } else {
            AttemptOutcome::Missing
        },
    }
}
