//! HTTP server for fontpick, a small help desk for font choices (made by FontLab https://www.fontlab.com/)
//!
//! This module puts the detector behind a cozy little web API so that
//! plotting services in other processes can ask "which font should I use for
//! these characters?" without scanning the disk themselves. One detector is
//! shared by every request, so the scan cache warms up once and stays warm.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task;
use tracing::info;

use fontpick_core::detector::{FontDetector, FontPlan};
use fontpick_core::error::FontPickError;
use fontpick_core::filter::FontFilter;
use fontpick_core::record::FontRecord;
use fontpick_core::select::{Requirement, SelectionDecision};

type Shared = Arc<FontDetector>;
type ApiError = (StatusCode, String);

/// A polite question about which font to use.
///
/// Leave everything out and you get the best Chinese font. Ask for
/// `"requirement": "emoji"` for an emoji font, or `"plan": true` for the
/// whole family chain a plotting library should install.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetectRequest {
    /// `chinese` (default) or `emoji`
    pub requirement: Option<String>,
    /// Family to use when it is installed and capable
    pub preferred: Option<String>,
    /// Return a full plan instead of a single decision
    pub plan: bool,
}

/// Either a single verdict or the whole plan, depending on what was asked.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DetectResponse {
    Decision(SelectionDecision),
    Plan(FontPlan),
}

/// Filters for the font listing, all optional, all combined.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FontsQuery {
    /// Regex the family name must match
    pub name: Option<String>,
    pub chinese: bool,
    pub emoji: bool,
    pub color_emoji: bool,
    /// Lowest acceptable quality score
    pub min_score: Option<f64>,
}

/// Opens the help desk and starts answering questions.
pub async fn serve(bind: &str, detector: FontDetector) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;
    info!(%bind, "fontpick server listening");

    axum::serve(listener, router(Arc::new(detector)))
        .await
        .context("serving HTTP")?;
    Ok(())
}

/// The road map: health checks, detection, and the listing.
pub fn router(detector: Shared) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/detect", post(detect_handler))
        .route("/fonts", get(fonts_handler))
        .with_state(detector)
}

/// Where the actual choosing happens, off the async threads since scanning
/// touches the disk.
async fn detect_handler(
    State(detector): State<Shared>,
    Json(req): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    let requirement = match req.requirement.as_deref() {
        Some(raw) => Requirement::from_str(raw).map_err(to_bad_request)?,
        None => Requirement::Chinese,
    };
    if req.plan && requirement == Requirement::Emoji {
        return Err((
            StatusCode::BAD_REQUEST,
            "plan always starts from the chinese requirement".to_string(),
        ));
    }

    let response = task::spawn_blocking(move || {
        let preferred = req.preferred.as_deref();
        if req.plan {
            detector.plan(preferred).map(DetectResponse::Plan)
        } else {
            detector
                .detect(requirement, preferred)
                .map(DetectResponse::Decision)
        }
    })
    .await
    .map_err(join_error)?
    .map_err(from_core_error)?;

    Ok(Json(response))
}

/// Everything the scan found, narrowed by the query string.
async fn fonts_handler(
    State(detector): State<Shared>,
    Query(query): Query<FontsQuery>,
) -> Result<Json<Vec<FontRecord>>, ApiError> {
    let mut filter = FontFilter::new()
        .require_chinese(query.chinese)
        .require_emoji(query.emoji)
        .require_color_emoji(query.color_emoji);
    if let Some(pattern) = &query.name {
        let re = Regex::new(pattern).map_err(to_bad_request)?;
        filter = filter.with_name_patterns(vec![re]);
    }
    if let Some(score) = query.min_score {
        if !(0.0..=1.0).contains(&score) {
            return Err(to_bad_request(format!("min_score out of range: {score}")));
        }
        filter = filter.with_min_score(score);
    }

    let records = task::spawn_blocking(move || detector.list_fonts(&filter))
        .await
        .map_err(join_error)?
        .map_err(from_core_error)?;

    Ok(Json(records))
}

fn to_bad_request(err: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn join_error(err: task::JoinError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("task join error: {err}"),
    )
}

fn from_core_error(err: FontPickError) -> ApiError {
    let status = if err.is_structural() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string())
}
