//! fontpick CLI (made by FontLab https://www.fontlab.com/)

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use regex::Regex;
use tracing_subscriber::EnvFilter;

use fontpick_core::config::DetectConfig;
use fontpick_core::detector::{FontDetector, FontPlan};
use fontpick_core::filter::FontFilter;
use fontpick_core::output::{write_json_pretty, write_json_value, write_ndjson};
use fontpick_core::record::{FontRecord, FontStyle};
use fontpick_core::select::{FailureReason, Requirement, SelectionDecision};

pub mod server;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "FONTPICK_LOG";

/// CLI entrypoint for fontpick.
#[derive(Debug, Parser)]
#[command(
    name = "fontpick",
    about = "Pick installed fonts that render Chinese text and emoji (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Scan these directories instead of the platform font directories
    #[arg(long = "font-dir", global = true, value_hint = ValueHint::DirPath)]
    font_dirs: Vec<PathBuf>,

    /// Persist scans as JSON in this directory
    #[arg(long = "cache-dir", global = true, value_hint = ValueHint::DirPath)]
    cache_dir: Option<PathBuf>,

    /// Follow symlinks while walking font directories
    #[arg(long = "follow-symlinks", global = true, action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Number of parser threads (defaults to all cores)
    #[arg(short = 'j', long = "jobs", global = true, value_parser = parse_jobs)]
    jobs: Option<usize>,

    /// Log more (-v info, -vv debug); FONTPICK_LOG takes precedence
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Select the best installed font for Chinese text or emoji
    Detect(DetectArgs),
    /// List classified font families
    List(ListArgs),
    /// Print the fingerprint of the current font directories
    Fingerprint,
    /// Drop persisted scans
    Invalidate(InvalidateArgs),
    /// Serve detection over HTTP
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct DetectArgs {
    /// Select an emoji font instead of a Chinese one
    #[arg(long = "emoji", action = ArgAction::SetTrue, conflicts_with = "plan")]
    emoji: bool,

    /// Select Chinese and emoji fonts and print the full family chain
    #[arg(long = "plan", action = ArgAction::SetTrue)]
    plan: bool,

    /// Family to use when installed and capable
    #[arg(short = 'p', long = "prefer", value_hint = ValueHint::Other)]
    prefer: Option<String>,

    /// Rank monochrome emoji fonts above color ones
    #[arg(long = "mono-emoji", action = ArgAction::SetTrue)]
    mono_emoji: bool,

    /// Emit the decision as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Regex patterns; the family name must match at least one
    #[arg(short = 'n', long = "name", value_hint = ValueHint::Other)]
    name_patterns: Vec<String>,

    /// Only families that render Chinese
    #[arg(long = "chinese", action = ArgAction::SetTrue)]
    chinese: bool,

    /// Only emoji families
    #[arg(long = "emoji", action = ArgAction::SetTrue)]
    emoji: bool,

    /// Only color emoji families
    #[arg(long = "color-emoji", action = ArgAction::SetTrue)]
    color_emoji: bool,

    /// Only families shipping all of these styles
    #[arg(short = 's', long = "style", value_delimiter = ',', value_enum)]
    styles: Vec<StyleArg>,

    /// Only families whose quality score is at least this (0.0-1.0)
    #[arg(long = "min-score", value_parser = parse_score)]
    min_score: Option<f64>,

    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Format output as padded columns
    #[arg(long = "columns", action = ArgAction::SetTrue)]
    columns: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

#[derive(Debug, Args)]
struct InvalidateArgs {
    /// Remove every persisted scan, not just the current fingerprint's
    #[arg(long = "all", action = ArgAction::SetTrue)]
    all: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long = "bind", default_value = "127.0.0.1:8765")]
    bind: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum StyleArg {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl From<StyleArg> for FontStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Regular => FontStyle::Regular,
            StyleArg::Bold => FontStyle::Bold,
            StyleArg::Italic => FontStyle::Italic,
            StyleArg::BoldItalic => FontStyle::BoldItalic,
        }
    }
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    let config = build_config(&cli.global)?;

    match cli.command {
        Command::Detect(args) => run_detect(args, config),
        Command::List(args) => run_list(args, config),
        Command::Fingerprint => run_fingerprint(config),
        Command::Invalidate(args) => run_invalidate(args, config),
        Command::Serve(args) => run_serve(args, config),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Environment first, then command-line overrides.
fn build_config(global: &GlobalArgs) -> Result<DetectConfig> {
    let mut config = DetectConfig::from_env()?;
    if !global.font_dirs.is_empty() {
        config.font_dirs = Some(global.font_dirs.clone());
    }
    if let Some(dir) = &global.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    config.scan.follow_symlinks |= global.follow_symlinks;
    if global.jobs.is_some() {
        config.scan.jobs = global.jobs;
    }
    Ok(config)
}

fn parse_jobs(raw: &str) -> Result<usize, String> {
    let jobs: usize = raw
        .parse()
        .map_err(|_| format!("invalid job count: {raw}"))?;
    if jobs == 0 {
        return Err("jobs must be at least 1".to_string());
    }
    Ok(jobs)
}

fn parse_score(raw: &str) -> Result<f64, String> {
    let score: f64 = raw
        .parse()
        .map_err(|_| format!("invalid score: {raw}"))?;
    if !(0.0..=1.0).contains(&score) {
        return Err("score must be between 0 and 1".to_string());
    }
    Ok(score)
}

fn run_detect(args: DetectArgs, mut config: DetectConfig) -> Result<()> {
    if args.mono_emoji {
        config.prefer_color = false;
    }
    if args.plan {
        config.emoji_fallback = true;
    }
    let detector = FontDetector::new(config)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.plan {
        let plan = detector.plan(args.prefer.as_deref())?;
        if args.json {
            return write_json_value(&plan, &mut handle);
        }
        write_plan(&plan, &mut handle)?;
        return ensure_selected(Requirement::Chinese, &plan.primary);
    }

    let requirement = if args.emoji {
        Requirement::Emoji
    } else {
        Requirement::Chinese
    };
    let decision = detector.detect(requirement, args.prefer.as_deref())?;

    if args.json {
        return write_json_value(&decision, &mut handle);
    }
    write_decision(&decision, &mut handle)?;
    ensure_selected(requirement, &decision)
}

fn run_list(args: ListArgs, config: DetectConfig) -> Result<()> {
    let filter = build_filter(&args)?;
    let detector = FontDetector::new(config)?;
    let records = detector.list_fonts(&filter)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = match args.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => handle.is_terminal(),
    };

    if args.ndjson {
        write_ndjson(&records, &mut handle)?;
    } else if args.json {
        write_json_pretty(&records, &mut handle)?;
    } else if args.columns {
        write_columns(&records, &mut handle, use_color)?;
    } else {
        write_plain(&records, &mut handle, use_color)?;
    }

    Ok(())
}

fn run_fingerprint(config: DetectConfig) -> Result<()> {
    let detector = FontDetector::new(config)?;
    println!("{}", detector.fingerprint());
    Ok(())
}

fn run_invalidate(args: InvalidateArgs, config: DetectConfig) -> Result<()> {
    if config.cache_dir.is_none() {
        return Err(anyhow!(
            "nothing to invalidate: set FONTPICK_CACHE_DIR or pass --cache-dir"
        ));
    }
    let detector = FontDetector::new(config)?;

    if args.all {
        let removed = detector.invalidate_all()?;
        println!("removed {removed} persisted scan(s)");
    } else {
        let fingerprint = detector.fingerprint();
        detector.invalidate(&fingerprint);
        println!("invalidated {fingerprint}");
    }
    Ok(())
}

fn run_serve(args: ServeArgs, config: DetectConfig) -> Result<()> {
    let detector = FontDetector::new(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(server::serve(&args.bind, detector))
}

fn build_filter(args: &ListArgs) -> Result<FontFilter> {
    let name_patterns = compile_patterns(&args.name_patterns)?;
    let styles = args.styles.iter().copied().map(FontStyle::from).collect();

    let mut filter = FontFilter::new()
        .with_name_patterns(name_patterns)
        .with_styles(styles)
        .require_chinese(args.chinese)
        .require_emoji(args.emoji)
        .require_color_emoji(args.color_emoji);
    if let Some(score) = args.min_score {
        filter = filter.with_min_score(score);
    }
    Ok(filter)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid regex: {p}")))
        .collect()
}

fn ensure_selected(requirement: Requirement, decision: &SelectionDecision) -> Result<()> {
    match decision {
        SelectionDecision::Selected { .. } => Ok(()),
        SelectionDecision::NotSelected { reason, attempted } => {
            let tried: Vec<&str> = attempted.iter().map(|a| a.family.as_str()).collect();
            Err(anyhow!(
                "no installed font can render {requirement} ({}); tried: {}",
                reason_label(*reason),
                tried.join(", ")
            ))
        }
    }
}

fn reason_label(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::NotFound => "none of the known families is installed",
        FailureReason::CapabilityMismatch => "installed families lack the needed glyphs",
    }
}

fn write_decision(decision: &SelectionDecision, mut w: impl Write) -> Result<()> {
    if let Some(font) = decision.font() {
        writeln!(w, "{}\t{}", font.family_name(), font.id())?;
    }
    Ok(())
}

fn write_plan(plan: &FontPlan, mut w: impl Write) -> Result<()> {
    if let Some(font) = plan.primary.font() {
        writeln!(w, "chinese\t{}\t{}", font.family_name(), font.id())?;
    }
    if let Some(font) = plan.emoji.as_ref().and_then(|d| d.font()) {
        writeln!(w, "emoji\t{}\t{}", font.family_name(), font.id())?;
    }
    writeln!(w, "chain\t{}", plan.family_chain().join(", "))?;
    Ok(())
}

fn write_plain(records: &[FontRecord], mut w: impl Write, color: bool) -> Result<()> {
    for record in records {
        let rendered = apply_color(&record.id(), color, AnsiColor::Cyan);
        writeln!(w, "{}\t{rendered}", record.family_name())?;
    }
    Ok(())
}

fn write_columns(records: &[FontRecord], mut w: impl Write, color: bool) -> Result<()> {
    let mut rows: Vec<(String, String, String)> = records
        .iter()
        .map(|r| {
            let caps = r.capabilities();
            let mut tags = Vec::new();
            if caps.supports_chinese {
                tags.push("zh");
            }
            if caps.is_color_emoji {
                tags.push("color-emoji");
            } else if caps.is_emoji {
                tags.push("emoji");
            }
            let summary = format!(
                "score:{:.3} styles:{} {}",
                r.quality_score(),
                r.styles().len(),
                tags.join(",")
            );
            (r.id(), r.family_name().to_string(), summary.trim_end().to_string())
        })
        .collect();

    let path_width = rows
        .iter()
        .map(|r| r.0.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 120);
    let name_width = rows
        .iter()
        .map(|r| r.1.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 80);

    for (path, name, summary) in rows.drain(..) {
        let padded_path = format!("{:<path_width$}", path);
        let padded_name = format!("{:<name_width$}", name);
        let rendered_path = apply_color(&padded_path, color, AnsiColor::Cyan);
        let rendered_name = apply_color(&padded_name, color, AnsiColor::Yellow);
        let rendered_summary = apply_color(&summary, color, AnsiColor::Green);

        writeln!(w, "{rendered_path}  {rendered_name}  {rendered_summary}")?;
    }

    Ok(())
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}
