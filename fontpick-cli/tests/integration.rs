#[path = "../../fontpick-core/tests/support/mod.rs"]
mod support;

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use support::{write_font, TestFont};
use tempfile::tempdir;

fn fontpick(font_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fontpick"))
        .env_remove("FONTPICK_CACHE_DIR")
        .env_remove("FONTPICK_PREFERRED_FONT")
        .env_remove("FONTPICK_EMOJI_FALLBACK")
        .env_remove("FONTPICK_EMOJI_COLOR")
        .env_remove("FONTPICK_FONT_DIRS")
        .arg("--font-dir")
        .arg(font_dir)
        .args(args)
        .output()
        .expect("run fontpick")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn shelf() -> tempfile::TempDir {
    let tmp = tempdir().expect("tempdir");
    write_font(tmp.path(), "noto-cjk.ttf", &TestFont::chinese("Noto Sans CJK SC"));
    write_font(tmp.path(), "wqy.ttf", &TestFont::chinese("WenQuanYi Zen Hei"));
    write_font(tmp.path(), "emoji.ttf", &TestFont::color_emoji("Noto Color Emoji"));
    write_font(tmp.path(), "dejavu.ttf", &TestFont::new("DejaVu Sans"));
    tmp
}

#[test]
fn detect_prints_family_and_path() {
    let fonts = shelf();
    let output = fontpick(fonts.path(), &["detect"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("one line");
    assert!(line.starts_with("Noto Sans CJK SC\t"), "stdout: {stdout}");
    assert!(line.ends_with("noto-cjk.ttf"), "stdout: {stdout}");
}

#[test]
fn detect_emoji_json_reports_success() {
    let fonts = shelf();
    let output = fontpick(fonts.path(), &["detect", "--emoji", "--json"]);
    assert_success(&output);

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("parse json output");
    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["font"]["family_name"], "Noto Color Emoji");
    assert_eq!(parsed["font"]["capabilities"]["is_color_emoji"], true);
}

#[test]
fn detect_with_preference_picks_preferred_family() {
    let fonts = shelf();
    let output = fontpick(fonts.path(), &["detect", "--prefer", "WenQuanYi Zen Hei"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("WenQuanYi Zen Hei\t"), "stdout: {stdout}");
}

#[test]
fn detect_on_empty_directory_fails_with_attempts() {
    let empty = tempdir().expect("tempdir");
    let output = fontpick(empty.path(), &["detect"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no installed font can render chinese"), "stderr: {stderr}");
    assert!(stderr.contains("Noto Sans CJK SC"), "stderr: {stderr}");

    let json = fontpick(empty.path(), &["detect", "--json"]);
    assert_success(&json);
    let parsed: Value = serde_json::from_slice(&json.stdout).expect("parse json output");
    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["reason"], "not_found");
}

#[test]
fn detect_plan_prints_family_chain() {
    let fonts = shelf();
    let output = fontpick(fonts.path(), &["detect", "--plan"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let chain = stdout
        .lines()
        .find_map(|l| l.strip_prefix("chain\t"))
        .expect("chain line");
    assert!(
        chain.starts_with("Noto Sans CJK SC, Noto Color Emoji, DejaVu Sans"),
        "chain: {chain}"
    );
}

#[test]
fn list_json_filters_chinese_fonts() {
    let fonts = shelf();
    let output = fontpick(fonts.path(), &["list", "--chinese", "--json"]);
    assert_success(&output);

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("parse json output");
    let arr = parsed.as_array().expect("list --json returns array");
    let families: Vec<&str> = arr
        .iter()
        .filter_map(|entry| entry["family_name"].as_str())
        .collect();
    assert_eq!(families, vec!["Noto Sans CJK SC", "WenQuanYi Zen Hei"]);
}

#[test]
fn list_output_is_ansi_free_with_color_never() {
    let fonts = shelf();
    let output = fontpick(fonts.path(), &["list", "--color", "never"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4, "stdout:\n{stdout}");
    assert!(!stdout.contains("\u{1b}["));
}

#[test]
fn fingerprint_moves_when_a_font_is_added() {
    let fonts = shelf();
    let before = fontpick(fonts.path(), &["fingerprint"]);
    assert_success(&before);

    write_font(&fonts.path().join("more"), "extra.ttf", &TestFont::new("Extra"));
    let after = fontpick(fonts.path(), &["fingerprint"]);
    assert_success(&after);

    let before = String::from_utf8_lossy(&before.stdout).trim().to_string();
    let after = String::from_utf8_lossy(&after.stdout).trim().to_string();
    assert!(!before.is_empty());
    assert_ne!(before, after);
}

#[test]
fn persisted_cache_and_invalidate_cycle() {
    let fonts = shelf();
    let cache = tempdir().expect("tempdir");
    let cache_dir = cache.path().to_str().expect("utf8 path");

    let detect = fontpick(fonts.path(), &["--cache-dir", cache_dir, "detect"]);
    assert_success(&detect);
    let stored = std::fs::read_dir(cache.path()).expect("read cache").count();
    assert_eq!(stored, 1, "one persisted scan expected");

    let invalidate = fontpick(fonts.path(), &["--cache-dir", cache_dir, "invalidate"]);
    assert_success(&invalidate);
    assert!(String::from_utf8_lossy(&invalidate.stdout).starts_with("invalidated "));
    assert_eq!(std::fs::read_dir(cache.path()).expect("read cache").count(), 0);

    let detect = fontpick(fonts.path(), &["--cache-dir", cache_dir, "detect"]);
    assert_success(&detect);
    let all = fontpick(fonts.path(), &["--cache-dir", cache_dir, "invalidate", "--all"]);
    assert_success(&all);
    assert_eq!(
        String::from_utf8_lossy(&all.stdout).trim(),
        "removed 1 persisted scan(s)"
    );
}

#[test]
fn invalid_env_boolean_fails_fast() {
    let fonts = shelf();
    let output = Command::new(env!("CARGO_BIN_EXE_fontpick"))
        .env("FONTPICK_EMOJI_FALLBACK", "maybe")
        .arg("--font-dir")
        .arg(fonts.path())
        .arg("detect")
        .output()
        .expect("run fontpick");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("FONTPICK_EMOJI_FALLBACK"), "stderr: {stderr}");
}
