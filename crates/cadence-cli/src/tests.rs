//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::Path;

use cadence_core::{EngineConfig, RiskLevel, StatusState, WarningLevel};
use tempfile::TempDir;

use crate::commands::{self, history, Output};

const OUT: Output = Output { compact: true };

/// Two steady weeks followed by a spiky single-category week
fn write_activity_csv(dir: &Path) -> std::path::PathBuf {
    let mut csv = String::from("date,name,category,minutes\n");
    for day in 5..=18 {
        csv.push_str(&format!("2026-01-{:02},Focus,Work,30\n", day));
        csv.push_str(&format!("2026-01-{:02},Course,Study,30\n", day));
    }
    for day in [19, 21, 23, 25] {
        csv.push_str(&format!("2026-01-{:02},Crunch,Work,200\n", day));
    }

    let path = dir.join("activities.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn write_request(dir: &Path, days: usize) -> std::path::PathBuf {
    let totals: Vec<serde_json::Value> = (0..days)
        .map(|i| {
            serde_json::json!({
                "date": format!("2026-02-{:02}", i + 1),
                "minutes": 45.0 + (i % 3) as f64 * 5.0,
            })
        })
        .collect();
    let request = serde_json::json!({
        "weekly_daily_totals": totals,
        "weekly_category_totals": {"Work": 200.0, "Health": 150.0},
    });

    let path = dir.join("request.json");
    fs::write(&path, request.to_string()).unwrap();
    path
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_report_from_request() {
    let dir = TempDir::new().unwrap();
    let input = write_request(dir.path(), 14);

    let report =
        commands::cmd_report(&EngineConfig::default(), &input, None, false, OUT).unwrap();
    assert!(report.is_ok());
    assert_eq!(report.context.unwrap().weeks_used, 2);
}

#[test]
fn test_cmd_report_insufficient_data_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_request(dir.path(), 9);

    let result = commands::cmd_report(&EngineConfig::default(), &input, None, false, OUT);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("full weeks"));
}

#[test]
fn test_cmd_report_missing_input() {
    let dir = TempDir::new().unwrap();
    let result = commands::cmd_report(
        &EngineConfig::default(),
        &dir.path().join("nope.json"),
        None,
        false,
        OUT,
    );
    assert!(result.unwrap_err().to_string().contains("Failed to open request"));
}

#[test]
fn test_cmd_import_saves_history() {
    let dir = TempDir::new().unwrap();
    let csv = write_activity_csv(dir.path());
    let history_path = dir.path().join("state").join("history.json");
    let config = EngineConfig::default();

    for _ in 0..3 {
        commands::cmd_import(&config, &csv, Some(history_path.as_path()), true, OUT).unwrap();
    }

    let saved = history::read_history(&history_path).unwrap();
    assert_eq!(saved, vec!["R2", "R2", "R2"]);

    // A fourth run evaluates the saved levels plus this week
    let report = commands::cmd_import(&config, &csv, Some(history_path.as_path()), false, OUT).unwrap();
    let warning = report.warning.unwrap();
    assert_eq!(warning.warning_level, WarningLevel::Elevated);
    assert_eq!(report.status.state, StatusState::Ok);

    // Not saved without the flag
    assert_eq!(history::read_history(&history_path).unwrap().len(), 3);
}

#[test]
fn test_history_file_with_bad_token() {
    let dir = TempDir::new().unwrap();
    let csv = write_activity_csv(dir.path());
    let history_path = dir.path().join("history.json");
    fs::write(&history_path, r#"["R1", "R7"]"#).unwrap();

    let result = commands::cmd_import(&EngineConfig::default(), &csv, Some(history_path.as_path()), true, OUT);
    assert!(result.is_err());

    // History is left untouched
    let content = fs::read_to_string(&history_path).unwrap();
    assert!(content.contains("R7"));
}

#[test]
fn test_history_file_not_json_array() {
    let dir = TempDir::new().unwrap();
    let history_path = dir.path().join("history.json");
    fs::write(&history_path, r#"{"levels": []}"#).unwrap();

    let err = history::read_history(&history_path).unwrap_err();
    assert!(err.to_string().contains("JSON array"));
}

// ========== Classify / Trajectory Command Tests ==========

#[test]
fn test_cmd_classify() {
    let config = EngineConfig::default();

    let verdict = commands::cmd_classify(&config, Some(0.8), Some(0.8), Some(0.5), OUT).unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::R3);

    let verdict = commands::cmd_classify(&config, None, None, None, OUT).unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::R4);

    let err = commands::cmd_classify(&config, Some(0.8), None, None, OUT).unwrap_err();
    assert!(err.to_string().contains("Provide all of"));
}

#[test]
fn test_cmd_classify_non_finite_signal() {
    let err = commands::cmd_classify(
        &EngineConfig::default(),
        Some(f64::NAN),
        Some(0.5),
        Some(0.5),
        OUT,
    )
    .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("not finite"));
    assert!(!message.contains("Provide all of"));
}

#[test]
fn test_cmd_trajectory() {
    let levels: Vec<String> = ["R1", "R2", "R3"].iter().map(|s| s.to_string()).collect();
    let verdict = commands::cmd_trajectory(&levels, OUT).unwrap();
    assert_eq!(verdict.warning_level, WarningLevel::Critical);
    assert_eq!(
        verdict.reason.as_deref(),
        Some("Rapid escalation from moderate risk to fragility")
    );

    let bad = vec!["R1".to_string(), "X".to_string()];
    assert!(commands::cmd_trajectory(&bad, OUT).is_err());
}

// ========== Config Command Tests ==========

#[test]
fn test_load_config_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(&path, "[risk]\ndominance_high = 0.5\n").unwrap();

    let config = commands::load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.risk.dominance_high, 0.5);
    assert_eq!(config.risk.balance_low, 0.35);

    let verdict = commands::cmd_classify(&config, Some(0.1), Some(0.55), Some(0.9), OUT).unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::R1);
}

#[test]
fn test_load_config_missing_explicit_file() {
    let dir = TempDir::new().unwrap();
    let err = commands::load_config(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
    assert!(format!("{:#}", err).contains("Config file not found"));
}

#[test]
fn test_load_config_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(&path, "[explanation]\nmax_drivers = 0\n").unwrap();

    assert!(commands::load_config(Some(path.as_path())).is_err());
}

#[test]
fn test_cmd_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(&path, "[predictor]\nmin_training_pairs = 3\n").unwrap();

    let value = commands::cmd_config(Some(path.as_path()), false, OUT).unwrap();
    assert_eq!(value["source"], "file");
    assert_eq!(value["config"]["predictor"]["min_training_pairs"], 3);
    assert_eq!(value["config"]["risk"]["dominance_high"], 0.65);

    let value = commands::cmd_config(Some(dir.path().join("none.toml").as_path()), true, OUT).unwrap();
    assert_eq!(value["source"], "embedded");
}

#[test]
fn test_output_render() {
    let value = serde_json::json!({"a": 1});
    assert_eq!(Output { compact: true }.render(&value).unwrap(), r#"{"a":1}"#);
    assert!(Output { compact: false }.render(&value).unwrap().contains('\n'));
}
