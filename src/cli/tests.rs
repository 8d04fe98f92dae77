//! Tests for the command-line interface

use super::*;
use crate::model::{EntityId, Observation, StreamRef};
use crate::remote::MemoryStore;
use crate::types::LogLevel;
use crate::validator::{DuplicateValidator, NullValidator};
use chrono::{TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

fn output_lines(out: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(out)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_parse_validate_command() {
    let cli = Cli::try_parse_from([
        "sta-validator",
        "-c",
        "importer.yaml",
        "validate",
        "-i",
        "obs.jsonl",
        "--fail-fast",
    ])
    .unwrap();

    assert_eq!(cli.config, PathBuf::from("importer.yaml"));
    assert_eq!(cli.level(), LogLevel::Info);
    match cli.command {
        Commands::Validate { input, fail_fast } => {
            assert_eq!(input, PathBuf::from("obs.jsonl"));
            assert!(fail_fast);
        }
        Commands::Check { .. } => panic!("Expected validate command"),
    }
}

#[test]
fn test_parse_check_command_verbose() {
    let cli = Cli::try_parse_from(["sta-validator", "check", "-v"]).unwrap();

    assert_eq!(cli.config, PathBuf::from("config.yaml"));
    assert_eq!(cli.level(), LogLevel::Debug);
    assert!(matches!(cli.command, Commands::Check { connect: false }));
}

#[test]
fn test_validate_requires_input() {
    assert!(Cli::try_parse_from(["sta-validator", "validate"]).is_err());
}

#[tokio::test]
async fn test_validate_lines_reports_each_observation() {
    let stream = StreamRef::Datastream(EntityId::Int(1));
    let time = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let store = Arc::new(MemoryStore::new());
    store
        .insert(&stream, Observation::new(time, 1).with_id(9))
        .await;
    let mut validator = DuplicateValidator::new(store.clone(), store).update(true);

    let input = [
        r#"{"phenomenonTime": "2024-01-01T10:00:00Z", "result": 1, "Datastream": {"@iot.id": 1}}"#,
        "",
        r#"{"phenomenonTime": "2024-01-01T10:05:00Z", "result": 2, "Datastream": {"@iot.id": 1}}"#,
        r#"{"phenomenonTime": "2024-01-01T10:00:00Z", "result": 3, "Datastream": {"@iot.id": 1}}"#,
        "not json",
        r#"{"phenomenonTime": "2024-01-01T11:00:00Z", "result": 4}"#,
    ]
    .join("\n");

    let mut out = Vec::new();
    let summary = validate_lines(&mut validator, Cursor::new(input), &mut out, false)
        .await
        .unwrap();

    let lines = output_lines(&out);
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        json!({"line": 1, "outcome": "duplicate", "valid": false, "id": null})
    );
    assert_eq!(
        lines[1],
        json!({"line": 3, "outcome": "new", "valid": true, "id": null})
    );
    assert_eq!(
        lines[2],
        json!({"line": 4, "outcome": "update", "valid": true, "id": 9})
    );
    assert_eq!(lines[3]["line"], 5);
    assert!(lines[3]["error"].as_str().unwrap().contains("JSON"));
    assert!(lines[4]["error"].as_str().unwrap().contains("Datastream"));

    assert_eq!(summary.valid(), 2);
    assert_eq!(summary.invalid(), 1);
    assert_eq!(summary.errors, 2);
}

#[tokio::test]
async fn test_validate_lines_fail_fast() {
    let input = "{\"phenomenonTime\": \"2024-01-01T10:00:00Z\"}\n{broken\n{\"phenomenonTime\": \"2024-01-01T11:00:00Z\"}\n";
    let mut validator = NullValidator;
    let mut out = Vec::new();

    let err = validate_lines(&mut validator, Cursor::new(input), &mut out, true)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("line 2"));
    assert_eq!(output_lines(&out).len(), 1);
}
