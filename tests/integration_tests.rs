//! Integration tests for soma_exif organ operations
#![cfg(unix)]

mod common;

use common::tool;
use serde_json::json;
use soma_exif::organ::{ExifOrgan, Organ, Stimulus};
use soma_exif::ExifTool;
use std::collections::HashMap;

/// Helper to create a test stimulus
fn create_stimulus(op: &str, input: serde_json::Value) -> Stimulus {
    Stimulus {
        op: op.to_string(),
        input,
        context: HashMap::new(),
    }
}

fn organ_with(script: &str) -> ExifOrgan {
    ExifOrgan::with_exiftool(ExifTool::with_binary(tool(script)))
}

#[tokio::test]
async fn test_metadata_capabilities() {
    let organ = ExifOrgan::new();

    let response = organ.stimulate(create_stimulus("metadata.capabilities", json!({}))).await.unwrap();

    assert!(response.ok);
    assert_eq!(response.output["name"], "soma_exif");
    assert_eq!(response.output["functions"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_all_function_names_match() {
    let card = ExifOrgan::new().describe();

    let function_names: Vec<&str> = card.functions.iter().map(|f| f.name.as_str()).collect();
    for expected in ["metadata.extract", "metadata.version", "metadata.capabilities"] {
        assert!(function_names.contains(&expected), "Missing function: {}", expected);
    }

    for function in &card.functions {
        assert!(!function.description.is_empty(), "Function description is empty for {}", function.name);
        assert!(!function.tags.is_empty(), "Function tags are empty for {}", function.name);
        assert!(!function.examples.is_empty(), "Function examples are empty for {}", function.name);
    }
}

#[tokio::test]
async fn test_extract_single_path() {
    let organ = organ_with("echo_subjects");

    let response = organ
        .stimulate(create_stimulus("metadata.extract", json!({"source": "photo.jpg"})))
        .await
        .unwrap();

    assert!(response.ok, "{}", response.output);
    assert_eq!(response.output, json!({"SourceFile": "photo.jpg"}));
}

#[tokio::test]
async fn test_extract_path_list() {
    let organ = organ_with("echo_subjects");

    let response = organ
        .stimulate(create_stimulus("metadata.extract", json!({"source": ["a.jpg", "b.jpg"]})))
        .await
        .unwrap();

    assert!(response.ok);
    assert_eq!(response.output, json!([{"SourceFile": "a.jpg"}, {"SourceFile": "b.jpg"}]));
    assert_eq!(organ.metrics().snapshot().records_returned, 2);
}

#[tokio::test]
async fn test_extract_buffer_respects_limit() {
    let organ = organ_with("count_stdin");

    let response = organ
        .stimulate(create_stimulus("metadata.extract", json!({
            "source": {"buffer": vec![9u8; 300]},
            "max_buffer_bytes": 100
        })))
        .await
        .unwrap();

    assert!(response.ok);
    assert_eq!(response.output["Bytes"], 100);
}

#[tokio::test]
async fn test_extract_passes_tags_and_config() {
    let organ = organ_with("echo_args");

    let response = organ
        .stimulate(create_stimulus("metadata.extract", json!({
            "source": "photo.jpg",
            "tags": ["Model", "-ThumbnailImage"],
            "config_path": "/etc/exiftool.cfg"
        })))
        .await
        .unwrap();

    assert!(response.ok);
    assert_eq!(
        response.output["Args"],
        json!(["-config", "/etc/exiftool.cfg", "-Model", "--ThumbnailImage", "-j", "photo.jpg"])
    );
}

#[tokio::test]
async fn test_wrong_source_shape() {
    let organ = organ_with("echo_subjects");

    let response = organ
        .stimulate(create_stimulus("metadata.extract", json!({"source": 17})))
        .await
        .unwrap();

    assert!(!response.ok);
    assert_eq!(response.output["kind"], "TypeMismatch");
}

#[tokio::test]
async fn test_tool_failure_exposes_streams() {
    let organ = organ_with("not_found");

    let response = organ
        .stimulate(create_stimulus("metadata.extract", json!({"source": "missing.jpg"})))
        .await
        .unwrap();

    assert!(!response.ok);
    assert_eq!(response.output["kind"], "ToolFailed");
    assert_eq!(response.output["exit_code"], 1);
    assert_eq!(response.output["stdout"], "");
    assert!(response.output["stderr"].as_str().unwrap().contains("File not found"));
}

#[tokio::test]
async fn test_version_operation() {
    let organ = organ_with("version");

    let response = organ.stimulate(create_stimulus("metadata.version", json!({}))).await.unwrap();

    assert!(response.ok);
    assert_eq!(response.output["version"], "12.76");
}

#[tokio::test]
async fn test_metrics_operation_tracks_requests() {
    let organ = organ_with("echo_subjects");

    organ.stimulate(create_stimulus("metadata.extract", json!({"source": "a.jpg"}))).await.unwrap();
    organ.stimulate(create_stimulus("metadata.extract", json!({}))).await.unwrap();

    let response = organ.stimulate(create_stimulus("metrics", json!({}))).await.unwrap();
    assert!(response.ok);
    assert_eq!(response.output["total_requests"], 2);
    assert_eq!(response.output["successful_requests"], 1);
    assert_eq!(response.output["failed_requests"], 1);
    assert_eq!(response.output["operations"]["metadata_extract"], 2);
}

#[test]
fn test_stimulus_context_optional() {
    let stimulus: Stimulus = serde_json::from_value(json!({
        "op": "metadata.extract",
        "input": {"source": "a.jpg"}
    }))
    .unwrap();
    assert!(stimulus.context.is_empty());
}
