//! End-to-end tests for the apply routine over real files on disk.

use dash_enhance::apply::apply_all;
use dash_enhance::config::builtin_table;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn sample_dashboard() -> Value {
    json!({
        "dashboard": {
            "uid": "message-processing",
            "title": "Message Processing",
            "schemaVersion": 39,
            "panels": [
                {
                    "id": 1,
                    "title": "Delivery Rate",
                    "type": "timeseries",
                    "gridPos": { "h": 8, "w": 12, "x": 0, "y": 0 },
                    "targets": [
                        {
                            "expr": "sum(rate(birthday_scheduler_messages_delivered_total{status=\"ok\"}[5m]))"
                        }
                    ]
                },
                {
                    "id": 2,
                    "title": "Queue Depth",
                    "type": "stat",
                    "targets": [
                        { "expr": "birthday_scheduler_queue_depth", "refId": "B" }
                    ]
                }
            ]
        },
        "meta": { "slug": "message-processing" }
    })
}

fn write_dashboard(dir: &Path, name: &str, value: &Value) {
    let mut text = serde_json::to_string_pretty(value).expect("serialize fixture");
    text.push('\n');
    fs::write(dir.join(name), text).expect("write fixture");
}

fn read_dashboard(dir: &Path, name: &str) -> Value {
    let text = fs::read_to_string(dir.join(name)).expect("read dashboard");
    serde_json::from_str(&text).expect("parse dashboard")
}

#[test]
fn apply_enhances_and_preserves_unowned_fields() {
    let temp = TempDir::new().expect("temp dir");
    write_dashboard(temp.path(), "message-processing.json", &sample_dashboard());

    let table = builtin_table();
    let only = vec!["message-processing.json".to_string()];
    let summary = apply_all(temp.path(), &table, &only, false).expect("apply");
    assert_eq!(summary.enhanced, ["message-processing.json"]);
    assert!(summary.failed.is_empty());

    let root = read_dashboard(temp.path(), "message-processing.json");
    // Sibling of the dashboard body survives.
    assert_eq!(root["meta"]["slug"], "message-processing");
    let dashboard = &root["dashboard"];
    assert_eq!(dashboard["uid"], "message-processing");
    assert_eq!(dashboard["schemaVersion"], 39);

    // Four common variables followed by the queue variable.
    let variables = dashboard["templating"]["list"]
        .as_array()
        .expect("templating list");
    let names: Vec<&str> = variables
        .iter()
        .filter_map(|variable| variable["name"].as_str())
        .collect();
    assert_eq!(
        names,
        ["datasource", "namespace", "instance", "interval", "queue"]
    );

    let links = dashboard["links"].as_array().expect("links");
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|link| link["icon"] == "dashboard"));
    assert!(links.iter().all(|link| link["type"] == "link"));

    let annotation = &dashboard["annotations"]["list"][0];
    let expr = annotation["expr"].as_str().expect("annotation expr");
    assert!(expr.starts_with("ALERTS{alertname=~\"QueueDepthCritical|"));
    assert!(expr.ends_with("namespace=\"$namespace\"}"));

    // Panel queries picked up the variable filters and the interval window.
    let first = dashboard["panels"][0]["targets"][0]["expr"]
        .as_str()
        .expect("first expr");
    assert!(first.contains("namespace=\"$namespace\", instance=~\"$instance\", status=\"ok\""));
    assert!(first.contains("[$interval]"));
    assert_eq!(dashboard["panels"][0]["targets"][0]["refId"], "A");
    assert_eq!(dashboard["panels"][0]["gridPos"]["w"], 12);

    let second = dashboard["panels"][1]["targets"][0]["expr"]
        .as_str()
        .expect("second expr");
    assert_eq!(
        second,
        "birthday_scheduler_queue_depth{namespace=\"$namespace\", instance=~\"$instance\"}"
    );
    assert_eq!(dashboard["panels"][1]["targets"][0]["refId"], "B");

    assert_eq!(dashboard["panels"][0]["description"], "Panel 1: Delivery Rate");
    assert_eq!(dashboard["panels"][1]["description"], "Panel 2: Queue Depth");
}

#[test]
fn apply_is_idempotent() {
    let temp = TempDir::new().expect("temp dir");
    write_dashboard(temp.path(), "message-processing.json", &sample_dashboard());

    let table = builtin_table();
    let only = vec!["message-processing.json".to_string()];
    let first = apply_all(temp.path(), &table, &only, false).expect("first apply");
    assert_eq!(first.enhanced, ["message-processing.json"]);

    let second = apply_all(temp.path(), &table, &only, false).expect("second apply");
    assert!(second.enhanced.is_empty());
    assert_eq!(second.unchanged, ["message-processing.json"]);
}

#[test]
fn plan_leaves_files_untouched() {
    let temp = TempDir::new().expect("temp dir");
    write_dashboard(temp.path(), "message-processing.json", &sample_dashboard());
    let before = fs::read(temp.path().join("message-processing.json")).expect("read before");

    let table = builtin_table();
    let only = vec!["message-processing.json".to_string()];
    let summary = apply_all(temp.path(), &table, &only, true).expect("plan");
    assert_eq!(summary.enhanced, ["message-processing.json"]);

    let after = fs::read(temp.path().join("message-processing.json")).expect("read after");
    assert_eq!(before, after);
}

#[test]
fn broken_file_is_skipped_and_left_intact() {
    let temp = TempDir::new().expect("temp dir");
    write_dashboard(temp.path(), "database.json", &sample_dashboard());
    fs::write(temp.path().join("security.json"), b"{ not json").expect("write broken");

    let table = builtin_table();
    let only = vec!["database.json".to_string(), "security.json".to_string()];
    let summary = apply_all(temp.path(), &table, &only, false).expect("apply");
    assert_eq!(summary.enhanced, ["database.json"]);
    assert_eq!(summary.failed, ["security.json"]);

    let broken = fs::read(temp.path().join("security.json")).expect("read broken");
    assert_eq!(broken, b"{ not json");
}

#[test]
fn missing_files_are_reported_not_fatal() {
    let temp = TempDir::new().expect("temp dir");
    write_dashboard(temp.path(), "infrastructure.json", &sample_dashboard());

    let table = builtin_table();
    let summary = apply_all(temp.path(), &table, &[], false).expect("apply");
    assert_eq!(summary.enhanced, ["infrastructure.json"]);
    assert_eq!(summary.missing.len(), 4);
    assert!(summary.missing.contains(&"overview-dashboard.json".to_string()));
}

#[test]
fn unwrapped_export_is_accepted() {
    let temp = TempDir::new().expect("temp dir");
    let bare = sample_dashboard()["dashboard"].clone();
    write_dashboard(temp.path(), "security.json", &bare);

    let table = builtin_table();
    let only = vec!["security.json".to_string()];
    let summary = apply_all(temp.path(), &table, &only, false).expect("apply");
    assert_eq!(summary.enhanced, ["security.json"]);

    let root = read_dashboard(temp.path(), "security.json");
    assert!(root.get("dashboard").is_none());
    let expr = root["annotations"]["list"][0]["expr"]
        .as_str()
        .expect("annotation expr");
    assert!(expr.contains("SecurityBreach|UnauthorizedAccess"));
}

#[test]
fn missing_directory_is_an_error() {
    let temp = TempDir::new().expect("temp dir");
    let missing = temp.path().join("no-such-dir");
    let table = builtin_table();
    let err = apply_all(&missing, &table, &[], false).expect_err("missing dir");
    assert!(err.to_string().contains("not found"));
}
