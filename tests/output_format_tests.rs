//! Integration tests for the report formatters against a hand-built
//! `AuditStore`, exercising the public `auditcore::output` surface rather
//! than the formatters' own inline unit tests.

use std::collections::HashMap;

use auditcore::{format_issues_list, format_json, ElementKind, Issue, JsonReport};
use auditcore::store::AuditStore;

fn sample_store() -> AuditStore {
    AuditStore {
        version: "0.1.0".to_string(),
        revision: 3,
        options: serde_json::Map::new(),
        sitemap: vec![
            "https://example.com/".to_string(),
            "https://example.com/login".to_string(),
        ],
        auditmap: vec![
            "https://example.com/".to_string(),
            "https://example.com/login".to_string(),
        ],
        issues: vec![
            Issue::new(
                ElementKind::Form,
                "sqli",
                "https://example.com/login",
                "SQL Injection",
                "Unescaped input in login form",
                "high",
            ),
            Issue::new(
                ElementKind::Header,
                "headers",
                "https://example.com/",
                "Missing Content-Security-Policy",
                "No CSP header observed",
                "low",
            ),
        ],
        plugin_results: HashMap::new(),
        progress: 100.0,
        status: "done".to_string(),
    }
}

#[test]
fn format_json_round_trips_through_serde_value() {
    let json = format_json(&sample_store(), false).expect("store serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["revision"], 3);
    assert_eq!(value["status"], "done");
    assert_eq!(value["issues"].as_array().unwrap().len(), 2);
    assert_eq!(value["issues"][0]["severity"], "high");
}

#[test]
fn json_report_wraps_store_with_tool_metadata() {
    let report = JsonReport::new(sample_store());
    let json = report.to_json(true).expect("report serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert!(value["metadata"]["tool"]
        .as_str()
        .expect("tool is a string")
        .starts_with("auditcore"));
    assert_eq!(value["store"]["status"], "done");
    assert_eq!(value["store"]["sitemap"].as_array().unwrap().len(), 2);
}

#[test]
fn format_issues_list_numbers_entries_in_order() {
    let store = sample_store();
    let listing = format_issues_list(&store.issues);

    let first_line_idx = listing.find('\n').expect("at least two lines");
    let first_line = &listing[..first_line_idx];
    assert!(first_line.starts_with("1. [sqli]"));
    assert!(listing.contains("2. [headers]"));
    assert!(listing.contains("SQL Injection"));
    assert!(listing.contains("Missing Content-Security-Policy"));
}

#[test]
fn format_issues_list_empty_store_is_empty_string() {
    let store = AuditStore {
        issues: vec![],
        ..sample_store()
    };
    assert_eq!(format_issues_list(&store.issues), "");
}
