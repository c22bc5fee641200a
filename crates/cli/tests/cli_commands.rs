use std::io::Write;

use clap::Parser;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

use courseware_cli::{Cli, run};

fn snapshot_file(starts_at: &str) -> NamedTempFile {
    let snapshot = json!({
        "now": "2025-06-01T12:00:00Z",
        "country": "US",
        "viewer": {
            "id": "learner_1",
            "organizationRoles": [{ "organizationId": "org_1", "name": "member" }],
            "entitlements": [
                { "type": "et_cohort", "metadata": { "contentIds": ["cohort_1"] } }
            ]
        },
        "purchases": [
            { "id": "p1", "productId": "prod_cohort", "status": "Valid", "merchantChargeId": "ch_1" }
        ],
        "entitlementTypes": [{ "id": "et_cohort", "name": "cohort_content_access" }],
        "module": {
            "id": "cohort_1",
            "type": "cohort",
            "fields": { "startsAt": starts_at },
            "resourceProducts": [{ "productId": "prod_cohort" }],
            "resources": [{
                "resourceId": "section_core",
                "resource": {
                    "id": "section_core",
                    "type": "section",
                    "resources": [{ "resourceId": "L1", "resource": { "id": "L1", "type": "lesson" } }]
                }
            }]
        }
    });
    write_json(&snapshot)
}

fn write_json(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    file
}

fn default_config() -> NamedTempFile {
    write_json(&json!({}))
}

fn run_args(config: &NamedTempFile, args: &[&str]) -> anyhow::Result<Value> {
    let config_path = config.path().to_str().unwrap();
    let argv = ["courseware-ability", "--config", config_path]
        .into_iter()
        .chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv)?;
    Ok(serde_json::from_str(&run(&cli)?)?)
}

#[test]
fn started_cohort_lesson_is_readable() {
    let config = default_config();
    let snapshot = snapshot_file("2025-05-01T00:00:00Z");
    let path = snapshot.path().to_str().unwrap();

    let out = run_args(&config, &["can", path, "read", "Content", "-f", "id=L1"]).unwrap();
    assert_eq!(out["granted"], json!(true));

    let out = run_args(&config, &["can", path, "read", "PendingOpenAccess"]).unwrap();
    assert_eq!(out["granted"], json!(false));
}

#[test]
fn pending_cohort_denies_lessons_with_explanation() {
    let config = default_config();
    let snapshot = snapshot_file("2025-07-01T00:00:00Z");
    let path = snapshot.path().to_str().unwrap();

    let out = run_args(&config, &["can", path, "read", "PendingOpenAccess"]).unwrap();
    assert_eq!(out["granted"], json!(true));

    let out = run_args(&config, &["explain", path, "read", "Content", "--field", "id=L1"]).unwrap();
    assert_eq!(out["granted"], json!(false));
    assert_eq!(out["denial"], json!("conditions_not_met"));
}

#[test]
fn type_only_query_reports_instance_required() {
    let config = default_config();
    let snapshot = snapshot_file("2025-05-01T00:00:00Z");
    let path = snapshot.path().to_str().unwrap();

    let out = run_args(&config, &["explain", path, "read", "Content"]).unwrap();
    assert_eq!(out["granted"], json!(false));
    assert_eq!(out["denial"], json!("instance_required"));
}

#[test]
fn rules_command_lists_compiled_rules() {
    let config = default_config();
    let snapshot = snapshot_file("2025-05-01T00:00:00Z");
    let path = snapshot.path().to_str().unwrap();

    let out = run_args(&config, &["rules", path]).unwrap();
    let rules = out.as_array().unwrap();
    assert!(rules.iter().any(|rule| rule["subject"] == json!("Invoice")));
    assert!(rules.iter().any(|rule| rule["subject"] == json!("Discord")));
}

#[test]
fn summary_reports_resolver_outcomes() {
    let config = default_config();
    let snapshot = snapshot_file("2025-07-01T00:00:00Z");
    let path = snapshot.path().to_str().unwrap();

    let out = run_args(&config, &["summary", path]).unwrap();
    assert_eq!(out["purchases"]["hasValidPurchase"], json!(true));
    assert_eq!(out["entitlements"]["pendingOpenAccess"], json!(true));
}

#[test]
fn config_file_switches_off_free_kinds() {
    let config = write_json(&json!({ "freeContentKinds": [] }));
    let snapshot = write_json(&json!({ "now": "2025-06-01T12:00:00Z" }));
    let path = snapshot.path().to_str().unwrap();

    let out = run_args(&config, &["can", path, "read", "Content", "-f", "type=tip"]).unwrap();
    assert_eq!(out["granted"], json!(false));

    let defaults = default_config();
    let out = run_args(&defaults, &["can", path, "read", "Content", "-f", "type=tip"]).unwrap();
    assert_eq!(out["granted"], json!(true));
}

#[test]
fn missing_snapshot_is_an_error() {
    let config = default_config();
    let err = run_args(&config, &["rules", "/nonexistent/snapshot.json"]).unwrap_err();
    assert!(err.to_string().contains("failed to read snapshot"));
}
