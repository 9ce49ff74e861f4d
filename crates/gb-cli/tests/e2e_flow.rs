//! End-to-end tests driving the `gb` binary.
//!
//! Each test runs against its own temporary HOME so the user's real
//! configuration and database are never touched.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn gb_binary() -> String {
    env!("CARGO_BIN_EXE_gb").to_string()
}

fn gb(home: &Path, args: &[&str]) -> Output {
    Command::new(gb_binary())
        .env("HOME", home)
        .env("GB_DATABASE_PATH", home.join("gb.db"))
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run gb")
}

fn gb_ok(home: &Path, args: &[&str]) -> String {
    let output = gb(home, args);
    assert!(
        output.status.success(),
        "gb {} should succeed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is UTF-8")
}

fn gb_json(home: &Path, args: &[&str]) -> serde_json::Value {
    serde_json::from_str(&gb_ok(home, args)).expect("stdout is JSON")
}

#[test]
fn test_log_predict_and_invoice_flow() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    for date in ["01/01/2025", "11/01/2025", "21/01/2025"] {
        gb_ok(
            home,
            &["log", "--date", date, "--type", "Taglio erba", "--hours", "2"],
        );
    }
    gb_ok(
        home,
        &[
            "log",
            "--date",
            "2025-01-15",
            "--type",
            "Taglio siepe",
            "--hours",
            "1",
            "--price",
            "70",
        ],
    );
    gb_ok(
        home,
        &[
            "expense", "add", "--date", "20/01/2025", "--item", "Concime", "--price", "40",
        ],
    );

    let works = gb_json(home, &["works", "--json"]);
    assert_eq!(works.as_array().unwrap().len(), 4);
    assert_eq!(works[0]["amount"], serde_json::json!(30.0));

    let predictions = gb_json(home, &["predict", "--today", "25/01/2025", "--json"]);
    assert_eq!(
        predictions,
        serde_json::json!([{
            "date": "2025-01-31",
            "entries": [{
                "type": "Taglio erba",
                "average_interval_days": 10,
                "last_occurrence": "2025-01-21"
            }]
        }])
    );

    let invoice = gb_json(
        home,
        &[
            "invoice",
            "--from",
            "01/01/2025",
            "--to",
            "31/01/2025",
            "--json",
        ],
    );
    assert_eq!(invoice["total"], serde_json::json!(200.0));
    let amounts: Vec<u64> = invoice["allocations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|allocation| allocation["amount"].as_u64().unwrap())
        .collect();
    assert_eq!(amounts.iter().sum::<u64>(), 200);
    assert_eq!(amounts, vec![40, 61, 58, 41]);

    let status = gb_ok(home, &["status"]);
    assert!(status.contains("Work sessions: 4 (last 21/01/2025)"));
    assert!(status.contains("Expenses: 1 (last 20/01/2025)"));
}

#[test]
fn test_split_uses_configured_shares() {
    let temp = TempDir::new().unwrap();
    let output = gb_ok(temp.path(), &["split", "1000", "--json"]);
    let allocations: serde_json::Value = serde_json::from_str(&output).unwrap();
    let amounts: Vec<u64> = allocations
        .as_array()
        .unwrap()
        .iter()
        .map(|allocation| allocation["amount"].as_u64().unwrap())
        .collect();
    assert_eq!(amounts, vec![201, 305, 290, 204]);
}

#[test]
fn test_invalid_share_table_fails_at_startup() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.toml");
    std::fs::write(
        &config,
        "[[shares]]\nlabel = \"North\"\nweight = 500.0\n\n[[shares]]\nlabel = \"South\"\nweight = 400.0\n",
    )
    .unwrap();

    let output = gb(
        temp.path(),
        &["--config", config.to_str().unwrap(), "split", "100"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid share table"), "{stderr}");
}

#[test]
fn test_import_then_delete() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    let export = home.join("export.json");
    std::fs::write(
        &export,
        r#"[
            {"id": 1, "data": "03/03/2025", "tipo": "Raccolta foglie", "durata": "1", "importo": 15},
            {"id": 2, "data": "10/03/2025", "tipi": ["Raccolta foglie"], "durata": "1.5"}
        ]"#,
    )
    .unwrap();

    let output = gb_ok(home, &["import", export.to_str().unwrap()]);
    assert_eq!(output, "Imported 2 work sessions (0 already present)\n");

    let works = gb_json(home, &["works", "--json"]);
    assert_eq!(works[1]["amount"], serde_json::json!(22.5));

    gb_ok(home, &["delete-work", "1"]);
    let works = gb_json(home, &["works", "--json"]);
    assert_eq!(works.as_array().unwrap().len(), 1);

    let output = gb(home, &["delete-work", "1"]);
    assert!(!output.status.success());
}

#[test]
fn test_malformed_date_is_rejected() {
    let temp = TempDir::new().unwrap();
    let output = gb(
        temp.path(),
        &["log", "--date", "31/02/2025", "--type", "Taglio erba", "--hours", "1"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid date"));
}
