//! End-to-end tests for the basic-cleaning binary.
//!
//! Each test builds a throwaway artifact store, runs the binary inside a
//! scratch working directory, and inspects what was published.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

const RAW: &str = "\
id,name,room_type,price,longitude,latitude,last_review
1,Cozy studio,Private room,100,-73.95,40.68,2019-01-01
2,No type,,100,-74.0,40.7,2019-01-01
3,Palace,Entire home/apt,5000,-74.0,40.7,
4,Bad date,Private room,100,-74.0,40.7,not-a-date
5,Edge,Shared room,10,-74.25,41.2,2018-07-15
";

/// Helper to run the binary and capture output
fn run_cleaning(workdir: &Path, store: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_basic-cleaning"))
        .args(args)
        .arg("--artifact_root")
        .arg(store)
        .current_dir(workdir)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute basic-cleaning");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

/// Lay out `<store>/sample.csv/v0/sample.csv` the way a previous upload step would.
fn seed_store(store: &Path, content: &str) {
    let dir = store.join("sample.csv").join("v0");
    fs::create_dir_all(&dir).expect("Failed to create artifact dir");
    fs::write(dir.join("sample.csv"), content).expect("Failed to write raw sample");
}

fn standard_args<'a>(min_price: &'a str, max_price: &'a str) -> Vec<&'a str> {
    vec![
        "--input_artifact",
        "nyc_airbnb/sample.csv:latest",
        "--output_artifact",
        "clean_sample.csv",
        "--output_type",
        "clean_sample",
        "--output_description",
        "Data with outliers and null values removed",
        "--min_price",
        min_price,
        "--max_price",
        max_price,
    ]
}

fn published_file(store: &Path) -> PathBuf {
    store.join("clean_sample.csv").join("v0").join("clean_sample.csv")
}

#[test]
fn cleans_sample_and_publishes_artifact() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    seed_store(store.path(), RAW);

    let (_, stderr, code) = run_cleaning(work.path(), store.path(), &standard_args("10", "350"));
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("Drop outliers"));

    let text = fs::read_to_string(published_file(store.path())).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,name,room_type,price,longitude,latitude,last_review",
            "1,Cozy studio,Private room,100,-73.95,40.68,2019-01-01",
            "4,Bad date,Private room,100,-74,40.7,",
            "5,Edge,Shared room,10,-74.25,41.2,2018-07-15",
        ]
    );

    let meta = fs::read_to_string(store.path().join("clean_sample.csv/v0/metadata.json")).unwrap();
    let meta: serde_json::Value = serde_json::from_str(&meta).unwrap();
    assert_eq!(meta["type"], "clean_sample");
    assert_eq!(meta["description"], "Data with outliers and null values removed");

    assert!(!work.path().join("clean_sample.csv").exists());
    let runs: Vec<_> = fs::read_dir(store.path().join("runs")).unwrap().collect();
    assert_eq!(runs.len(), 1);
}

#[test]
fn cleaning_published_output_again_changes_nothing() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    seed_store(store.path(), RAW);

    let (_, stderr, code) = run_cleaning(work.path(), store.path(), &standard_args("10", "350"));
    assert_eq!(code, 0, "stderr: {stderr}");

    let mut args = standard_args("10", "350");
    args[1] = "clean_sample.csv:v0";
    let (_, stderr, code) = run_cleaning(work.path(), store.path(), &args);
    assert_eq!(code, 0, "stderr: {stderr}");

    let first = fs::read_to_string(published_file(store.path())).unwrap();
    let second = fs::read_to_string(store.path().join("clean_sample.csv/v1/clean_sample.csv")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_input_artifact_exits_non_zero() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();

    let (_, stderr, code) = run_cleaning(work.path(), store.path(), &standard_args("10", "350"));
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"), "stderr: {stderr}");
}

#[test]
fn unreadable_input_exits_non_zero() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    seed_store(store.path(), "room_type,price\nPrivate room,100\n");

    let (_, stderr, code) = run_cleaning(work.path(), store.path(), &standard_args("10", "350"));
    assert_ne!(code, 0);
    assert!(stderr.contains("missing required column"), "stderr: {stderr}");
    assert!(!published_file(store.path()).exists());

    let runs: Vec<_> = fs::read_dir(store.path().join("runs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(runs.len(), 1);
    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&runs[0]).unwrap()).unwrap();
    assert_eq!(record["status"]["state"], "failed");
    assert!(record["status"]["error"]
        .as_str()
        .unwrap()
        .contains("missing required column"));
}

#[test]
fn inverted_price_range_publishes_header_only() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    seed_store(store.path(), RAW);

    let (_, stderr, code) = run_cleaning(work.path(), store.path(), &standard_args("350", "10"));
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("is empty"), "stderr: {stderr}");

    let text = fs::read_to_string(published_file(store.path())).unwrap();
    assert_eq!(text, "id,name,room_type,price,longitude,latitude,last_review\n");
}

#[test]
fn missing_flag_is_a_usage_error() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();

    let (_, stderr, code) = run_cleaning(
        work.path(),
        store.path(),
        &["--input_artifact", "sample.csv:latest"],
    );
    assert_eq!(code, 2);
    assert!(stderr.contains("--output_artifact"));
}
