use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("us-population-sample.csv")
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("population-dashboard").unwrap();
    cmd.arg("--data").arg(fixture());
    cmd
}

#[test]
fn years_most_recent_first() {
    cmd()
        .args(["years"])
        .assert()
        .success()
        .stdout("2019\n2018\n2017\n");
}

#[test]
fn summary_defaults_to_latest_year() {
    cmd()
        .args(["summary"])
        .assert()
        .success()
        .stdout(contains("Year 2019"))
        .stdout(contains("Total population: 199,293,950"))
        .stdout(contains("(no region)"));
}

#[test]
fn summary_json() {
    let output = cmd()
        .args(["--json", "summary", "--year", "2018", "--top", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["year"], 2018);
    assert_eq!(summary["top_states"].as_array().unwrap().len(), 3);
    assert_eq!(summary["top_states"][0]["state"], "California");
    assert_eq!(summary["region_totals"][0]["region"], "Northeast");
    assert_eq!(summary["national_trend"].as_array().unwrap().len(), 3);
}

#[test]
fn unknown_year_fails() {
    cmd()
        .args(["summary", "--year", "1990"])
        .assert()
        .failure()
        .stderr(contains("Invalid year: 1990"));
}

#[test]
fn failure_is_reported_once() {
    let output = cmd()
        .env_remove("RUST_LOG")
        .args(["summary", "--year", "1990"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Invalid year: 1990").count(), 1, "{stderr}");
    assert!(stderr.contains("error: Invalid year: 1990"), "{stderr}");
}

#[test]
fn missing_dataset_fails() {
    let tmp = TempDir::new().unwrap();
    Command::cargo_bin("population-dashboard")
        .unwrap()
        .current_dir(tmp.path())
        .args(["years"])
        .assert()
        .failure()
        .stderr(contains("Data unavailable"));
}

#[test]
fn render_writes_dashboard() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dashboard.html");

    cmd()
        .args(["render", "--year", "2018", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("wrote"));

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains(r#"<option value="2018" selected>2018</option>"#));
    assert!(html.contains(r#"<section data-year="2017" hidden>"#));
    assert!(html.contains("Data Source: US Census Bureau"));
}

#[test]
fn config_file_supplies_regions_and_title() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("dashboard.toml");
    fs::write(
        &config,
        format!(
            "data_path = {:?}\ntop_n = 2\ntitle = \"Coasts\"\n\n\
             [[regions]]\nname = \"Pacific\"\nstates = [\"CA\", \"WA\"]\n",
            fixture().display().to_string()
        ),
    )
    .unwrap();

    let output = Command::cargo_bin("population-dashboard")
        .unwrap()
        .args(["--json", "--config"])
        .arg(&config)
        .arg("summary")
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["region_totals"].as_array().unwrap().len(), 1);
    assert_eq!(summary["region_totals"][0]["region"], "Pacific");
    assert_eq!(summary["top_states"].as_array().unwrap().len(), 2);
}
