//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn diagconf() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("diagconf"));
    cmd.env_remove("DIAGCONF_OPTIONS");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn test_cli_version() {
    let mut cmd = diagconf();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("diagconf"));
}

#[test]
fn test_cli_help() {
    let mut cmd = diagconf();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Resolve diagnostics run configurations"))
        .stdout(predicate::str::contains("--options"))
        .stdout(predicate::str::contains("--no-granulate"))
        .stdout(predicate::str::contains("--provenance"));
}

#[test]
fn test_list_options_shows_baseline() {
    let mut cmd = diagconf();
    cmd.arg("--list-options");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--parameters"))
        .stdout(predicate::str::contains("--diags"))
        .stdout(predicate::str::contains("--num_workers"))
        .stdout(predicate::str::contains("--scheduler_addr"))
        .stdout(predicate::str::contains("--granulate"));
}

#[test]
fn test_option_file_adds_flags() {
    let tmp = TempDir::new().expect("tmp");
    let spec = tmp.path().join("options.json");
    fs::write(
        &spec,
        r#"{"-v": {"aliases": ["--vars"], "nargs": "+", "help": "Variables"},
            "--season": {"default": "ANN", "choices": ["ANN", "DJF"]}}"#,
    )
    .expect("write");

    let mut cmd = diagconf();
    cmd.arg("--options").arg(&spec).args(["--", "-v", "pr", "tas"]);
    let runs = stdout_json(&mut cmd);
    assert_eq!(runs[0]["vars"], json!(["pr", "tas"]));
    assert_eq!(runs[0]["season"], json!("ANN"));
}

#[test]
fn test_option_file_from_environment() {
    let tmp = TempDir::new().expect("tmp");
    let spec = tmp.path().join("options.yaml");
    fs::write(&spec, "--region:\n  default: global\n").expect("write");

    let mut cmd = diagconf();
    cmd.env("DIAGCONF_OPTIONS", &spec);
    let runs = stdout_json(&mut cmd);
    assert_eq!(runs[0]["region"], json!("global"));
}

#[test]
fn test_resolves_parameter_and_diag_files() {
    let tmp = TempDir::new().expect("tmp");
    let params = tmp.path().join("params.py");
    let diags = tmp.path().join("diags.cfg");
    fs::write(&params, "case_id = \"v2019\"\nnum = 10\n").expect("write");
    fs::write(&diags, "[Diags1]\nnum = 5\nsets = ['lat_lon']\n\n[Diags2]\nsets = ['zonal']\n")
        .expect("write");

    let mut cmd = diagconf();
    cmd.arg("--").arg("-p").arg(&params).arg("-d").arg(&diags);
    let runs = stdout_json(&mut cmd);
    let runs = runs.as_array().expect("array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["num"], json!(10));
    assert_eq!(runs[0]["sets"], json!(["lat_lon"]));
    assert_eq!(runs[1]["case_id"], json!("v2019"));
}

#[test]
fn test_granulate_expands_runs() {
    let tmp = TempDir::new().expect("tmp");
    let params = tmp.path().join("params.py");
    fs::write(&params, "vars = [\"pr\", \"tas\"]\nseasons = [\"DJF\", \"JJA\", \"ANN\"]\n")
        .expect("write");

    let mut cmd = diagconf();
    cmd.args(["--format", "jsonl", "--"]).arg("-p").arg(&params).args(["-g", "vars", "seasons"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).expect("utf8");
    let runs: Vec<Value> =
        text.lines().map(|l| serde_json::from_str(l).expect("json line")).collect();
    assert_eq!(runs.len(), 6);
    assert_eq!(runs[0]["vars"], json!(["pr"]));
    assert_eq!(runs[0]["seasons"], json!(["DJF"]));
    assert_eq!(runs[5]["vars"], json!(["tas"]));
    assert_eq!(runs[5]["seasons"], json!(["ANN"]));

    let mut cmd = diagconf();
    cmd.args(["--no-granulate", "--"]).arg("-p").arg(&params).args(["-g", "vars"]);
    assert_eq!(stdout_json(&mut cmd).as_array().map(Vec::len), Some(1));
}

#[test]
fn test_defaults_file_fills_baseline() {
    let tmp = TempDir::new().expect("tmp");
    let defaults = tmp.path().join("defaults.json");
    fs::write(&defaults, r#"{"regions": ["global"], "num_workers": 1}"#).expect("write");

    let mut cmd = diagconf();
    cmd.arg("--defaults").arg(&defaults).arg("--provenance").args(["--", "-n", "8"]);
    let runs = stdout_json(&mut cmd);
    assert_eq!(runs[0]["regions"]["value"], json!(["global"]));
    assert_eq!(runs[0]["regions"]["source"], json!("baseline"));
    assert_eq!(runs[0]["num_workers"]["value"], json!(8));
    assert_eq!(runs[0]["num_workers"]["source"], json!("command-line"));
}

#[test]
fn test_required_attribute_missing_fails() {
    let mut cmd = diagconf();
    cmd.args(["--require", "case_id"]);
    cmd.assert().failure().stderr(predicate::str::contains("case_id"));

    let mut cmd = diagconf();
    cmd.args(["--require", "case_id", "--no-check"]);
    cmd.assert().success();
}

#[test]
fn test_unsupported_diag_format_fails() {
    let tmp = TempDir::new().expect("tmp");
    let diags = tmp.path().join("diags.xyz");
    fs::write(&diags, "{}").expect("write");

    let mut cmd = diagconf();
    cmd.arg("--").arg("-d").arg(&diags);
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unsupported"));
}

#[test]
fn test_missing_parameter_file_fails() {
    let mut cmd = diagconf();
    cmd.args(["--", "-p", "does_not_exist.py"]);
    cmd.assert().failure().stderr(predicate::str::contains("does_not_exist.py"));
}

#[test]
fn test_unknown_subset_option_fails() {
    let mut cmd = diagconf();
    cmd.arg("--use=--nope");
    cmd.assert().failure().stderr(predicate::str::contains("--nope"));
}

#[test]
fn test_subset_rejects_inactive_flags() {
    let mut cmd = diagconf();
    cmd.args(["--use", "parameters", "--", "-n", "4"]);
    cmd.assert().failure();
}
