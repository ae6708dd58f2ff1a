//! CLI integration tests
//!
//! These tests run the built binary against files written to a scratch
//! directory and check what it prints and writes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CATALOG: &str = r#"{
  "root_class": "ROOT",
  "versions": { "default": "1.0" },
  "classes": {
    "ROOT": { "children": ["A"] },
    "A": { "children": ["B"] },
    "B": { "params": { "x": { "type": "int", "required": true } } }
  }
}"#;

const BASELINE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<raml version="2.0" xmlns="raml20.xsd">
  <cmData type="plan">
    <managedObject class="ROOT" distName="ROOT-1" version="1.0"/>
    <managedObject class="A" distName="ROOT-1/A-1" version="1.0"/>
    <managedObject class="B" distName="ROOT-1/A-1/B-1" version="1.0">
      <p name="x">10</p>
    </managedObject>
  </cmData>
</raml>
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn cmtree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmtree"))
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_transcode_prints_one_value_per_line() {
    let output = cmtree(&[
        "transcode",
        "--formula",
        "(UI_VALUE + 140) * 2 / 1",
        "-70",
        "10",
    ]);

    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "140\n300\n");
}

#[test]
fn test_transcode_strict_rejects_non_numeric() {
    let output = cmtree(&[
        "transcode",
        "--formula",
        "(UI_VALUE + 140) * 2 / 1",
        "--strict",
        "abc",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_run_fine_commit_writes_outputs() {
    // Given: A baseline and a script that changes x
    let temp_dir = TempDir::new().unwrap();
    let catalog = write(temp_dir.path(), "catalog.json", CATALOG);
    let baseline = write(temp_dir.path(), "baseline.xml", BASELINE);
    let script = write(
        temp_dir.path(),
        "edit.cli",
        "### HEADER ###\nticket 42\n### BODY ###\nROOT 1\nA 1\nB 1\nx 20\n",
    );
    let out_dir = temp_dir.path().join("out");

    // When: The script is run and committed in fine mode
    let output = cmtree(&[
        "run",
        "--catalog",
        arg(&catalog),
        "--baseline",
        arg(&baseline),
        "--script",
        arg(&script),
        "--mode",
        "fine",
        "--out-dir",
        arg(&out_dir),
    ]);

    // Then: One update is committed and every artifact is written
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Committed 1 change(s) (fine mode)"));
    assert!(stdout.contains("header: ticket 42"));

    let document = fs::read_to_string(out_dir.join("plan.xml")).unwrap();
    assert!(document.contains("operation=\"update\""));
    assert!(document.contains("<p name=\"x\">20</p>"));
    assert_eq!(
        fs::read_to_string(out_dir.join("plan.cli")).unwrap(),
        "ROOT 1\nA 1\nB 1\nx 20\nexit\nexit\nexit\n"
    );
    assert!(fs::read_to_string(out_dir.join("plan.md"))
        .unwrap()
        .contains("### Updated (1)"));
}

#[test]
fn test_run_strict_stops_on_failed_line() {
    // Given: A script with a line the catalog rejects
    let temp_dir = TempDir::new().unwrap();
    let catalog = write(temp_dir.path(), "catalog.json", CATALOG);
    let script = write(temp_dir.path(), "bad.cli", "ROOT 1\nB 1\n");
    let out_dir = temp_dir.path().join("out");

    // When: It is run in strict mode
    let output = cmtree(&[
        "run",
        "--catalog",
        arg(&catalog),
        "--script",
        arg(&script),
        "--out-dir",
        arg(&out_dir),
        "--strict",
    ]);

    // Then: The run fails and nothing is written
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("script line 2"), "Stderr: {}", stderr);
    assert!(!out_dir.exists());
}

#[test]
fn test_diff_prints_summary_of_two_documents() {
    // Given: A baseline and an edited copy of it
    let temp_dir = TempDir::new().unwrap();
    let baseline = write(temp_dir.path(), "baseline.xml", BASELINE);
    let current = write(
        temp_dir.path(),
        "current.xml",
        &BASELINE.replace("<p name=\"x\">10</p>", "<p name=\"x\">11</p>"),
    );

    // When: They are compared
    let output = cmtree(&[
        "diff",
        "--baseline",
        arg(&baseline),
        "--current",
        arg(&current),
    ]);

    // Then: The summary names the one updated object
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("### Updated (1)"));
    assert!(stdout.contains("`ROOT-1/A-1/B-1` (B)"));
}
