//! Binary-level tests for the command-line interface.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixtures() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn regcorpus() -> Command {
    let mut cmd = Command::cargo_bin("regcorpus").expect("Binary exists");
    cmd.env_remove("REGCORPUS_RETENTION_DAYS")
        .env_remove("REGCORPUS_MIN_CONFIDENCE")
        .env_remove("REGCORPUS_OUTPUT_ENCODING");
    cmd
}

/// Project root with two regulations and a rebuilt catalog.
fn project() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    write(
        &dir.path().join("regulations/3-학사행정/3-1-9.md"),
        "# 교직원포상규정\n\n제1조(목적)\n",
    );
    write(
        &dir.path().join("regulations/3-학사행정/3-2-11.md"),
        "# 보수 지급 규정\n\n제1조(목적)\n",
    );
    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("rebuild-catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 regulations"))
        .stdout(predicate::str::contains("3-학사행정: 2"));
    dir
}

#[test]
fn match_reports_code_and_tier() {
    let dir = project();

    regcorpus()
        .args(["match", "# 보수지급규정", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3-2-11"))
        .stdout(predicate::str::contains("Confidence: 100.0%"));
}

#[test]
fn match_without_result_fails() {
    let dir = project();

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .args(["match", "회의록"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("No matching regulation"));
}

#[test]
fn split_updates_regulations_and_suggests_commit() {
    let dir = project();

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("split")
        .arg(fixtures().join("compilation.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"))
        .stdout(predicate::str::contains("Report:"))
        .stdout(predicate::str::contains("규정 일괄 개정"));

    let text = fs::read_to_string(dir.path().join("regulations/3-학사행정/3-1-9.md")).unwrap();
    assert!(text.contains("제2조(포상 종류)"));
}

#[test]
fn missing_catalog_is_fatal() {
    let dir = tempdir().unwrap();

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("sweep")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Catalog file not found"));
}

#[test]
fn invalid_min_confidence_is_rejected() {
    let dir = project();
    let source = dir.path().join("in.md");
    fs::write(&source, "# 교직원포상규정\n").unwrap();

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("process")
        .arg(&source)
        .args(["--min-confidence", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minimum confidence"));
}

#[test]
fn export_writes_title_named_files() {
    let dir = project();
    let out = dir.path().join("by_title");

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("export")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));

    assert!(out.join("교직원포상규정.md").is_file());
    assert!(out.join("보수 지급 규정.md").is_file());
}

#[test]
fn sanitize_rewrites_only_dirty_regulations() {
    let dir = project();
    let dirty = dir.path().join("regulations/3-학사행정/3-1-9.md");
    write(&dirty, "# 교직원포상규정\n<td style=\"width: 9%\"><p>1~3</p></td>\n");
    let clean = dir.path().join("regulations/3-학사행정/3-2-11.md");
    let clean_before = fs::read_to_string(&clean).unwrap();

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("sanitize")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed 3-1-9"))
        .stdout(predicate::str::contains("1 fixed, 1 unchanged, 0 missing, 0 failed"));

    assert_eq!(
        fs::read_to_string(&dirty).unwrap(),
        "# 교직원포상규정\n<td>\n<p>1&#126;3</p>\n</td>\n"
    );
    assert_eq!(fs::read_to_string(&clean).unwrap(), clean_before);

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 fixed, 2 unchanged"));
}

#[test]
fn sweep_days_flag_overrides_retention() {
    let dir = project();

    regcorpus()
        .arg("--root")
        .arg(dir.path())
        .args(["sweep", "--days", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 backups older than 3 days"));
}
