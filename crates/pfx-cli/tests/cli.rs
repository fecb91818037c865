use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A `pfx` invocation isolated from any local or user configuration.
fn pfx(workdir: &Path) -> Command {
    let config = workdir.join("pfx.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::cargo_bin("pfx").unwrap();
    cmd.current_dir(workdir)
        .arg("--config")
        .arg(&config);
    cmd
}

fn export_line(workdir: &TempDir) -> PathBuf {
    let out = workdir.path().join("fixtures");
    pfx(workdir.path())
        .args(["export", "--case", "line", "--case", "shunt", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 of 4 fixture(s)"));
    out
}

#[test]
fn cases_lists_builtin_registry() {
    let dir = tempdir().unwrap();
    pfx(dir.path())
        .arg("cases")
        .assert()
        .success()
        .stdout(predicate::str::contains("basic-node"))
        .stdout(predicate::str::contains("asym_gen"));
}

#[test]
fn cases_json_includes_modes() {
    let dir = tempdir().unwrap();
    let output = pfx(dir.path())
        .args(["cases", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let cases: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cases.len(), 10);
    assert_eq!(cases[0]["name"], "basic-node");
    assert_eq!(cases[0]["modes"], json!(["sym"]));
}

#[test]
fn export_writes_fixtures_and_manifest() {
    let dir = tempdir().unwrap();
    let out = export_line(&dir);
    for name in ["pp-sym-line", "pp-asym-line", "pp-sym-shunt", "pp-asym-shunt"] {
        assert!(out.join(name).join("input.json").is_file(), "{name}");
    }
    assert!(out.join("pp-asym-line/pgm_asym_output.json.license").is_file());
    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(out.join("batch_manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["num_cases"], 4);
    assert_eq!(manifest["failure"], 0);
}

#[test]
fn export_honours_prefix_and_mode() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("fixtures");
    pfx(dir.path())
        .args(["export", "--case", "node", "--mode", "asym", "--prefix", "pgm", "-o"])
        .arg(&out)
        .assert()
        .success();
    assert!(out.join("pgm-asym-node").is_dir());
    assert!(!out.join("pgm-sym-node").exists());
}

#[test]
fn export_rejects_unknown_case() {
    let dir = tempdir().unwrap();
    pfx(dir.path())
        .args(["export", "--case", "no-such-case"])
        .assert()
        .failure();
}

#[test]
fn check_accepts_exported_fixtures() {
    let dir = tempdir().unwrap();
    let out = export_line(&dir);
    pfx(dir.path())
        .arg("check")
        .arg(out.join("pp-sym-line"))
        .arg(out.join("pp-asym-shunt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("within tolerance"));
}

#[test]
fn check_flags_foreign_output() {
    let dir = tempdir().unwrap();
    let out = export_line(&dir);
    fs::copy(
        out.join("pp-sym-shunt/sym_output.json"),
        out.join("pp-sym-line/sym_output.json"),
    )
    .unwrap();
    pfx(dir.path())
        .arg("check")
        .arg(out.join("pp-sym-line"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn validate_reports_invalid_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.json");
    fs::write(
        &input,
        json!({
            "version": "1.0",
            "type": "input",
            "is_batch": false,
            "attributes": {},
            "data": {"node": [{"id": 1, "u_rated": -10.0}]}
        })
        .to_string(),
    )
    .unwrap();
    pfx(dir.path())
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("u_rated"));
}

#[test]
fn validate_accepts_exported_input() {
    let dir = tempdir().unwrap();
    let out = export_line(&dir);
    pfx(dir.path())
        .args(["validate", "--mode", "asym"])
        .arg(out.join("pp-asym-line/input.json"))
        .assert()
        .success();
}

#[test]
fn translate_dumps_pandapower_json() {
    let dir = tempdir().unwrap();
    let out = export_line(&dir);
    let net = dir.path().join("net.json");
    let index = dir.path().join("index.json");
    pfx(dir.path())
        .arg("translate")
        .arg(out.join("pp-sym-line/input.json"))
        .arg("-o")
        .arg(&net)
        .arg("--index-out")
        .arg(&index)
        .assert()
        .success();

    let payload: Value = serde_json::from_str(&fs::read_to_string(&net).unwrap()).unwrap();
    assert_eq!(payload["_class"], "pandapowerNet");
    assert!(payload["_object"]["bus"].is_object());
    assert!(payload["_meta"]["pfx_version"].is_string());
    let entries: Vec<Value> = serde_json::from_str(&fs::read_to_string(&index).unwrap()).unwrap();
    assert!(!entries.is_empty());
}

#[test]
fn config_sets_prefix() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("pfx.toml"),
        "[export]\nprefix = \"cfg\"\noutput_root = \"out\"\n",
    )
    .unwrap();
    pfx(dir.path())
        .args(["export", "--case", "basic-node"])
        .assert()
        .success();
    assert!(dir.path().join("out/cfg-sym-basic-node/params.json").is_file());
}
