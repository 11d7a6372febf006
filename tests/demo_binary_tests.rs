//! The demonstration binary end to end

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn perfstats() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("perfstats");
    cmd.env_remove("PERFSTATS_CONFIG").env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_demo_prints_histograms_and_models() {
    perfstats()
        .assert()
        .success()
        .stdout(predicate::str::contains("Empty histogram p50: NaN"))
        .stdout(predicate::str::contains("Single point (1000 x 1000)"))
        .stdout(predicate::str::contains("========== Best Model"))
        .stdout(predicate::str::contains("linear_scan, Rsq:"))
        .stdout(predicate::str::contains("\"outcome\""));
}

#[test]
fn test_demo_uses_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[histogram]\nsubdivisions = 2\n\n[search]\ncriterion = \"bic\"").unwrap();

    perfstats()
        .env("PERFSTATS_CONFIG", file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Best Model"));
}

#[test]
fn test_demo_rejects_invalid_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[histogram]\nsubdivisions = 99").unwrap();

    perfstats()
        .env("PERFSTATS_CONFIG", file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
