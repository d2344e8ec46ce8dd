use armrest_core::{CSV_HEADER, parse_record};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Short zeroing so stream runs finish quickly against the simulator
fn write_fast_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[zeroing]
samples = 20
delay_ms = 0

[emit]
interval_ms = 50
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("custom.toml");
    fs::write(&path, body).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&[], 2, "Usage:", "stderr")]
#[case(&["stream", "--format", "xml"], 2, "invalid value", "stderr")]
#[case(&["calibrate"], 2, "--sensitivity", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let mut cmd = Command::cargo_bin("armrest").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn stream_writes_header_then_parseable_records() {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let out = Command::cargo_bin("armrest")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["stream", "--iterations", "400", "--pace-ms", "1"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    let records: Vec<_> = lines.map(|l| parse_record(l).unwrap()).collect();
    assert!(records.len() >= 3, "only {} records", records.len());
    assert!(records.windows(2).all(|w| w[1].timestamp_ms - w[0].timestamp_ms >= 50));
    // unloaded simulator: never rested
    assert!(records.iter().all(|r| !r.is_rested && r.cop.is_none()));
}

#[rstest]
fn simulated_load_is_reported_as_rested() {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let out = Command::cargo_bin("armrest")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .env("ARMREST_SIM_LOAD_VOLTS", "2.2,2.2,2.2")
        .args(["stream", "--iterations", "300", "--pace-ms", "1"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let last = parse_record(stdout.lines().last().unwrap()).unwrap();
    assert!(last.is_rested);
    assert!(last.force_total > 3.5);
    assert!(last.cop.is_some());
}

#[rstest]
#[case::alpha_out_of_range("[filter]\nema_alpha = 1.5\n", "ema_alpha")]
#[case::left_not_reference("[sensitivity]\nleft = 0.9\n", "reference channel")]
#[case::collinear("[geometry]\nleft = [0.0, 0.0]\nright = [1.0, 0.0]\nvtc = [2.0, 0.0]\n", "collinear")]
#[case::not_toml("[filter\nema_alpha = 0.1\n", "parse")]
fn invalid_config_exits_with_config_code(#[case] body: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, body);

    Command::cargo_bin("armrest")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn bad_simulated_load_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    Command::cargo_bin("armrest")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .env("ARMREST_SIM_LOAD_VOLTS", "2.2;2.2")
        .args(["stream", "--iterations", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ARMREST_SIM_LOAD_VOLTS"));
}

#[rstest]
fn json_mode_reports_errors_as_objects() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[emit]\ninterval_ms = 0\n");

    let out = Command::cargo_bin("armrest")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("self-check")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));

    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .expect("error object on stderr");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "InvalidConfig");
    assert_eq!(v["exit_code"], 3);
}

#[rstest]
fn calibrate_prints_sensitivity_and_scale() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("sens.csv");
    let mut f = fs::File::create(&csv).unwrap();
    writeln!(f, "channel,raw_units").unwrap();
    writeln!(f, "left,23").unwrap();
    writeln!(f, "right,26").unwrap();
    writeln!(f, "vtc,32.4").unwrap();

    Command::cargo_bin("armrest")
        .unwrap()
        .arg("calibrate")
        .arg("--sensitivity")
        .arg(&csv)
        .args(["--known-kg", "10", "--corrected-raw-total", "100"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[sensitivity]")
                .and(predicate::str::contains("left = 1.000000"))
                .and(predicate::str::contains("right = 0.884615"))
                .and(predicate::str::contains("vtc = 0.709877"))
                .and(predicate::str::contains("newtons_per_unit = 0.981000")),
        );
}

#[rstest]
fn calibrate_reports_bad_header() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("sens.csv");
    let mut f = fs::File::create(&csv).unwrap();
    writeln!(f, "sensor,value").unwrap();
    writeln!(f, "left,23").unwrap();

    Command::cargo_bin("armrest")
        .unwrap()
        .arg("calibrate")
        .arg("--sensitivity")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}
