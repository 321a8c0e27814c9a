//! Command-line behaviour of the fauxgrep and fhistogram binaries

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader};
use std::process::Stdio;
use tempfile::tempdir;

#[test]
fn test_fauxgrep_requires_needle_and_path() {
    Command::cargo_bin("fauxgrep")
        .unwrap()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));

    Command::cargo_bin("fauxgrep")
        .unwrap()
        .arg("needle")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_zero_threads_is_usage_error() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("fauxgrep")
        .unwrap()
        .args(["-n", "0", "needle"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(2);

    Command::cargo_bin("fhistogram")
        .unwrap()
        .args(["-n", "zero"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_fauxgrep_prints_matches() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "one\ntwo needle\nthree\n").unwrap();

    Command::cargo_bin("fauxgrep")
        .unwrap()
        .args(["-n", "3", "needle"])
        .arg(&file)
        .assert()
        .success()
        .stdout(format!("{}:2: two needle\n", file.display()));
}

#[test]
fn test_fauxgrep_warns_on_missing_path() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "needle\n").unwrap();

    Command::cargo_bin("fauxgrep")
        .unwrap()
        .arg("needle")
        .arg(dir.path().join("nope"))
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(":1: needle"))
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_fhistogram_prints_totals() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("bytes.bin");
    fs::write(&file, [0x00u8, 0x20, 0x41, 0x61, 0xff]).unwrap();

    Command::cargo_bin("fhistogram")
        .unwrap()
        .arg(&file)
        .assert()
        .success()
        .stdout("1 1 1 1 0 0 0 1\n");
}

#[test]
fn test_fhistogram_flush_interval() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("zeros.bin");
    fs::write(&file, [0u8; 5]).unwrap();

    Command::cargo_bin("fhistogram")
        .unwrap()
        .args(["--flush-every", "2"])
        .arg(&file)
        .assert()
        .success()
        .stdout("2 0 0 0 0 0 0 0\n4 0 0 0 0 0 0 0\n5 0 0 0 0 0 0 0\n");
}

#[test]
fn test_zero_flush_interval_is_usage_error() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("fhistogram")
        .unwrap()
        .args(["--flush-every", "0"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_fauxgrep_stops_quietly_when_stdout_closes() {
    let dir = tempdir().unwrap();
    let padding = "x".repeat(1024);
    for i in 0..2000 {
        fs::write(
            dir.path().join(format!("{:04}.txt", i)),
            format!("needle {}\n", padding),
        )
        .unwrap();
    }

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("fauxgrep"))
        .args(["-n", "4", "needle"])
        .arg(dir.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Read one record, then hang up like `| head -1` does
    let mut first = String::new();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    stdout.read_line(&mut first).unwrap();
    drop(stdout);

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(first.contains(": needle "));
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(!stderr.contains("Broken pipe"), "stderr: {}", stderr);
    assert!(stderr.lines().count() <= 1, "stderr: {}", stderr);
}
