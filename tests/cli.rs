use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// A command with its config pointed at an empty scratch directory
fn sss(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sss").unwrap();
    cmd.env("SSS_CONFIG", home.path().join("config.json"))
        .env_remove("RUST_LOG");
    cmd
}

/// Pull the Base64 shares out of split's stdout
fn printed_shares(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| line.trim_start().starts_with('['))
        .filter_map(|line| line.split_whitespace().nth(1).map(str::to_string))
        .collect()
}

fn share_file(dir: &Path, index: usize) -> String {
    dir.join(format!("share_{:02}.b64", index)).display().to_string()
}

#[test]
fn test_version() {
    let home = tempdir().unwrap();
    sss(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sss"));
}

#[test]
fn test_split_then_combine_with_printed_shares() {
    let home = tempdir().unwrap();
    let output = sss(&home)
        .args(["split", "-n", "3", "-t", "2", "--secret", "hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shares (Base64):"))
        .stdout(predicate::str::contains(
            "Split OK. n=3 t=2; share length=3 bytes (raw), 4 Base64 chars.",
        ))
        .stdout(predicate::str::contains("Self-test: PASS"))
        .get_output()
        .stdout
        .clone();

    let shares = printed_shares(&output);
    assert_eq!(shares.len(), 3);

    for pair in [[0, 1], [1, 2], [2, 0]] {
        let list = format!("{},{}", shares[pair[0]], shares[pair[1]]);
        sss(&home)
            .args(["combine", "--shares", &list])
            .assert()
            .success()
            .stdout("hi\n");
    }
}

#[test]
fn test_split_to_files_then_combine_files() {
    let home = tempdir().unwrap();
    let out = home.path().join("shares");

    sss(&home)
        .args(["split", "-n", "5", "-t", "3", "--secret", "correct horse battery staple"])
        .arg("--outdir")
        .arg(&out)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 5 share files"))
        .stdout(predicate::str::contains("Shares (Base64):").not());

    for i in 1..=5 {
        assert!(out.join(format!("share_{:02}.b64", i)).is_file());
    }

    let files = [share_file(&out, 5), share_file(&out, 2), share_file(&out, 4)].join(",");
    sss(&home)
        .args(["combine", "--files", &files])
        .assert()
        .success()
        .stdout("correct horse battery staple\n");
}

#[test]
fn test_binary_secret_round_trip() {
    let home = tempdir().unwrap();
    let secret_path = home.path().join("secret.bin");
    let recovered_path = home.path().join("recovered.bin");
    let out = home.path().join("shares");
    let secret: Vec<u8> = (0..=255u8).rev().collect();
    fs::write(&secret_path, &secret).unwrap();

    sss(&home)
        .args(["split", "-n", "4", "-t", "4", "--quiet"])
        .arg("--in")
        .arg(&secret_path)
        .arg("--outdir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("share length=257 bytes"));

    let files = (1..=4).map(|i| share_file(&out, i)).collect::<Vec<_>>().join(",");

    sss(&home)
        .args(["combine", "--files", &files])
        .assert()
        .success()
        .stderr(predicate::str::contains("looks binary"));

    sss(&home)
        .args(["combine", "--files", &files])
        .arg("--out")
        .arg(&recovered_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(256 bytes)"));

    assert_eq!(fs::read(&recovered_path).unwrap(), secret);
}

#[test]
fn test_config_defaults_apply() {
    let home = tempdir().unwrap();
    fs::write(
        home.path().join("config.json"),
        r#"{ "default_shares": 5, "default_threshold": 3, "quiet": true }"#,
    )
    .unwrap();

    sss(&home)
        .args(["split", "--secret", "defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("n=5 t=3"))
        .stdout(predicate::str::contains("Shares (Base64):").not());

    // Flags win over the config file
    sss(&home)
        .args(["split", "-n", "4", "-t", "2", "--secret", "flags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("n=4 t=2"));
}

#[test]
fn test_split_rejects_bad_parameters() {
    let home = tempdir().unwrap();
    for (n, t) in [("1", "1"), ("3", "1"), ("3", "4"), ("256", "2")] {
        sss(&home)
            .args(["split", "-n", n, "-t", t, "--secret", "x"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("require 2 <= t <= n <= 255"));
    }
}

#[test]
fn test_split_rejects_empty_secret() {
    let home = tempdir().unwrap();
    sss(&home)
        .args(["split", "-n", "3", "-t", "2", "--secret", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("secret is empty"));
}

#[test]
fn test_split_needs_exactly_one_source() {
    let home = tempdir().unwrap();
    sss(&home)
        .args(["split", "-n", "3", "-t", "2"])
        .assert()
        .failure()
        .code(2);

    sss(&home)
        .args(["split", "-n", "3", "-t", "2", "--secret", "a", "--in", "b"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_combine_needs_two_shares() {
    let home = tempdir().unwrap();
    sss(&home)
        .args(["combine", "--shares", "aGk="])
        .assert()
        .failure()
        .stderr(predicate::str::contains("need at least 2 shares"));
}

#[test]
fn test_combine_reports_duplicate_and_mismatched_shares() {
    let home = tempdir().unwrap();
    let output = sss(&home)
        .args(["split", "-n", "3", "-t", "2", "--secret", "dup"])
        .output()
        .unwrap();
    let shares = printed_shares(&output.stdout);
    assert_eq!(shares.len(), 3);

    sss(&home)
        .args(["combine", "--shares", &format!("{},{}", shares[0], shares[0])])
        .assert()
        .failure()
        .stderr(predicate::str::contains("distinct tags"));

    // "aGk=" decodes to two bytes, the split shares are four
    sss(&home)
        .args(["combine", "--shares", &format!("{},aGk=", shares[0])])
        .assert()
        .failure()
        .stderr(predicate::str::contains("same length"));
}

#[test]
fn test_combine_reports_bad_base64() {
    let home = tempdir().unwrap();
    sss(&home)
        .args(["combine", "--shares", "aGk=,@@@"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("share 2"));

    let empty = home.path().join("empty.b64");
    fs::write(&empty, "  \n").unwrap();
    sss(&home)
        .args(["combine", "--files"])
        .arg(format!("{},{}", empty.display(), empty.display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("is empty"));
}

#[test]
fn test_combine_prints_raw_binary_bytes() {
    let home = tempdir().unwrap();
    let secret_path = home.path().join("secret.bin");
    let out = home.path().join("shares");
    fs::write(&secret_path, [0xFFu8, 0xFE, 0x41]).unwrap();

    sss(&home)
        .args(["split", "-n", "3", "-t", "2", "--quiet"])
        .arg("--in")
        .arg(&secret_path)
        .arg("--outdir")
        .arg(&out)
        .assert()
        .success();

    let files = format!("{},{}", share_file(&out, 1), share_file(&out, 3));
    let output = sss(&home)
        .args(["combine", "--files", &files])
        .assert()
        .success()
        .stderr(predicate::str::contains("looks binary"))
        .get_output()
        .stdout
        .clone();

    assert_eq!(output, [0xFFu8, 0xFE, 0x41, b'\n']);
}

#[test]
fn test_combine_file_list_tolerates_spaces_and_empty_entries() {
    let home = tempdir().unwrap();
    let out = home.path().join("shares");

    sss(&home)
        .args(["split", "-n", "3", "-t", "2", "--quiet", "--secret", "spaced out"])
        .arg("--outdir")
        .arg(&out)
        .assert()
        .success();

    let files = format!("{}, {} ,", share_file(&out, 1), share_file(&out, 2));
    sss(&home)
        .args(["combine", "--files", &files])
        .assert()
        .success()
        .stdout("spaced out\n");
}
