use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "ocr": { "backend": "disabled" } }"#,
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_receipt(&self, name: &str, seed: u32) -> PathBuf {
        let image = RgbImage::from_fn(120, 80, |x, y| {
            Rgb([((x * 2 + seed) % 256) as u8, ((y * 3) % 256) as u8, ((x + y * seed) % 256) as u8])
        });
        let path = self.path(name);
        image.save(&path).unwrap();
        path
    }

    fn recibo(&self) -> Command {
        let mut cmd = Command::cargo_bin("recibo").unwrap();
        cmd.arg("--config")
            .arg(self.path("config.json"))
            .arg("--database")
            .arg(format!("sqlite://{}", self.path("recibo.db").display()));
        cmd
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("recibo")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("hash"));
}

#[test]
fn test_register_then_reject_duplicate() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("pago.png", 1);

    ws.recibo()
        .args(["register", arg(&receipt)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"source_filename\": \"pago.png\""));

    ws.recibo()
        .args(["register", arg(&receipt), "--name", "otro.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already been registered"));

    ws.recibo()
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pago.png"))
        .stdout(predicate::str::contains("otro.png").not());
}

#[test]
fn test_register_rejects_non_image() {
    let ws = Workspace::new();
    let bogus = ws.path("notes.png");
    std::fs::write(&bogus, "definitely not a picture").unwrap();

    ws.recibo()
        .args(["register", arg(&bogus)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("were not registered"));
}

#[test]
fn test_register_from_stdin_uses_fallback_name() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("pago.png", 2);

    ws.recibo()
        .args(["register", "-"])
        .write_stdin(std::fs::read(&receipt).unwrap())
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#""source_filename": "comp_\d{14}\.jpg""#).unwrap());
}

#[test]
fn test_hash_does_not_register() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("pago.png", 3);

    ws.recibo()
        .args(["hash", arg(&receipt)])
        .assert()
        .success()
        .stdout(predicate::str::contains("visual_fingerprint"))
        .stdout(predicate::str::contains("metadata_fingerprint"));

    ws.recibo()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No receipts registered yet"));
}

#[test]
fn test_show_registered_receipt() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("pago.png", 4);

    let output = ws.recibo().args(["register", arg(&receipt)]).output().unwrap();
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let fingerprint = record["visual_fingerprint"].as_str().unwrap().to_string();

    ws.recibo()
        .args(["show", &fingerprint])
        .assert()
        .success()
        .stdout(predicate::str::contains("pago.png"));

    ws.recibo()
        .args(["show", "0000000000000000"])
        .assert()
        .failure();
}

#[test]
fn test_batch_reports_duplicates() {
    let ws = Workspace::new();
    let inbox = ws.path("inbox");
    std::fs::create_dir(&inbox).unwrap();

    let first = ws.write_receipt("inbox/a.png", 5);
    std::fs::copy(&first, inbox.join("b.png")).unwrap();
    ws.write_receipt("inbox/c.png", 90);
    let summary = ws.path("summary.csv");

    ws.recibo()
        .args(["batch", arg(&inbox), "--jobs", "2", "--summary", arg(&summary)])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 registered, 1 duplicates, 0 failed"));

    let csv = std::fs::read_to_string(&summary).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert_eq!(csv.matches(",duplicate,").count(), 1);
}

#[test]
fn test_config_init_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recibo.json");

    Command::cargo_bin("recibo")
        .unwrap()
        .args(["config", "init", "--output", arg(&path)])
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["ocr"]["language"], "spa");
    assert!(written["store"]["database_url"].as_str().unwrap().starts_with("sqlite:"));
}
