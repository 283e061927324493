use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// Nothing listens on port 9, so any request that slips through fails loudly.
const DEAD_SERVER: &str = "http://127.0.0.1:9";

fn makerbook(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("makerbook").unwrap();
    cmd.env_remove("MAKERBOOK_API_URL")
        .env("RUST_LOG", "off")
        .arg("--server")
        .arg(DEAD_SERVER)
        .arg("--token-file")
        .arg(dir.path().join("token"));
    cmd
}

#[test]
fn organize_prints_items_and_steps() {
    let dir = TempDir::new().unwrap();
    makerbook(&dir)
        .args(["organize", "--text", "flour\nsugar\nmix ingredients\nbake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingredients (2)"))
        .stdout(predicate::str::contains("1. mix ingredients"))
        .stdout(predicate::str::contains("2. bake"));
}

#[test]
fn organize_reads_a_file_and_labels_materials() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelf.txt");
    std::fs::write(&path, "Materials:\nplank\nbolts\n\nSteps:\n1. Drill holes\n2. Screw together").unwrap();

    makerbook(&dir)
        .args(["organize", "--type", "diy", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Materials (2)"))
        .stdout(predicate::str::contains("1. Drill holes"));
}

#[test]
fn organize_without_input_fails() {
    let dir = TempDir::new().unwrap();
    makerbook(&dir)
        .arg("organize")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--file or --text"));
}

#[test]
fn like_without_login_asks_to_log_in() {
    let dir = TempDir::new().unwrap();
    makerbook(&dir)
        .args(["like", "p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please log in to like posts"));
}

#[test]
fn short_report_reason_is_rejected() {
    let dir = TempDir::new().unwrap();
    makerbook(&dir)
        .args(["report", "--user", "u2", "--category", "spam", "--reason", "bad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 10 characters"));
}

#[test]
fn unknown_category_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    makerbook(&dir)
        .args(["report", "--user", "u2", "--category", "rudeness", "--reason", "long enough reason"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown report category"));
}

#[test]
fn status_without_token() {
    let dir = TempDir::new().unwrap();
    makerbook(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No token found"));
}

#[test]
fn logout_removes_token_file() {
    let dir = TempDir::new().unwrap();
    let token = dir.path().join("token");
    std::fs::write(&token, "stale").unwrap();

    makerbook(&dir).arg("logout").assert().success();

    assert!(!token.exists());
}
