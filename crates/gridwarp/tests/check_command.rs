use std::fs;
use std::process::Command;

use serde_json::Value;

fn gridwarp() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gridwarp"));
    command.env("RUST_LOG", "off");
    command
}

#[test]
fn check_prints_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.toml");
    fs::write(
        &page,
        r#"
[container]
grid = 20
strength = "2"
relaxation = "0.8"

[[projects.links]]
img = "/img/a.jpg"
href = "https://a.example"

[[projects.links]]
img = "/img/b.jpg"
"#,
    )
    .unwrap();

    let output = gridwarp()
        .args(["check", "--json"])
        .arg(&page)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["active"], Value::Bool(true));
    assert_eq!(report["settings"]["grid"], 20);
    assert_eq!(report["settings"]["strength"], 2.0);
    assert_eq!(report["links"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["links"][1]["href"], Value::Null);
    assert_eq!(report["distinct_images"], 2);
}

#[test]
fn check_rejects_invalid_page() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.toml");
    fs::write(&page, "[[projects.links]]\nimg = \"\"\n").unwrap();

    let output = gridwarp().arg("check").arg(&page).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn inactive_page_exits_cleanly_without_a_window() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.toml");
    fs::write(&page, "[container]\ngrid = 10\n").unwrap();

    let output = gridwarp().arg(&page).output().unwrap();
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn check_reports_default_grid_for_oversized_value() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.toml");
    fs::write(
        &page,
        "[container]\ndata-grid = \"1e12\"\n\n[[projects.links]]\nimg = \"/a.jpg\"\n",
    )
    .unwrap();

    let output = gridwarp()
        .args(["check", "--json"])
        .arg(&page)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["settings"]["grid"], 34);
}

#[test]
fn tiny_fps_is_reported_not_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.toml");
    fs::write(&page, "[container]\n\n[[projects.links]]\nimg = \"/a.jpg\"\n").unwrap();

    let output = gridwarp()
        .arg(&page)
        .args(["--fps", "1e-30"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1), "{output:?}");
}
