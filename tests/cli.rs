//! CLI smoke tests
//!
//! Only paths that do not need a working tesseract install are covered here.

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;

fn page_orient() -> Command {
    Command::cargo_bin("page-orient").unwrap()
}

fn sample_png(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("page.png");
    GrayImage::from_pixel(8, 8, Luma([255])).save(&path).unwrap();
    path
}

#[test]
fn test_info_prints_version() {
    page_orient()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "page-orient v{}",
            env!("CARGO_PKG_VERSION")
        )))
        .stdout(predicate::str::contains("Tesseract"));
}

#[test]
fn test_version_flag() {
    page_orient()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_input_exits_with_input_not_found() {
    page_orient()
        .args(["detect", "/nonexistent/scan.tiff"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_thread_count_is_usage_error() {
    page_orient()
        .args(["detect", "scan.tiff", "--threads", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_format_is_usage_error() {
    page_orient()
        .args(["detect", "scan.tiff", "--format", "xml"])
        .assert()
        .code(2);
}

#[test]
fn test_malformed_config_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = sample_png(dir.path());
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[processing\nthreads = ").unwrap();

    page_orient()
        .arg("detect")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config error"));
}

#[test]
fn test_missing_tesseract_binary_is_recognizer_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = sample_png(dir.path());

    page_orient()
        .current_dir(dir.path())
        .arg("detect")
        .arg(&input)
        .args(["--tesseract", "/nonexistent/bin/tesseract"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Recognizer unavailable"));
}
