//! Integration tests for the turnkey binary.
//!
//! These run the built executable the way a release pipeline would.

use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn turnkey(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_turnkey"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run turnkey")
}

fn turnkey_with_log(rust_log: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_turnkey"))
        .args(args)
        .env("RUST_LOG", rust_log)
        .output()
        .expect("Failed to run turnkey")
}

fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_bundle_command_json() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("z3-4.8.9-x64-win.zip");
    write_archive(
        &archive,
        &[
            ("z3-4.8.9-x64-win/bin/libz3.dll", "engine"),
            ("z3-4.8.9-x64-win/bin/libz3java.dll", "shim"),
        ],
    );
    let out = temp_dir.path().join("bundle");

    let output = turnkey(&[
        "bundle",
        "--archive",
        archive.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--json",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["resource"], "/native/windows-amd64/libz3.dll");
    assert_eq!(report[1]["resource"], "/native/windows-amd64/libz3java.dll");
    assert!(out.join("native/windows-amd64/libz3java.dll").is_file());
}

#[test]
fn test_bundle_command_custom_names() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("engine-build.zip");
    write_archive(
        &archive,
        &[
            ("dist/bin/libengine.so", "engine"),
            ("dist/bin/libbinding.so", "shim"),
        ],
    );
    let out = temp_dir.path().join("bundle");

    let output = turnkey(&[
        "bundle",
        "--archive",
        archive.to_str().unwrap(),
        "--platform",
        "linux-aarch64",
        "--engine",
        "engine",
        "--shim",
        "binding",
        "--out",
        out.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("native/linux-aarch64/libengine.so").is_file());
    assert!(out.join("native/linux-aarch64/libbinding.so").is_file());
}

#[test]
fn test_bundle_command_rejects_bad_platform() {
    let temp_dir = TempDir::new().unwrap();
    let output = turnkey(&[
        "bundle",
        "--archive",
        "missing.zip",
        "--platform",
        "beos-ppc",
        "--out",
        temp_dir.path().to_str().unwrap(),
    ]);

    assert!(!output.status.success());
}

#[test]
fn test_bundle_command_missing_library_fails() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("z3-4.8.9-x64-osx-10.14.6.zip");
    write_archive(&archive, &[("z3/bin/libz3.dylib", "engine")]);

    let output = turnkey(&[
        "bundle",
        "--archive",
        archive.to_str().unwrap(),
        "--out",
        temp_dir.path().join("bundle").to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("libz3java.dylib"));
}

#[test]
fn test_rust_log_overrides_default_level() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("z3-4.8.9-x64-glibc-2.31.zip");
    write_archive(
        &archive,
        &[
            ("z3/bin/libz3.so", "engine"),
            ("z3/bin/libz3java.so", "shim"),
        ],
    );
    let archive = archive.to_str().unwrap();
    let quiet_out = temp_dir.path().join("quiet");
    let verbose_out = temp_dir.path().join("verbose");

    let quiet = turnkey_with_log(
        "warn",
        &[
            "bundle",
            "--archive",
            archive,
            "--platform",
            "linux-amd64",
            "--out",
            quiet_out.to_str().unwrap(),
        ],
    );
    assert!(quiet.status.success());
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("Bundling"));

    let verbose = turnkey_with_log(
        "debug",
        &[
            "bundle",
            "--archive",
            archive,
            "--platform",
            "linux-amd64",
            "--out",
            verbose_out.to_str().unwrap(),
        ],
    );
    assert!(verbose.status.success());
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("Bundling"), "{stderr}");
    assert!(stderr.contains("Wrote"), "{stderr}");
}

#[test]
fn test_default_level_is_info_without_rust_log() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("z3-4.8.9-x64-win.zip");
    write_archive(
        &archive,
        &[
            ("z3/bin/libz3.dll", "engine"),
            ("z3/bin/libz3java.dll", "shim"),
        ],
    );

    let output = turnkey(&[
        "bundle",
        "--archive",
        archive.to_str().unwrap(),
        "--out",
        temp_dir.path().join("bundle").to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bundling"), "{stderr}");
    assert!(!stderr.contains("Wrote"), "{stderr}");
}

#[test]
fn test_version_flag_reports_package_version() {
    let output = turnkey(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("turnkey {}", env!("CARGO_PKG_VERSION")));
    assert!(env!("CARGO_PKG_VERSION").starts_with("0.1."));
}

#[test]
fn test_platform_command_reports_host() {
    let output = turnkey(&["platform"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("os:"));
    assert!(stdout.contains("arch:"));
}
