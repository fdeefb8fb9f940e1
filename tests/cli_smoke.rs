mod common;

use common::helpers::get_binary;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn help_lists_subcommands() {
    let output = Command::new(get_binary()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["build", "show", "probe", "completion"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
#[cfg(unix)]
fn show_prints_planned_commands_without_running_cmake() {
    let temp = TempDir::new().unwrap();

    let output = Command::new(get_binary())
        .current_dir(temp.path())
        .args([
            "show",
            "--no-config",
            "--python",
            "/usr/bin/python3",
            "--jobs",
            "3",
            "--cmake",
            "/nonexistent/cmake",
        ])
        .env("ENABLE_CUDA", "ON")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("spyker/spyker_plugin"));
    assert!(stdout.contains("-DENABLE_CUDA=ON"));
    assert!(stdout.contains("-DCMAKE_BUILD_TYPE=Release"));
    assert!(stdout.contains("--build . --config Release -- -j3"));
    assert!(!temp.path().join("build").exists());
}

#[test]
#[cfg(unix)]
fn show_json_uses_config_file() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("custom.toml");
    fs::write(
        &config,
        "build_temp = \"out/tmp\"\n\n[[extensions]]\nname = \"pkg/ext\"\nsource_dir = \"native\"\n",
    )
    .unwrap();

    let output = Command::new(get_binary())
        .current_dir(temp.path())
        .args(["show", "--json", "--debug", "--python", "/usr/bin/python3", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plan = plans.get(0).unwrap();
    assert_eq!(plan.get("extension").and_then(|v| v.as_str()), Some("pkg/ext"));
    assert!(
        plan.get("working_dir")
            .and_then(|v| v.as_str())
            .is_some_and(|d| d.ends_with("out/tmp/pkg.ext"))
    );
    let configure = plan.get("configure").and_then(|v| v.as_array()).unwrap();
    assert!(configure.iter().any(|a| a == "-DCMAKE_BUILD_TYPE=Debug"));
}

#[test]
fn probe_reports_missing_cmake() {
    let output = Command::new(get_binary())
        .args(["probe", "--no-config", "--cmake", "/nonexistent/cmake-binary"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CMake must be installed to build the following extensions"));
    assert!(stderr.contains("spyker/spyker_plugin"));
}

#[test]
fn bad_config_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("spyker-build.toml"), "unknown_key = 1\n").unwrap();

    let output = Command::new(get_binary())
        .current_dir(temp.path())
        .args(["probe"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid config file"));
}
