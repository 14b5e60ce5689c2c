use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn get_cli_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aoa-sweep"))
}

/// Run the CLI inside `dir`, so the default AoA store and ledger land there
fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(get_cli_binary())
        .current_dir(dir)
        .args(args)
        .args(["--log-level", "error"])
        .output()
        .expect("Failed to execute command")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["--help"]);

    assert!(output.status.success(), "Help command should succeed");
    let stdout = stdout_of(&output);
    for cmd in ["velocity", "set-aoa", "read-aoa", "reduce", "sweep", "summary", "init-config", "info"] {
        assert!(stdout.contains(cmd), "Should list {} command", cmd);
    }
}

#[test]
fn test_cli_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_cli_velocity_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["velocity", "--aoa", "30", "--output", "json"]);

    assert!(output.status.success(), "Command should succeed");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert!((value["u"].as_f64().unwrap() - 13.856).abs() < 1e-3);
    assert!((value["v"].as_f64().unwrap() - 8.0).abs() < 1e-9);
    assert_eq!(value["speed"].as_f64(), Some(16.0));
}

#[test]
fn test_cli_set_and_read_negative_aoa() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["set-aoa", "-5"]);
    assert!(output.status.success(), "set-aoa should succeed: {:?}", output);

    let output = run_in(dir.path(), &["read-aoa"]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output).trim(), "-5");
    assert_eq!(fs::read_to_string(dir.path().join("aoa.txt")).unwrap().trim(), "-5");
}

#[test]
fn test_cli_read_missing_store_falls_back_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["read-aoa"]);

    assert!(output.status.success());
    assert_eq!(stdout_of(&output).trim(), "0");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Warning"));
}

#[test]
fn test_cli_reduce_appends_with_single_header() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run_in(dir.path(), &["set-aoa", "0"]).status.success());

    // One process per reduction, as a host driving the tool per angle would
    for _ in 0..3 {
        let output = run_in(dir.path(), &["reduce", "--force", "2", "0", "0", "--output", "tsv"]);
        assert!(output.status.success(), "reduce should succeed: {:?}", output);
    }

    let ledger = fs::read_to_string(dir.path().join("aoa_results.txt")).unwrap();
    let lines: Vec<&str> = ledger.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("AoA_deg\tFx[N]"));
    assert_eq!(lines.iter().filter(|l| l.starts_with("AoA_deg")).count(), 1);

    let fields: Vec<f64> = lines[1].split('\t').map(|t| t.parse().unwrap()).collect();
    assert_eq!(fields.len(), 14);
    assert!((fields[6] - 0.03189).abs() < 1e-5, "Cd column: {}", fields[6]);
}

#[test]
fn test_cli_sweep_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        dir.path(),
        &["sweep", "--start", "-4", "--end", "8", "--step", "2", "--iterations", "5", "--output", "tsv"],
    );
    assert!(output.status.success(), "sweep should succeed: {:?}", output);
    assert_eq!(stdout_of(&output).lines().count(), 1 + 7);

    let output = run_in(dir.path(), &["summary", "--output", "json"]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(summary["rows"].as_u64(), Some(7));
    assert_eq!(summary["aoa_min"].as_f64(), Some(-4.0));
    assert_eq!(summary["aoa_max"].as_f64(), Some(8.0));
    assert_eq!(summary["cl_max_aoa"].as_f64(), Some(8.0));
}

#[test]
fn test_cli_uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sweep.toml");
    fs::write(
        &config,
        "[aerodynamics]\nfreestream_speed = 10.0\n\n[files]\naoa_path = \"run_aoa.txt\"\nresults_path = \"run_results.txt\"\n",
    )
    .unwrap();
    let config_arg = config.to_str().unwrap();

    let output = run_in(dir.path(), &["--config", config_arg, "velocity", "--aoa", "0", "-o", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["u"].as_f64(), Some(10.0));

    assert!(run_in(dir.path(), &["--config", config_arg, "set-aoa", "2.5"]).status.success());
    assert!(dir.path().join("run_aoa.txt").exists());
    assert!(!dir.path().join("aoa.txt").exists());
}

#[test]
fn test_cli_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[aerodynamics]\nreference_length = -1.0\n").unwrap();

    let output = run_in(dir.path(), &["--config", config.to_str().unwrap(), "info"]);
    assert!(!output.status.success(), "Invalid configuration should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("reference_length"));
}

#[test]
fn test_cli_init_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["init-config"]);
    assert!(output.status.success());

    let path = dir.path().join("generated.toml");
    fs::write(&path, stdout_of(&output)).unwrap();
    let output = run_in(dir.path(), &["--config", path.to_str().unwrap(), "info"]);
    assert!(output.status.success(), "generated config should load: {:?}", output);
}

#[test]
fn test_cli_missing_required_args() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["reduce"]);
    assert!(!output.status.success(), "Should fail with missing --force");
}
