//! End-to-end runs of the `hems-sim` binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    run_with_log(args, "off")
}

fn run_with_log(args: &[&str], rust_log: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hems-sim"))
        .args(args)
        .env("RUST_LOG", rust_log)
        .output()
        .expect("hems-sim process should run")
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hems-sim-{}-{name}", std::process::id()))
}

#[test]
fn every_preset_runs_via_cli() {
    for preset in ["demo", "tight_budget", "solar_day"] {
        let output = run(&["--preset", preset]);
        assert!(
            output.status.success(),
            "preset {preset} failed: stderr={}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
        assert!(stdout.contains("--- Energy Report at"), "{stdout}");
        assert!(stdout.contains("Consumed:"), "{stdout}");
    }
}

#[test]
fn demo_prints_shedding_transition() {
    let output = run(&[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with("18:30"))
        .unwrap_or_else(|| panic!("missing 18:30 tick in output: {stdout}"));
    assert!(line.contains("started:oven;shed:heater"), "{line}");
}

#[test]
fn exports_both_csv_files() {
    let ticks = temp_path("ticks.csv");
    let energy = temp_path("energy.csv");
    let output = run(&[
        "--preset",
        "solar_day",
        "--telemetry-out",
        ticks.to_str().unwrap(),
        "--energy-out",
        energy.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let tick_csv = fs::read_to_string(&ticks).unwrap();
    // header + one row per minute up to 20:00
    assert_eq!(tick_csv.lines().count(), 1 + 20 * 60);
    assert!(tick_csv.starts_with("minute,time,total_kw,allowed_kw"));

    let energy_csv = fs::read_to_string(&energy).unwrap();
    // header + seven devices
    assert_eq!(energy_csv.lines().count(), 8);

    let _ = fs::remove_file(ticks);
    let _ = fs::remove_file(energy);
}

#[test]
fn scenario_file_runs_and_reports_script_output() {
    let path = temp_path("scenario.toml");
    fs::write(
        &path,
        r#"
script = ["set kettle on", "set time 00:10", "show kettle"]

[grid]
max_power_kw = 3.0
production_device = ""

[[devices]]
id = "kettle"
name = "Kettle"
power_kw = -2.2
priority = 4
"#,
    )
    .unwrap();

    let output = run(&["--scenario", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kettle"));
    assert!(stdout.contains("Energy Report at 00:10"));
}

#[test]
fn invalid_inputs_exit_with_error() {
    assert!(!run(&["--preset", "nonexistent"]).status.success());
    assert!(!run(&["--bogus"]).status.success());
    assert!(!run(&["--scenario", "/definitely/not/here.toml"]).status.success());

    let path = temp_path("invalid.toml");
    fs::write(&path, "[grid]\nmax_power_kw = -1.0\n").unwrap();
    let output = run(&["--scenario", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("grid.max_power_kw"));
}

#[test]
fn rust_log_controls_crate_logging() {
    let ticks = temp_path("log-ticks.csv");
    let args = ["--telemetry-out", ticks.to_str().unwrap()];

    let quiet = run_with_log(&args, "off");
    assert!(quiet.status.success());
    let stderr = String::from_utf8_lossy(&quiet.stderr);
    assert!(!stderr.contains("telemetry written"), "{stderr}");

    let verbose = run_with_log(&args, "hems_sim=debug");
    assert!(verbose.status.success());
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("household built"), "{stderr}");
    assert!(stderr.contains("telemetry written"), "{stderr}");

    let _ = fs::remove_file(ticks);
}
