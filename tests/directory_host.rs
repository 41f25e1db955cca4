#![cfg(unix)]

use anyhow::Result;
use footprint_operand::{
    engine::{run_operand, Invocation},
    error::OperandError,
    host::{settings::SettingsBlob, DirectoryHost, HostMode, OperandArgs},
};
use std::{fs, path::Path};

const REPORT_PRINTF: &str =
    r"printf 'h\nh\nh\nh\nh\nh\nh\nh\nX-Min : 1.234E-02\nX-Max : 5.6\nY-Min : -7.0\nY-Max : 8.90E+01\n'";

fn compute_cmd(seen: &Path) -> String {
    format!(
        "cp \"$OPERAND_SETTINGS\" '{}' && {} > \"$OPERAND_REPORT\"",
        seen.display(),
        REPORT_PRINTF
    )
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn end_to_end_with_shell_compute() -> Result<()> {
    let samples = tempfile::tempdir()?;
    let scratch = tempfile::tempdir()?;
    fs::write(samples.path().join("footprint.cfg"), "FOO_SURFACE=0\nRAY_DENSITY=15\n")?;
    let seen = scratch.path().join("seen.cfg");
    let results_file = scratch.path().join("results.json");

    let args = OperandArgs { hx: 2.5, hy: 0.0, px: 0.0, py: 0.0 };
    let mut host = DirectoryHost::new(samples.path(), args)
        .with_capacity(5)
        .with_compute_cmd(Some(compute_cmd(&seen)))
        .with_results_file(Some(results_file.clone()));

    let extents = run_operand(&mut host, &Invocation::default())?;
    assert_eq!(extents.to_array(), [0.01234, 5.6, -7.0, 89.0]);
    assert_eq!(host.results(), Some(&[0.01234, 5.6, -7.0, 89.0, 0.0][..]));

    let computed = SettingsBlob::read(&seen)?;
    assert_eq!(computed.get("FOO_SURFACE"), Some("2.5"));
    assert_eq!(computed.get("RAY_DENSITY"), Some("15"));

    let written: Vec<f64> = serde_json::from_str(&fs::read_to_string(&results_file)?)?;
    assert_eq!(written.len(), 5);

    // Only the seed settings remain: no staged files, no report.
    assert_eq!(entries(samples.path()), vec!["footprint.cfg".to_string()]);
    Ok(())
}

#[test]
fn guard_off_passes_seed_settings_through() -> Result<()> {
    let samples = tempfile::tempdir()?;
    let scratch = tempfile::tempdir()?;
    let seed = "# seed\nFOO_SURFACE=0\n\nRAY_DENSITY=15\n";
    fs::write(samples.path().join("footprint.cfg"), seed)?;
    let seen = scratch.path().join("seen.cfg");

    let args = OperandArgs { hx: 0.0, hy: 3.0, px: 0.0, py: 0.0 };
    let mut host = DirectoryHost::new(samples.path(), args).with_compute_cmd(Some(compute_cmd(&seen)));
    run_operand(&mut host, &Invocation::default())?;

    assert_eq!(fs::read_to_string(&seen)?, seed);
    Ok(())
}

#[test]
fn command_without_report_is_compute_error() -> Result<()> {
    let samples = tempfile::tempdir()?;
    let args = OperandArgs { hx: 1.0, ..OperandArgs::default() };
    let mut host = DirectoryHost::new(samples.path(), args).with_compute_cmd(Some("true".into()));

    let err = run_operand(&mut host, &Invocation::default()).unwrap_err();
    assert!(matches!(err, OperandError::Compute(_)));
    assert!(host.results().is_none());
    assert!(entries(samples.path()).is_empty());
    Ok(())
}

#[test]
fn wrong_mode_runs_nothing() -> Result<()> {
    let samples = tempfile::tempdir()?;
    let marker = samples.path().join("ran");
    let mut host = DirectoryHost::new(samples.path(), OperandArgs::default())
        .with_mode(HostMode::Extension)
        .with_compute_cmd(Some(format!("touch '{}'", marker.display())));

    let err = run_operand(&mut host, &Invocation::default()).unwrap_err();
    assert!(matches!(err, OperandError::HostState(_)));
    assert!(!marker.exists());
    Ok(())
}

#[test]
fn missing_samples_dir_is_connection_error() {
    let mut host = DirectoryHost::new("/no/such/samples/dir", OperandArgs::default())
        .with_compute_cmd(Some("true".into()));
    let err = run_operand(&mut host, &Invocation::default()).unwrap_err();
    assert!(matches!(err, OperandError::Connection(ref m) if m.contains("not found")));
}
