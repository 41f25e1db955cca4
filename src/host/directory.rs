//! Directory-backed host.
//!
//! The samples directory plays the part of the host's working area. An
//! analysis is seeded from `<dir>/<kind>.cfg` when that file exists and is
//! computed by a user-supplied shell command, which receives
//! `OPERAND_SETTINGS` (a settings file to read) and `OPERAND_REPORT` (the
//! text report it must write).

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::{Builder, TempPath};

use crate::{
    error::{OperandError, Result, SettingsStage},
    host::{
        settings::{self, SettingsBlob},
        Analysis, AnalysisKind, HostMode, HostSession, LicenseStatus, OperandArgs,
    },
    utils::run_command,
};

#[derive(Debug, Clone)]
pub struct DirectoryHost {
    dir: PathBuf,
    mode: HostMode,
    args: OperandArgs,
    capacity: usize,
    compute_cmd: Option<String>,
    results_file: Option<PathBuf>,
    results: Option<Vec<f64>>,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>, args: OperandArgs) -> Self {
        Self {
            dir: dir.into(),
            mode: HostMode::Operand,
            args,
            capacity: 4,
            compute_cmd: None,
            results_file: None,
            results: None,
        }
    }

    pub fn with_mode(mut self, mode: HostMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_compute_cmd(mut self, cmd: Option<String>) -> Self {
        self.compute_cmd = cmd;
        self
    }

    pub fn with_results_file(mut self, path: Option<PathBuf>) -> Self {
        self.results_file = path;
        self
    }

    /// Results written back by the last invocation.
    pub fn results(&self) -> Option<&[f64]> {
        self.results.as_deref()
    }

    fn seed_path(&self, kind: AnalysisKind) -> PathBuf {
        self.dir.join(format!("{}.cfg", kind.file_stem()))
    }
}

pub struct DirectoryAnalysis {
    dir: PathBuf,
    kind: AnalysisKind,
    settings: SettingsBlob,
    compute_cmd: Option<String>,
    staged_report: Option<TempPath>,
}

fn settings_error(stage: SettingsStage, path: &Path, err: impl ToString) -> OperandError {
    OperandError::Settings {
        stage,
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn compute_error(context: &str, err: impl std::fmt::Display) -> OperandError {
    OperandError::Compute(format!("{}: {}", context, err))
}

impl Analysis for DirectoryAnalysis {
    fn save_settings(&mut self, path: &Path) -> Result<()> {
        self.settings
            .write(path)
            .map_err(|e| settings_error(SettingsStage::Export, path, e))
    }

    fn modify_settings(&mut self, path: &Path, key: &str, value: &str) -> Result<bool> {
        settings::patch_file(path, key, value).map_err(|e| settings_error(SettingsStage::Patch, path, e))
    }

    fn load_settings(&mut self, path: &Path) -> Result<()> {
        self.settings =
            SettingsBlob::read(path).map_err(|e| settings_error(SettingsStage::Reload, path, e))?;
        Ok(())
    }

    fn apply_and_wait(&mut self) -> Result<()> {
        let cmd = self
            .compute_cmd
            .as_deref()
            .ok_or_else(|| OperandError::Compute("no compute command configured".into()))?;
        let stem = self.kind.file_stem();

        let settings_file = Builder::new()
            .prefix(&format!("{}-settings-", stem))
            .suffix(".cfg")
            .tempfile_in(&self.dir)
            .map_err(|e| compute_error("cannot stage settings", e))?;
        self.settings
            .write(settings_file.path())
            .map_err(|e| compute_error("cannot stage settings", e))?;

        let report = Builder::new()
            .prefix(&format!("{}-report-", stem))
            .suffix(".txt")
            .tempfile_in(&self.dir)
            .map_err(|e| compute_error("cannot stage report", e))?
            .into_temp_path();

        let settings_env = settings_file.path().to_string_lossy().into_owned();
        let report_env = report.to_string_lossy().into_owned();
        tracing::debug!(command = cmd, settings = %settings_env, report = %report_env, "running compute command");

        let status = run_command(
            cmd,
            &[("OPERAND_SETTINGS", settings_env.as_str()), ("OPERAND_REPORT", report_env.as_str())],
        )
        .map_err(|e| compute_error("cannot start compute command", e))?;
        if !status.success() {
            return Err(OperandError::Compute(format!("compute command exited with {}", status)));
        }

        let written = fs::metadata(&report).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(OperandError::Compute("compute command wrote no report".into()));
        }
        self.staged_report = Some(report);
        Ok(())
    }

    fn export_text(&mut self, path: &Path) -> Result<()> {
        let staged = self
            .staged_report
            .as_ref()
            .ok_or_else(|| OperandError::Compute("analysis has no results yet".into()))?;
        fs::copy(staged, path)
            .map_err(|e| compute_error(&format!("cannot write {}", path.display()), e))?;
        Ok(())
    }
}

impl HostSession for DirectoryHost {
    type Analysis = DirectoryAnalysis;

    fn check_connection(&self) -> Result<()> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(OperandError::Connection(format!(
                "samples directory {} not found",
                self.dir.display()
            )))
        }
    }

    fn license(&self) -> LicenseStatus {
        LicenseStatus::valid(format!("directory host at {}", self.dir.display()))
    }

    fn mode(&self) -> HostMode {
        self.mode
    }

    fn samples_dir(&self) -> PathBuf {
        self.dir.clone()
    }

    fn operand_arguments(&self) -> OperandArgs {
        self.args
    }

    fn result_capacity(&self) -> usize {
        self.capacity
    }

    fn new_analysis(&mut self, kind: AnalysisKind) -> Result<DirectoryAnalysis> {
        let seed = self.seed_path(kind);
        let settings = if seed.exists() {
            SettingsBlob::read(&seed).map_err(|e| {
                OperandError::HostState(format!("cannot read {}: {}", seed.display(), e))
            })?
        } else {
            SettingsBlob::default()
        };
        Ok(DirectoryAnalysis {
            dir: self.dir.clone(),
            kind,
            settings,
            compute_cmd: self.compute_cmd.clone(),
            staged_report: None,
        })
    }

    fn write_results(&mut self, data: &[f64]) -> Result<()> {
        if let Some(path) = &self.results_file {
            let json = serde_json::to_string_pretty(data)
                .map_err(|e| OperandError::HostState(format!("cannot encode results: {}", e)))?;
            fs::write(path, json).map_err(|e| {
                OperandError::HostState(format!("cannot write {}: {}", path.display(), e))
            })?;
        }
        self.results = Some(data.to_vec());
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn unreachable_without_directory() {
        let host = DirectoryHost::new("/definitely/not/here", OperandArgs::default());
        assert!(matches!(host.check_connection(), Err(OperandError::Connection(_))));
    }

    #[test]
    fn seeds_settings_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("footprint.cfg"), "FOO_SURFACE=3\n").unwrap();
        let mut host = DirectoryHost::new(dir.path(), OperandArgs::default());
        let mut analysis = host.new_analysis(AnalysisKind::Footprint).unwrap();
        let out = dir.path().join("out.cfg");
        analysis.save_settings(&out).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "FOO_SURFACE=3\n");
    }

    #[test]
    fn compute_without_command_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = DirectoryHost::new(dir.path(), OperandArgs::default());
        let mut analysis = host.new_analysis(AnalysisKind::Footprint).unwrap();
        assert!(matches!(analysis.apply_and_wait(), Err(OperandError::Compute(_))));
    }

    #[test]
    fn failing_command_is_compute_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut host =
            DirectoryHost::new(dir.path(), OperandArgs::default()).with_compute_cmd(Some("exit 1".into()));
        let mut analysis = host.new_analysis(AnalysisKind::Footprint).unwrap();
        assert!(matches!(analysis.apply_and_wait(), Err(OperandError::Compute(_))));
        // Staged files are gone once the attempt is over.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
