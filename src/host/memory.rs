//! In-memory host. Analyses keep their settings as a [`SettingsBlob`] and
//! render a canned report, which makes every stage observable from tests and
//! from `--dry-run`.

use std::{
    cell::{Ref, RefCell},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    error::{OperandError, Result, SettingsStage},
    host::{
        settings::{self, SettingsBlob},
        Analysis, AnalysisKind, HostMode, HostSession, LicenseStatus, OperandArgs,
    },
    report::HEADER_LINES,
};

#[derive(Debug, Default)]
pub struct MemoryState {
    pub settings: SettingsBlob,
    /// Settings in effect at the last `apply_and_wait`.
    pub computed_with: Option<SettingsBlob>,
    pub report: String,
    pub compute_error: Option<String>,
    /// Settings stage at which the host refuses the file it is handed.
    pub settings_error: Option<SettingsStage>,
    pub results: Option<Vec<f64>>,
    pub analyses_created: usize,
    /// Every file path handed to the analysis, in call order.
    pub touched_paths: Vec<PathBuf>,
}

pub struct MemoryHost {
    pub reachable: bool,
    pub license: LicenseStatus,
    pub mode: HostMode,
    pub args: OperandArgs,
    pub capacity: usize,
    samples_dir: PathBuf,
    state: Rc<RefCell<MemoryState>>,
}

/// Render extents the way the footprint analysis lays out its text output.
pub fn footprint_report(extents: [f64; 4]) -> String {
    let mut out = String::new();
    out.push_str("Listing of Footprint Diagram Data\n\n");
    out.push_str("File : memory\nTitle: \nDate : \n\n");
    out.push_str("Surface: IMA\n");
    out.push_str("Ray X/Y extents, lens units:\n");
    debug_assert_eq!(out.lines().count(), HEADER_LINES);
    let labels = ["X-Min", "X-Max", "Y-Min", "Y-Max"];
    for (label, v) in labels.iter().zip(extents) {
        out.push_str(&format!("{} : {:E}\n", label, v));
    }
    out
}

impl MemoryHost {
    pub fn new(samples_dir: impl Into<PathBuf>) -> Self {
        let state = MemoryState {
            report: footprint_report([0.0; 4]),
            ..Default::default()
        };
        Self {
            reachable: true,
            license: LicenseStatus::valid("in-memory"),
            mode: HostMode::Operand,
            args: OperandArgs::default(),
            capacity: 4,
            samples_dir: samples_dir.into(),
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with_settings(self, settings: SettingsBlob) -> Self {
        self.state.borrow_mut().settings = settings;
        self
    }

    pub fn with_report(self, report: impl Into<String>) -> Self {
        self.state.borrow_mut().report = report.into();
        self
    }

    pub fn with_compute_error(self, message: impl Into<String>) -> Self {
        self.state.borrow_mut().compute_error = Some(message.into());
        self
    }

    pub fn with_settings_error(self, stage: SettingsStage) -> Self {
        self.state.borrow_mut().settings_error = Some(stage);
        self
    }

    pub fn state(&self) -> Ref<'_, MemoryState> {
        self.state.borrow()
    }
}

pub struct MemoryAnalysis {
    state: Rc<RefCell<MemoryState>>,
    computed: bool,
}

fn settings_error(stage: SettingsStage, path: &Path, err: impl ToString) -> OperandError {
    OperandError::Settings {
        stage,
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

impl MemoryAnalysis {
    /// Record `path` and fail if the host was told to refuse this stage.
    fn touch(&self, stage: SettingsStage, path: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.touched_paths.push(path.to_path_buf());
        match state.settings_error {
            Some(refused) if refused == stage => {
                Err(settings_error(stage, path, "host refused the settings file"))
            }
            _ => Ok(()),
        }
    }
}

impl Analysis for MemoryAnalysis {
    fn save_settings(&mut self, path: &Path) -> Result<()> {
        self.touch(SettingsStage::Export, path)?;
        self.state
            .borrow()
            .settings
            .write(path)
            .map_err(|e| settings_error(SettingsStage::Export, path, e))
    }

    fn modify_settings(&mut self, path: &Path, key: &str, value: &str) -> Result<bool> {
        self.touch(SettingsStage::Patch, path)?;
        settings::patch_file(path, key, value)
            .map_err(|e| settings_error(SettingsStage::Patch, path, e))
    }

    fn load_settings(&mut self, path: &Path) -> Result<()> {
        self.touch(SettingsStage::Reload, path)?;
        let settings =
            SettingsBlob::read(path).map_err(|e| settings_error(SettingsStage::Reload, path, e))?;
        self.state.borrow_mut().settings = settings;
        Ok(())
    }

    fn apply_and_wait(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(msg) = &state.compute_error {
            return Err(OperandError::Compute(msg.clone()));
        }
        let snapshot = state.settings.clone();
        state.computed_with = Some(snapshot);
        self.computed = true;
        Ok(())
    }

    fn export_text(&mut self, path: &Path) -> Result<()> {
        if !self.computed {
            return Err(OperandError::Compute("analysis has no results yet".into()));
        }
        let mut state = self.state.borrow_mut();
        state.touched_paths.push(path.to_path_buf());
        fs::write(path, &state.report)
            .map_err(|e| OperandError::Compute(format!("cannot write {}: {}", path.display(), e)))
    }
}

impl HostSession for MemoryHost {
    type Analysis = MemoryAnalysis;

    fn check_connection(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(OperandError::Connection("in-memory host is offline".into()))
        }
    }

    fn license(&self) -> LicenseStatus {
        self.license.clone()
    }

    fn mode(&self) -> HostMode {
        self.mode
    }

    fn samples_dir(&self) -> PathBuf {
        self.samples_dir.clone()
    }

    fn operand_arguments(&self) -> OperandArgs {
        self.args
    }

    fn result_capacity(&self) -> usize {
        self.capacity
    }

    fn new_analysis(&mut self, _kind: AnalysisKind) -> Result<MemoryAnalysis> {
        self.state.borrow_mut().analyses_created += 1;
        Ok(MemoryAnalysis {
            state: Rc::clone(&self.state),
            computed: false,
        })
    }

    fn write_results(&mut self, data: &[f64]) -> Result<()> {
        self.state.borrow_mut().results = Some(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report;

    #[test]
    fn canned_report_parses() {
        let text = footprint_report([-1.5, 2.0, 0.001234, 89.0]);
        let v = parse_report(text.as_bytes()).unwrap();
        assert_eq!(v.to_array(), [-1.5, 2.0, 0.001234, 89.0]);
    }

    #[test]
    fn export_before_compute_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MemoryHost::new(dir.path());
        let mut analysis = host.new_analysis(AnalysisKind::Footprint).unwrap();
        let err = analysis.export_text(&dir.path().join("r.txt")).unwrap_err();
        assert!(matches!(err, OperandError::Compute(_)));
    }

    #[test]
    fn refused_stage_only_fails_that_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MemoryHost::new(dir.path())
            .with_settings(SettingsBlob::from_pairs([("A", "1")]))
            .with_settings_error(SettingsStage::Reload);
        let mut analysis = host.new_analysis(AnalysisKind::Footprint).unwrap();
        let path = dir.path().join("s.cfg");
        analysis.save_settings(&path).unwrap();
        assert!(analysis.modify_settings(&path, "A", "2").unwrap());
        let err = analysis.load_settings(&path).unwrap_err();
        assert!(matches!(err, OperandError::Settings { stage: SettingsStage::Reload, .. }));
        assert_eq!(host.state().settings.get("A"), Some("1"));
    }
}
