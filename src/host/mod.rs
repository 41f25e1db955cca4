//! Host session interface: the application that owns analyses and consumes
//! operand results.
//!
//! The engine only ever talks to a host through these traits, so the same
//! invocation logic runs against a directory-backed host from the CLI or an
//! in-memory host in tests.

use std::path::{Path, PathBuf};

use crate::error::Result;

pub mod directory;
pub mod memory;
pub mod settings;

pub use directory::DirectoryHost;
pub use memory::MemoryHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    Operand,
    Standalone,
    Extension,
    Plugin,
}

impl HostMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operand" => Some(Self::Operand),
            "standalone" => Some(Self::Standalone),
            "extension" => Some(Self::Extension),
            "plugin" => Some(Self::Plugin),
            _ => None,
        }
    }
}

impl std::fmt::Display for HostMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HostMode::Operand => "Operand",
            HostMode::Standalone => "Standalone",
            HostMode::Extension => "Extension",
            HostMode::Plugin => "Plugin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseStatus {
    pub valid: bool,
    pub status: String,
}

impl LicenseStatus {
    pub fn valid(status: impl Into<String>) -> Self {
        Self { valid: true, status: status.into() }
    }

    pub fn invalid(status: impl Into<String>) -> Self {
        Self { valid: false, status: status.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Footprint,
}

impl AnalysisKind {
    /// Stem used for files the host keeps for this kind of analysis.
    pub fn file_stem(self) -> &'static str {
        match self {
            AnalysisKind::Footprint => "footprint",
        }
    }
}

/// The four scalar arguments the host passes to a user operand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OperandArgs {
    pub hx: f64,
    pub hy: f64,
    pub px: f64,
    pub py: f64,
}

/// A single analysis living inside the host.
///
/// Settings move in and out through files only; the layout of those files is
/// the host's business.
pub trait Analysis {
    fn save_settings(&mut self, path: &Path) -> Result<()>;

    /// Set `key` to `value` inside the settings file at `path`.
    /// Returns `Ok(false)` when the host does not know the key.
    fn modify_settings(&mut self, path: &Path, key: &str, value: &str) -> Result<bool>;

    fn load_settings(&mut self, path: &Path) -> Result<()>;

    /// Recompute with the current settings, blocking until the host is done.
    fn apply_and_wait(&mut self) -> Result<()>;

    /// Render the last computed results as a text report at `path`.
    fn export_text(&mut self, path: &Path) -> Result<()>;
}

pub trait HostSession {
    type Analysis: Analysis;

    /// Fails with [`OperandError::Connection`](crate::error::OperandError)
    /// when the host cannot be reached.
    fn check_connection(&self) -> Result<()> {
        Ok(())
    }

    fn license(&self) -> LicenseStatus;
    fn mode(&self) -> HostMode;
    fn samples_dir(&self) -> PathBuf;
    fn operand_arguments(&self) -> OperandArgs;

    /// Number of doubles the host's result slot holds.
    fn result_capacity(&self) -> usize;

    fn new_analysis(&mut self, kind: AnalysisKind) -> Result<Self::Analysis>;

    fn write_results(&mut self, data: &[f64]) -> Result<()>;
}
