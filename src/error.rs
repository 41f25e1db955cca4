//! Operand errors, one kind per stage of an invocation.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OperandError>;

#[derive(Debug, Error)]
pub enum OperandError {
    /// The host could not be reached at all.
    #[error("host connection failed: {0}")]
    Connection(String),

    /// The host answered but is not in a state that allows an operand to run.
    #[error("host not ready: {0}")]
    HostState(String),

    #[error("settings {stage} failed for {}: {message}", path.display())]
    Settings {
        stage: SettingsStage,
        path: PathBuf,
        message: String,
    },

    #[error("analysis computation failed: {0}")]
    Compute(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsStage {
    Export,
    Patch,
    Reload,
}

impl std::fmt::Display for SettingsStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SettingsStage::Export => "export",
            SettingsStage::Patch => "patch",
            SettingsStage::Reload => "reload",
        };
        f.write_str(s)
    }
}

/// Result report failures. Line numbers are 1-based positions in the report.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot open report {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read report: {0}")]
    Read(#[source] io::Error),

    #[error("report ended after {found} lines, expected at least {expected}")]
    Truncated { found: usize, expected: usize },

    #[error("line {line} ({field}) has no numeric value: {text:?}")]
    NoNumber {
        line: usize,
        field: &'static str,
        text: String,
    },

    #[error("line {line} ({field}) has invalid number {literal:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        literal: String,
    },
}

impl ParseError {
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::NoNumber { line, .. } | ParseError::InvalidNumber { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}
