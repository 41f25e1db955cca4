use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "footprint-operand",
    about = "Footprint extents user operand",
    version
)]
pub struct Cli {
    /// Normalized field X (first operand argument).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub hx: f64,

    /// Normalized field Y (second operand argument).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub hy: f64,

    /// Normalized pupil X (third operand argument).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub px: f64,

    /// Normalized pupil Y (fourth operand argument).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub py: f64,

    /// Host samples directory (seed settings and report location).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Shell command that computes the analysis.
    ///
    /// Receives OPERAND_SETTINGS (settings file) and OPERAND_REPORT (report to write).
    #[arg(long = "compute-cmd")]
    pub compute_cmd: Option<String>,

    /// Settings key patched when the guard argument is positive.
    #[arg(long)]
    pub key: Option<String>,

    /// Argument whose positivity enables the patch (hx|hy|px|py).
    #[arg(long = "guard-arg")]
    pub guard_arg: Option<String>,

    /// Argument written as the patched value (hx|hy|px|py).
    #[arg(long = "value-arg")]
    pub value_arg: Option<String>,

    /// Report file name inside the samples directory.
    #[arg(long = "report-name")]
    pub report_name: Option<String>,

    /// Length of the host result slot.
    #[arg(long = "result-length")]
    pub result_length: Option<usize>,

    /// Mode the host reports (operand|standalone|extension|plugin).
    #[arg(long)]
    pub mode: Option<String>,

    /// Also write the result slot to this JSON file.
    #[arg(long = "results-file")]
    pub results_file: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,

    /// Run against an in-memory host that reports the given extents instead of
    /// computing, e.g. `--dry-run=-1,1,-2,2` (X-min,X-max,Y-min,Y-max).
    #[arg(long = "dry-run", value_name = "EXTENTS")]
    pub dry_run: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
