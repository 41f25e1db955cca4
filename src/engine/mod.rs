//! One operand invocation, start to finish.
//!
//! ```text
//! connect -> new analysis -> conditional patch -> compute -> export report
//!         -> parse -> hand results back
//! ```
//!
//! Every stage returns a typed error and the first failure ends the
//! invocation. Nothing is retried and nothing survives between invocations.

use crate::{
    error::{OperandError, Result},
    host::{Analysis, AnalysisKind, HostMode, HostSession},
    report::{self, RemoveOnDrop, ResultVector, DEFAULT_REPORT_NAME},
};

pub mod compute;
pub mod patch;

pub use compute::compute_and_wait;
pub use patch::{apply_conditional_patch, apply_patch, ArgSlot, FieldPatch, PatchOutcome, PatchPlan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub plan: PatchPlan,
    /// File name of the report inside the host's samples directory.
    pub report_name: String,
}

impl Default for Invocation {
    fn default() -> Self {
        Self {
            plan: PatchPlan::default(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }
}

/// Check that the host may run an operand at all. Must pass before any
/// analysis is touched.
pub fn connect<H: HostSession>(session: &H) -> Result<()> {
    session.check_connection()?;
    let license = session.license();
    if !license.valid {
        return Err(OperandError::HostState(format!(
            "licence not valid for operands: {}",
            license.status
        )));
    }
    let mode = session.mode();
    if mode != HostMode::Operand {
        return Err(OperandError::HostState(format!(
            "started in the wrong mode: expected {}, found {}",
            HostMode::Operand,
            mode
        )));
    }
    tracing::info!(host = %license.status, "connected to host");
    Ok(())
}

/// Patch, compute and parse, without writing anything back to the host.
pub fn evaluate<H: HostSession>(session: &mut H, invocation: &Invocation) -> Result<ResultVector> {
    connect(session)?;

    let args = session.operand_arguments();
    tracing::debug!(hx = args.hx, hy = args.hy, px = args.px, py = args.py, "operand arguments");

    let mut analysis = session.new_analysis(AnalysisKind::Footprint)?;
    apply_conditional_patch(&mut analysis, &invocation.plan, &args)?;
    compute_and_wait(&mut analysis)?;

    let report_path = session.samples_dir().join(&invocation.report_name);
    // Covers a partially written report if the export itself fails.
    let _cleanup = RemoveOnDrop::new(&report_path);
    analysis.export_text(&report_path)?;
    let extents = report::read_report(&report_path)?;
    tracing::info!(
        x_min = extents.x_min,
        x_max = extents.x_max,
        y_min = extents.y_min,
        y_max = extents.y_max,
        "parsed footprint report"
    );
    Ok(extents)
}

/// Lay the extents out in a result slot of `capacity` doubles, zero padded.
pub fn pack_results(extents: ResultVector, capacity: usize) -> Result<Vec<f64>> {
    let values = extents.to_array();
    if capacity < values.len() {
        return Err(OperandError::HostState(format!(
            "result slot holds {} values, need {}",
            capacity,
            values.len()
        )));
    }
    let mut data = vec![0.0; capacity];
    data[..values.len()].copy_from_slice(&values);
    Ok(data)
}

/// Run a full invocation and hand the results back to the host.
pub fn run_operand<H: HostSession>(session: &mut H, invocation: &Invocation) -> Result<ResultVector> {
    let extents = evaluate(session, invocation)?;
    let data = pack_results(extents, session.result_capacity())?;
    session.write_results(&data)?;
    Ok(extents)
}
