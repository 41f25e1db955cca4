use std::time::Instant;

use crate::{error::Result, host::Analysis};

/// Ask the host to recompute with whatever settings are attached and block
/// until it reports completion. No timeout is applied here.
pub fn compute_and_wait<A: Analysis>(analysis: &mut A) -> Result<()> {
    let started = Instant::now();
    analysis.apply_and_wait()?;
    tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "analysis computed");
    Ok(())
}
