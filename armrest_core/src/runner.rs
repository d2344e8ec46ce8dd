//! The steady-state sampling loop.
//!
//! Read faults after startup are logged and the iteration skipped; only
//! zeroing and sink failures end the run early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use armrest_traits::AnalogFrontEnd;
use eyre::WrapErr;

use crate::emitter::RecordSink;
use crate::error::{ArmrestError, Result};
use crate::pipeline::ArmrestCore;
use crate::status::StepStatus;

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Stop after this many iterations; `None` runs until shutdown.
    pub max_iterations: Option<u64>,
    /// Optional pause between iterations; `None` loops as fast as possible.
    pub pace: Option<Duration>,
    /// Log every n-th read fault (the first is always logged).
    pub fault_log_every: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            max_iterations: None,
            pace: None,
            fault_log_every: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub emitted: u64,
    pub read_faults: u64,
}

fn io_err(e: std::io::Error) -> eyre::Report {
    eyre::Report::new(ArmrestError::Io(e.to_string()))
}

/// Zero the rig, write the header, then process samples until `shutdown`
/// is raised or the iteration cap is reached.
pub fn run<A, S>(
    core: &mut ArmrestCore<A>,
    mut sink: S,
    shutdown: &AtomicBool,
    params: RunParams,
) -> Result<RunSummary>
where
    A: AnalogFrontEnd,
    S: RecordSink,
{
    core.begin()?;
    sink.header().map_err(io_err).wrap_err("writing header")?;

    let every = params.fault_log_every.max(1);
    let mut summary = RunSummary::default();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if params.max_iterations.is_some_and(|max| summary.iterations >= max) {
            break;
        }
        summary.iterations += 1;

        match core.step() {
            Ok(StepStatus::Emitted(frame)) => {
                sink.record(&frame)
                    .map_err(io_err)
                    .wrap_err("writing record")?;
                summary.emitted += 1;
            }
            Ok(StepStatus::Held(_)) => {}
            Err(e) => {
                summary.read_faults += 1;
                if summary.read_faults == 1 || summary.read_faults % every == 0 {
                    tracing::warn!(
                        error = %format!("{e:#}"),
                        read_faults = summary.read_faults,
                        "sensor read failed; iteration skipped"
                    );
                }
            }
        }

        if let Some(d) = params.pace {
            core.clock.sleep(d);
        }
    }

    tracing::info!(
        iterations = summary.iterations,
        emitted = summary.emitted,
        read_faults = summary.read_faults,
        "sampling loop stopped"
    );
    Ok(summary)
}
