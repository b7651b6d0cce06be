//! Discrete-event CPU scheduling simulation.
//!
//! [`Simulator`] runs a [`Workload`] to completion and returns a
//! [`SimulationOutcome`]; [`simulate`] additionally derives the Gantt
//! timeline and the metrics.
//!
//! # Usage
//!
//! ```
//! use u_procsched::models::{ProcessSpec, RunConfig, Workload};
//! use u_procsched::simulation::simulate;
//!
//! let workload = Workload::new(RunConfig::round_robin(2))
//!     .with_process(ProcessSpec::new("P1", 0, 6));
//!
//! let report = simulate(&workload).unwrap();
//! assert!(report.timeline.is_valid());
//! assert_eq!(report.metrics.for_process("P1").unwrap().completion, 6);
//! ```

mod engine;
mod error;
pub mod queue;

pub use engine::{CpuAccounting, CpuState, SimulationOutcome, Simulator};
pub use error::SimulationError;
pub use queue::EventQueue;

use serde::{Deserialize, Serialize};

use crate::analysis::{GanttBuilder, Metrics};
use crate::models::{Timeline, Workload};

/// A run together with its derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Engine output.
    pub outcome: SimulationOutcome,
    /// Gantt timeline over `[0, end_time]`.
    pub timeline: Timeline,
    /// Per-process and batch metrics.
    pub metrics: Metrics,
}

/// Runs `workload` and builds its timeline and metrics.
pub fn simulate(workload: &Workload) -> Result<SimulationReport, SimulationError> {
    let outcome = Simulator::new(workload)?.run()?;
    let timeline = GanttBuilder::new(&outcome.config).build(&outcome.trace, outcome.end_time);
    let metrics = Metrics::calculate(&outcome.processes, &outcome.accounting);
    Ok(SimulationReport {
        outcome,
        timeline,
        metrics,
    })
}
