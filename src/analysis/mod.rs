//! Derived views of a finished run.
//!
//! Both builders read an immutable [`SimulationOutcome`](crate::simulation::SimulationOutcome)
//! snapshot and are independent of each other.
//!
//! - [`GanttBuilder`]: non-overlapping, gap-free timeline of the CPU plus
//!   IO / admission slices per process.
//! - [`Metrics`]: turnaround, normalized turnaround, waiting, CPU split.

mod gantt;
mod metrics;

pub use gantt::GanttBuilder;
pub use metrics::{BatchMetrics, CpuUsage, Metrics, MetricsWarning, ProcessMetrics};
