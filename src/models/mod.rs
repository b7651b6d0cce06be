//! CPU scheduling domain models.
//!
//! Provides the data types exchanged between the simulation engine and
//! its collaborators: the workload going in, the event trace and process
//! records coming out, and the Gantt timeline derived from them.
//!
//! # Terminology
//!
//! | Term | Meaning |
//! |------|---------|
//! | TIP | Admission cost between arrival and READY |
//! | TFP | Termination cost after the last CPU burst |
//! | TCP | Context-switch cost charged on every dispatch |
//! | Quantum | Longest contiguous CPU grant under Round Robin |
//! | Burst | One contiguous interval of CPU or IO demand |

mod config;
mod event;
mod process;
mod timeline;

pub use config::{Aging, Policy, RunConfig, UnknownPolicy, Workload};
pub use event::{Event, EventKind, EventOrdering};
pub use process::{Process, ProcessId, ProcessSpec, ProcessState};
pub use timeline::{GanttSlice, Lane, SliceKind, Timeline, Violation, ViolationType};

/// Simulated time in ticks, relative to t = 0.
pub type Time = i64;
