//! Gantt timeline model.
//!
//! A timeline is the set of slices reconstructed from a finished event
//! trace. Slices on the CPU lane (user code, OS overhead, idle) partition
//! `[0, total_time]`; slices on process lanes (IO bursts, admission
//! latency) run alongside them.
//!
//! # Reference
//! Stallings (2018), "Operating Systems: Internals and Design Principles", Ch. 9

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ProcessId, Time};

/// Where a slice is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// The single CPU resource.
    Cpu,
    /// The subject process's own lane (work that does not hold the CPU).
    Process,
}

/// What a slice represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SliceKind {
    /// User code of a process.
    Cpu,
    /// IO burst.
    Io,
    /// OS work: admission, context switch, or termination.
    OsOverhead,
    /// Nothing to run.
    Idle,
}

/// One interval of the Gantt chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttSlice {
    /// Subject process; `None` for idle time.
    pub process: Option<ProcessId>,
    /// Start time (inclusive).
    pub start: Time,
    /// End time (exclusive, > start).
    pub end: Time,
    /// Slice kind.
    pub kind: SliceKind,
    /// Lane the slice belongs to.
    pub lane: Lane,
}

impl GanttSlice {
    /// User-code slice on the CPU.
    pub fn cpu(process: ProcessId, start: Time, end: Time) -> Self {
        Self {
            process: Some(process),
            start,
            end,
            kind: SliceKind::Cpu,
            lane: Lane::Cpu,
        }
    }

    /// OS overhead on the CPU on behalf of `process`.
    pub fn os(process: ProcessId, start: Time, end: Time) -> Self {
        Self {
            process: Some(process),
            start,
            end,
            kind: SliceKind::OsOverhead,
            lane: Lane::Cpu,
        }
    }

    /// Idle CPU.
    pub fn idle(start: Time, end: Time) -> Self {
        Self {
            process: None,
            start,
            end,
            kind: SliceKind::Idle,
            lane: Lane::Cpu,
        }
    }

    /// IO burst on the process lane.
    pub fn io(process: ProcessId, start: Time, end: Time) -> Self {
        Self {
            process: Some(process),
            start,
            end,
            kind: SliceKind::Io,
            lane: Lane::Process,
        }
    }

    /// Admission latency on the process lane.
    pub fn admission(process: ProcessId, start: Time, end: Time) -> Self {
        Self {
            process: Some(process),
            start,
            end,
            kind: SliceKind::OsOverhead,
            lane: Lane::Process,
        }
    }

    /// Duration (end - start).
    #[inline]
    pub fn duration(&self) -> Time {
        self.end - self.start
    }

    /// Whether this slice occupies the CPU timeline.
    #[inline]
    pub fn on_cpu(&self) -> bool {
        self.lane == Lane::Cpu
    }

    /// Whether two slices share any instant.
    #[inline]
    pub fn overlaps(&self, other: &GanttSlice) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A timeline consistency problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Time at which the problem was detected.
    pub at: Time,
    /// Human-readable description.
    pub message: String,
}

/// Classification of timeline violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two CPU-lane slices share an instant.
    Overlap,
    /// CPU-lane durations do not add up to the total time.
    DurationMismatch,
    /// A slice was opened while another was still open, or never closed.
    UnbalancedTrace,
    /// A slice with end ≤ start.
    EmptySlice,
}

impl Violation {
    /// Creates a violation.
    pub fn new(violation_type: ViolationType, at: Time, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            at,
            message: message.into(),
        }
    }
}

/// A reconstructed Gantt chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// All slices, CPU lane first, each lane ordered by start time.
    pub slices: Vec<GanttSlice>,
    /// Consistency problems found while building.
    pub violations: Vec<Violation>,
    /// Final simulated time.
    pub total_time: Time,
}

impl Timeline {
    /// Creates an empty timeline ending at `total_time`.
    pub fn new(total_time: Time) -> Self {
        Self {
            slices: Vec::new(),
            violations: Vec::new(),
            total_time,
        }
    }

    /// Adds a slice.
    pub fn add_slice(&mut self, slice: GanttSlice) {
        self.slices.push(slice);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the timeline passed validation.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Final simulated time.
    pub fn total_time(&self) -> Time {
        self.total_time
    }

    /// Slices on the CPU lane.
    pub fn cpu_slices(&self) -> impl Iterator<Item = &GanttSlice> {
        self.slices.iter().filter(|s| s.on_cpu())
    }

    /// All slices (any lane) for a process.
    pub fn slices_for_process(&self, process: ProcessId) -> Vec<&GanttSlice> {
        self.slices
            .iter()
            .filter(|s| s.process == Some(process))
            .collect()
    }

    /// CPU-lane time per slice kind.
    pub fn time_by_kind(&self) -> BTreeMap<SliceKind, Time> {
        let mut totals = BTreeMap::new();
        for slice in self.cpu_slices() {
            *totals.entry(slice.kind).or_insert(0) += slice.duration();
        }
        totals
    }

    /// Sum of CPU-lane slice durations.
    pub fn cpu_lane_time(&self) -> Time {
        self.cpu_slices().map(GanttSlice::duration).sum()
    }

    /// Process ids in the order they first held the CPU.
    pub fn run_order(&self) -> Vec<ProcessId> {
        let mut order: Vec<ProcessId> = Vec::new();
        for slice in self.cpu_slices().filter(|s| s.kind == SliceKind::Cpu) {
            if let Some(p) = slice.process {
                if order.last() != Some(&p) {
                    order.push(p);
                }
            }
        }
        order
    }

    /// Number of slices.
    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }
}
