//! Gantt timeline reconstruction from an event trace.
//!
//! # Algorithm
//!
//! 1. Walk the trace once, tracking the open CPU occupation.
//! 2. `Dispatch` opens a user slice (preceded by a TCP slice when TCP > 0);
//!    `Terminated` / `Blocked` / `Preempted` close it.
//! 3. `Terminated → TerminationDone` becomes a TFP slice on the CPU;
//!    `Arrival → AdmissionDone` and `Blocked → IoDone` become process-lane
//!    slices. Zero-length intervals produce no slice.
//! 4. Fill every uncovered CPU interval in `[0, total_time]`: stretches
//!    where some process is being admitted become TIP slices, the rest IDLE.
//! 5. Validate: no CPU-lane overlap, CPU-lane durations sum to `total_time`.

use std::collections::BTreeMap;
use tracing::warn;

use crate::models::{
    Event, EventKind, GanttSlice, ProcessId, RunConfig, Time, Timeline, Violation,
    ViolationType,
};

/// Builds a [`Timeline`] from a finished run's trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct GanttBuilder {
    tcp: Time,
}

impl GanttBuilder {
    /// Creates a builder using the run's overhead values.
    pub fn new(config: &RunConfig) -> Self {
        Self { tcp: config.tcp }
    }

    /// Reconstructs the timeline covering `[0, total_time]`.
    pub fn build(&self, trace: &[Event], total_time: Time) -> Timeline {
        let mut timeline = Timeline::new(total_time);
        let mut cpu: Vec<GanttSlice> = Vec::new();
        let mut lanes: Vec<GanttSlice> = Vec::new();
        let mut admissions: Vec<(Time, Time, ProcessId)> = Vec::new();

        let mut open_run: Option<(ProcessId, Time)> = None;
        let mut arrived_at: BTreeMap<ProcessId, Time> = BTreeMap::new();
        let mut blocked_at: BTreeMap<ProcessId, Time> = BTreeMap::new();
        let mut terminated_at: BTreeMap<ProcessId, Time> = BTreeMap::new();

        for event in trace {
            let (t, p) = (event.time, event.process);
            match event.kind {
                EventKind::Arrival => {
                    arrived_at.insert(p, t);
                }
                EventKind::AdmissionDone => {
                    if let Some(start) = arrived_at.remove(&p) {
                        if t > start {
                            lanes.push(GanttSlice::admission(p, start, t));
                            admissions.push((start, t, p));
                        }
                    }
                }
                EventKind::Dispatch => {
                    if let Some((other, start)) = open_run.take() {
                        timeline.add_violation(Violation::new(
                            ViolationType::UnbalancedTrace,
                            t,
                            format!("dispatch of {p} while {other} still holds the CPU"),
                        ));
                        if t > start {
                            cpu.push(GanttSlice::cpu(other, start, t));
                        }
                    }
                    if self.tcp > 0 {
                        cpu.push(GanttSlice::os(p, t - self.tcp, t));
                    }
                    open_run = Some((p, t));
                }
                EventKind::Terminated | EventKind::Blocked | EventKind::Preempted => {
                    match open_run.take() {
                        Some((holder, start)) if holder == p => {
                            if t > start {
                                cpu.push(GanttSlice::cpu(p, start, t));
                            }
                        }
                        other => {
                            open_run = other;
                            timeline.add_violation(Violation::new(
                                ViolationType::UnbalancedTrace,
                                t,
                                format!("{} for {p}, which does not hold the CPU", event.kind),
                            ));
                        }
                    }
                    match event.kind {
                        EventKind::Blocked => {
                            blocked_at.insert(p, t);
                        }
                        EventKind::Terminated => {
                            terminated_at.insert(p, t);
                        }
                        _ => {}
                    }
                }
                EventKind::IoDone => {
                    if let Some(start) = blocked_at.remove(&p) {
                        if t > start {
                            lanes.push(GanttSlice::io(p, start, t));
                        }
                    }
                }
                EventKind::TerminationDone => {
                    if let Some(start) = terminated_at.remove(&p) {
                        if t > start {
                            cpu.push(GanttSlice::os(p, start, t));
                        }
                    }
                }
            }
        }

        if let Some((holder, start)) = open_run {
            timeline.add_violation(Violation::new(
                ViolationType::UnbalancedTrace,
                start,
                format!("{holder} never released the CPU"),
            ));
        }

        cpu.sort_by_key(|s| (s.start, s.end));
        let admitting = merge_intervals(admissions);
        let cpu = fill_gaps(cpu, &admitting, total_time);
        validate_cpu_lane(&cpu, total_time, &mut timeline);

        lanes.sort_by_key(|s| (s.process, s.start));
        timeline.slices = cpu;
        timeline.slices.extend(lanes);

        for v in &timeline.violations {
            warn!(at = v.at, kind = ?v.violation_type, "{}", v.message);
        }
        timeline
    }
}

/// Unions overlapping admission intervals, keeping the earliest process.
fn merge_intervals(mut intervals: Vec<(Time, Time, ProcessId)>) -> Vec<(Time, Time, ProcessId)> {
    intervals.sort();
    let mut merged: Vec<(Time, Time, ProcessId)> = Vec::with_capacity(intervals.len());
    for (start, end, p) in intervals {
        match merged.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end, p)),
        }
    }
    merged
}

/// Fills the gaps of a start-sorted CPU lane.
fn fill_gaps(
    sorted: Vec<GanttSlice>,
    admitting: &[(Time, Time, ProcessId)],
    total_time: Time,
) -> Vec<GanttSlice> {
    let mut filled = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor: Time = 0;
    for slice in sorted {
        if slice.start > cursor {
            cover_gap(&mut filled, cursor, slice.start, admitting);
        }
        cursor = cursor.max(slice.end);
        filled.push(slice);
    }
    if cursor < total_time {
        cover_gap(&mut filled, cursor, total_time, admitting);
    }
    filled
}

/// Splits the free interval `[start, end)` into TIP and IDLE slices.
fn cover_gap(
    out: &mut Vec<GanttSlice>,
    start: Time,
    end: Time,
    admitting: &[(Time, Time, ProcessId)],
) {
    let mut cursor = start;
    for &(a, b, p) in admitting {
        if b <= cursor || a >= end {
            continue;
        }
        if a > cursor {
            out.push(GanttSlice::idle(cursor, a));
        }
        let stop = b.min(end);
        out.push(GanttSlice::os(p, a.max(cursor), stop));
        cursor = stop;
    }
    if cursor < end {
        out.push(GanttSlice::idle(cursor, end));
    }
}

fn validate_cpu_lane(cpu: &[GanttSlice], total_time: Time, timeline: &mut Timeline) {
    for slice in cpu {
        if slice.end <= slice.start {
            timeline.add_violation(Violation::new(
                ViolationType::EmptySlice,
                slice.start,
                format!("slice [{}, {}) is empty", slice.start, slice.end),
            ));
        }
    }

    for pair in cpu.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            timeline.add_violation(Violation::new(
                ViolationType::Overlap,
                pair[1].start,
                format!(
                    "[{}, {}) overlaps [{}, {})",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                ),
            ));
        }
    }

    let covered: Time = cpu.iter().map(GanttSlice::duration).sum();
    if covered != total_time {
        timeline.add_violation(Violation::new(
            ViolationType::DurationMismatch,
            total_time,
            format!("CPU lane covers {covered} but the run lasted {total_time}"),
        ));
    }
}
