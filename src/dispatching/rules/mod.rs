//! Built-in scheduling rules.
//!
//! | Rule | Preemptive | Selects | Ties |
//! |------|-----------|---------|------|
//! | FCFS | no | earliest arrival | READY entry order |
//! | SJF/SPN | no | least total remaining service | arrival order |
//! | SRTF | yes | least remaining in current burst | READY entry order |
//! | RR | by quantum | head of READY queue | FIFO |
//! | PRIORITY | optional | highest (aged) priority | READY entry order |
//!
//! # References
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 5.3
//! - Stallings (2018), "Operating Systems: Internals and Design Principles", Ch. 9.2

use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::{RunningProcess, SchedulingStrategy};
use crate::models::{Aging, Process, ProcessId, Time};

/// Returns the id of the process with the smallest key.
fn pick_min<K: Ord>(ready: &[&Process], key: impl Fn(&Process) -> K) -> Option<ProcessId> {
    ready.iter().min_by_key(|p| key(p)).map(|p| p.id)
}

// ======================== Non-preemptive ========================

/// First Come, First Served.
///
/// Runs processes in order of arrival time. A process coming back from
/// IO keeps its original arrival time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcfs;

impl SchedulingStrategy for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn select_next(&mut self, ready: &[&Process], _now: Time) -> Option<ProcessId> {
        pick_min(ready, |p| (p.arrival, p.ready_seq))
    }
}

/// Shortest Process Next (SJF).
///
/// Picks the process with the least total CPU service left across all
/// its remaining bursts. Never preempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spn;

impl SchedulingStrategy for Spn {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn select_next(&mut self, ready: &[&Process], _now: Time) -> Option<ProcessId> {
        pick_min(ready, |p| (p.remaining_service, p.arrival, p.ready_seq))
    }
}

// ======================== Preemptive ========================

/// Shortest Remaining Time First.
///
/// Compares the time left in the current burst only. A candidate with
/// equal remaining time never displaces the incumbent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Srtf;

impl SchedulingStrategy for Srtf {
    fn name(&self) -> &'static str {
        "SRTF"
    }

    fn select_next(&mut self, ready: &[&Process], _now: Time) -> Option<ProcessId> {
        pick_min(ready, |p| (p.remaining_in_burst, p.ready_seq))
    }

    fn should_preempt(&self, running: &RunningProcess<'_>, candidate: &Process, now: Time) -> bool {
        candidate.remaining_in_burst < running.remaining_in_burst(now)
    }
}

/// Round Robin.
///
/// Serves the READY queue in FIFO rotation. Each READY entry draws a
/// ticket from the rule's own counter and the lowest ticket runs next.
/// The engine caps each grant at the quantum and requeues an unfinished
/// process at the tail.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    quantum: Time,
    tickets: BTreeMap<ProcessId, u64>,
    next_ticket: u64,
}

impl RoundRobin {
    /// Creates a Round Robin rule.
    pub fn new(quantum: Time) -> Self {
        Self {
            quantum,
            tickets: BTreeMap::new(),
            next_ticket: 0,
        }
    }

    /// Processes currently holding a queue ticket.
    pub fn queued(&self) -> usize {
        self.tickets.len()
    }
}

impl SchedulingStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn on_become_ready(&mut self, process: &Process, _now: Time) {
        self.tickets.insert(process.id, self.next_ticket);
        self.next_ticket += 1;
    }

    fn select_next(&mut self, ready: &[&Process], _now: Time) -> Option<ProcessId> {
        // Processes never announced through a hook fall back to READY entry order.
        let chosen = pick_min(ready, |p| {
            (
                self.tickets.get(&p.id).copied().unwrap_or(u64::MAX),
                p.ready_seq,
            )
        })?;
        self.tickets.remove(&chosen);
        Some(chosen)
    }

    fn quantum(&self) -> Option<Time> {
        Some(self.quantum)
    }

    fn reset(&mut self) {
        self.tickets.clear();
        self.next_ticket = 0;
    }
}

/// External priority (higher number wins).
///
/// In preemptive mode a READY process interrupts the runner only when its
/// effective priority is strictly greater. With aging enabled, a waiting
/// process gains `increment` for every full `threshold` ticks in READY.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityRule {
    preemptive: bool,
    aging: Option<Aging>,
}

impl PriorityRule {
    /// Creates a priority rule.
    pub fn new(preemptive: bool, aging: Option<Aging>) -> Self {
        Self { preemptive, aging }
    }

    /// Priority of `process` at `now`, including aging.
    pub fn effective_priority(&self, process: &Process, now: Time) -> i32 {
        let bonus = match self.aging {
            Some(aging) if aging.threshold > 0 => {
                let steps = process.waited(now) / aging.threshold;
                i32::try_from(steps)
                    .unwrap_or(i32::MAX)
                    .saturating_mul(aging.increment)
            }
            _ => 0,
        };
        process.priority.saturating_add(bonus)
    }
}

impl SchedulingStrategy for PriorityRule {
    fn name(&self) -> &'static str {
        "PRIORITY"
    }

    fn select_next(&mut self, ready: &[&Process], now: Time) -> Option<ProcessId> {
        pick_min(ready, |p| (Reverse(self.effective_priority(p, now)), p.ready_seq))
    }

    fn should_preempt(&self, running: &RunningProcess<'_>, candidate: &Process, now: Time) -> bool {
        self.preemptive
            && self.effective_priority(candidate, now)
                > self.effective_priority(running.process, now)
    }
}
