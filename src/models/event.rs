//! Simulation events and their same-instant ordering policy.
//!
//! An event is an immutable, timestamped record of one process state
//! transition. The engine schedules events into its queue and appends
//! them to the run trace as they fire.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ProcessId, ProcessState, Time};

/// Transition kind carried by an [`Event`].
///
/// Declaration order is the final tie-break between kinds that share a
/// rank in an [`EventOrdering`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// RUNNING → DONE: the last CPU burst finished.
    Terminated,
    /// TFP elapsed; the process is closed out and the CPU is released.
    TerminationDone,
    /// RUNNING → BLOCKED: a CPU burst finished and IO begins.
    Blocked,
    /// RUNNING → READY: quantum expiry or preemption by a better candidate.
    Preempted,
    /// BLOCKED → READY: the IO burst finished.
    IoDone,
    /// The process appears in the system (still NEW).
    Arrival,
    /// NEW → READY: TIP elapsed.
    AdmissionDone,
    /// READY → RUNNING: TCP elapsed and the process takes the CPU.
    Dispatch,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 8] = [
        EventKind::Terminated,
        EventKind::TerminationDone,
        EventKind::Blocked,
        EventKind::Preempted,
        EventKind::IoDone,
        EventKind::Arrival,
        EventKind::AdmissionDone,
        EventKind::Dispatch,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Process state this event moves its subject into, if any.
    pub fn target_state(self) -> Option<ProcessState> {
        match self {
            EventKind::Terminated => Some(ProcessState::Done),
            EventKind::Blocked => Some(ProcessState::Blocked),
            EventKind::Preempted | EventKind::IoDone | EventKind::AdmissionDone => {
                Some(ProcessState::Ready)
            }
            EventKind::Dispatch => Some(ProcessState::Running),
            EventKind::Arrival | EventKind::TerminationDone => None,
        }
    }

    /// Whether this kind ends a CPU occupation by a running process.
    pub fn ends_run(self) -> bool {
        matches!(
            self,
            EventKind::Terminated | EventKind::Blocked | EventKind::Preempted
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A timestamped state-transition record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Simulated time at which the transition happens.
    pub time: Time,
    /// Transition kind.
    pub kind: EventKind,
    /// Subject process.
    pub process: ProcessId,
    /// Free-form annotation (e.g. "quantum expired", "remaining 8").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl Event {
    /// Creates an event without annotation.
    pub fn new(time: Time, kind: EventKind, process: ProcessId) -> Self {
        Self {
            time,
            kind,
            process,
            note: String::new(),
        }
    }

    /// Attaches an annotation.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Rank table deciding which event kind goes first at equal timestamps.
///
/// Lower rank = processed earlier. The default is termination-first:
/// a process that finishes or blocks vacates the CPU before anything
/// else at the same instant, and dispatch comes last so the scheduler
/// sees the complete ready set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOrdering {
    ranks: [u8; 8],
}

impl EventOrdering {
    /// Termination-first table (default).
    pub fn termination_first() -> Self {
        let mut ordering = Self { ranks: [0; 8] };
        ordering
            .set(EventKind::Terminated, 1)
            .set(EventKind::TerminationDone, 1)
            .set(EventKind::Blocked, 2)
            .set(EventKind::Preempted, 3)
            .set(EventKind::IoDone, 4)
            .set(EventKind::Arrival, 5)
            .set(EventKind::AdmissionDone, 5)
            .set(EventKind::Dispatch, 6);
        ordering
    }

    /// Legacy table: arrivals and admissions ahead of CPU releases.
    pub fn arrival_first() -> Self {
        Self::termination_first()
            .with_rank(EventKind::Arrival, 0)
            .with_rank(EventKind::AdmissionDone, 0)
    }

    /// Overrides the rank of one kind.
    pub fn with_rank(mut self, kind: EventKind, rank: u8) -> Self {
        self.set(kind, rank);
        self
    }

    fn set(&mut self, kind: EventKind, rank: u8) -> &mut Self {
        self.ranks[kind.index()] = rank;
        self
    }

    /// Rank of a kind.
    #[inline]
    pub fn rank(&self, kind: EventKind) -> u8 {
        self.ranks[kind.index()]
    }
}

impl Default for EventOrdering {
    fn default() -> Self {
        Self::termination_first()
    }
}
