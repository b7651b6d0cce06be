//! Process model and lifecycle state machine.
//!
//! A process alternates CPU bursts and IO bursts until its last CPU burst
//! completes. The declared shape (`ProcessSpec`) is immutable input; the
//! runtime record (`Process`) carries the mutable bookkeeping the engine
//! updates on every transition.
//!
//! # State Machine
//!
//! ```text
//!   NEW ──AdmissionDone──▶ READY ──Dispatch──▶ RUNNING ──Terminated──▶ DONE
//!                           ▲  ▲                 │  │
//!                           │  └───Preempted─────┘  │
//!                           └──IoDone── BLOCKED ◀───┘ Blocked
//! ```
//!
//! # Reference
//! Silberschatz et al. (2018), "Operating System Concepts", Ch. 3.1

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Time;

/// Arena index of a process in the engine's process table.
///
/// The table is sorted by process name, so `ProcessId` order is the
/// lexicographic name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a simulated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    /// Arrived, admission (TIP) in progress.
    New,
    /// Waiting for the CPU.
    Ready,
    /// Holding the CPU.
    Running,
    /// Performing an IO burst.
    Blocked,
    /// All CPU bursts completed.
    Done,
}

impl ProcessState {
    /// Whether `self → next` is a legal lifecycle transition.
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (New, Ready)
                | (Ready, Running)
                | (Running, Blocked)
                | (Running, Ready)
                | (Running, Done)
                | (Blocked, Ready)
        )
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(self) -> bool {
        self == ProcessState::Done
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Declared shape of one job in a workload.
///
/// A process with `bursts` CPU bursts performs `bursts - 1` IO bursts,
/// one between each pair of consecutive CPU bursts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Unique process name.
    pub name: String,
    /// Arrival time.
    pub arrival: Time,
    /// Number of CPU bursts (must be ≥ 1).
    pub bursts: u32,
    /// Duration of each CPU burst.
    pub cpu_burst: Time,
    /// Duration of each IO burst.
    #[serde(default)]
    pub io_burst: Time,
    /// External priority (higher = more important).
    #[serde(default)]
    pub priority: i32,
}

impl ProcessSpec {
    /// Creates a single-burst process with no IO.
    pub fn new(name: impl Into<String>, arrival: Time, cpu_burst: Time) -> Self {
        Self {
            name: name.into(),
            arrival,
            bursts: 1,
            cpu_burst,
            io_burst: 0,
            priority: 0,
        }
    }

    /// Sets the CPU burst count and the IO burst between them.
    pub fn with_bursts(mut self, bursts: u32, io_burst: Time) -> Self {
        self.bursts = bursts;
        self.io_burst = io_burst;
        self
    }

    /// Sets the external priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Total CPU demand: bursts × burst duration.
    pub fn total_service(&self) -> Time {
        Time::from(self.bursts).saturating_mul(self.cpu_burst)
    }
}

/// Runtime record of one simulated process.
///
/// Identity fields mirror the [`ProcessSpec`]; the remaining fields are
/// owned by the simulation engine and only change at state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Arena index.
    pub id: ProcessId,
    /// Unique process name.
    pub name: String,
    /// Arrival time.
    pub arrival: Time,
    /// Declared CPU burst count.
    pub bursts: u32,
    /// Declared CPU burst duration.
    pub cpu_burst: Time,
    /// Declared IO burst duration.
    pub io_burst: Time,
    /// External priority.
    pub priority: i32,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// Time left in the current CPU burst. Saved exactly on preemption.
    pub remaining_in_burst: Time,
    /// CPU time left across all remaining bursts.
    pub remaining_service: Time,
    /// CPU bursts fully completed.
    pub completed_bursts: u32,
    /// CPU time actually received so far.
    pub service_received: Time,
    /// Last time the process entered READY.
    pub last_ready_at: Option<Time>,
    /// FIFO ticket taken on each entry into READY (lower = earlier).
    pub ready_seq: u64,
    /// End of the TFP closeout, once DONE.
    pub completion: Option<Time>,
}

impl Process {
    /// Builds the initial (NEW) runtime record for a spec.
    pub fn from_spec(id: ProcessId, spec: &ProcessSpec) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            arrival: spec.arrival,
            bursts: spec.bursts,
            cpu_burst: spec.cpu_burst,
            io_burst: spec.io_burst,
            priority: spec.priority,
            state: ProcessState::New,
            remaining_in_burst: spec.cpu_burst,
            remaining_service: spec.total_service(),
            completed_bursts: 0,
            service_received: 0,
            last_ready_at: None,
            ready_seq: 0,
            completion: None,
        }
    }

    /// Total declared CPU demand.
    pub fn total_service(&self) -> Time {
        Time::from(self.bursts).saturating_mul(self.cpu_burst)
    }

    /// Whether the current burst is the final one.
    pub fn on_last_burst(&self) -> bool {
        self.completed_bursts + 1 >= self.bursts
    }

    /// CPU bursts not yet completed (including the current one).
    pub fn bursts_left(&self) -> u32 {
        self.bursts.saturating_sub(self.completed_bursts)
    }

    /// How long the process has been waiting in READY at `now`.
    pub fn waited(&self, now: Time) -> Time {
        match (self.state, self.last_ready_at) {
            (ProcessState::Ready, Some(since)) => (now - since).max(0),
            _ => 0,
        }
    }

    /// Moves to `next`, rejecting transitions the lifecycle forbids.
    pub fn transition(&mut self, next: ProcessState) -> Result<ProcessState, ProcessState> {
        if !self.state.can_transition_to(next) {
            return Err(self.state);
        }
        let prev = self.state;
        self.state = next;
        Ok(prev)
    }

    /// Records `ran` ticks of CPU against the current burst.
    ///
    /// Called when the process leaves RUNNING (burst end or preemption).
    pub fn consume(&mut self, ran: Time) {
        let ran = ran.clamp(0, self.remaining_in_burst);
        self.remaining_in_burst -= ran;
        self.remaining_service -= ran;
        self.service_received += ran;
    }

    /// Marks the current burst as finished and arms the next one.
    pub fn finish_burst(&mut self) {
        self.completed_bursts += 1;
        self.remaining_in_burst = if self.completed_bursts < self.bursts {
            self.cpu_burst
        } else {
            0
        };
    }
}
