//! Simulation errors.

use crate::models::{EventKind, ProcessId, ProcessState, Time};
use crate::validation::ValidationError;

/// Reasons a run is rejected or aborted.
///
/// `InvalidWorkload` is raised before the event loop starts; every other
/// variant is an invariant violation that aborts the current run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid workload: {}", join(.0))]
    InvalidWorkload(Vec<ValidationError>),

    #[error("t={at}: cannot assign CPU to {requested}, already held by {holder}")]
    CpuOccupied {
        at: Time,
        requested: ProcessId,
        holder: String,
    },

    #[error("event at t={event_time} is earlier than the clock (t={clock})")]
    TimeRegression { clock: Time, event_time: Time },

    #[error("t={at}: {kind} event for {process}, which is already DONE")]
    EventForFinishedProcess {
        at: Time,
        kind: EventKind,
        process: ProcessId,
    },

    #[error("event refers to unknown process {0}")]
    UnknownProcess(ProcessId),

    #[error("t={at}: {process} cannot go from {from} to {to}")]
    UnexpectedState {
        at: Time,
        process: ProcessId,
        from: ProcessState,
        to: ProcessState,
    },

    #[error("event queue drained with {0} process(es) not DONE")]
    ProcessAbandoned(usize),

    #[error("t={at}: overhead for {process} was due to end at t={until}")]
    OverheadMismatch {
        at: Time,
        process: ProcessId,
        until: Time,
    },

    #[error("t={at}: scheduling {delta} ticks ahead overflows the clock")]
    TimeOverflow { at: Time, delta: Time },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
