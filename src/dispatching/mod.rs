//! Scheduling strategies for the simulated CPU.
//!
//! A strategy decides which READY process gets the CPU next and whether
//! a newly READY process should interrupt the one currently running.
//! The policy set is closed: [`create_strategy`] builds one of the five
//! built-in rules from a [`RunConfig`].
//!
//! # Usage
//!
//! ```
//! use u_procsched::dispatching::create_strategy;
//! use u_procsched::models::RunConfig;
//!
//! let strategy = create_strategy(&RunConfig::round_robin(4)).unwrap();
//! assert_eq!(strategy.name(), "RR");
//! assert_eq!(strategy.quantum(), Some(4));
//! ```
//!
//! # References
//!
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 5.3
//! - Stallings (2018), "Operating Systems: Internals and Design Principles", Ch. 9.2

mod context;
pub mod rules;

pub use context::RunningProcess;

use crate::models::{Policy, Process, ProcessId, RunConfig, Time};
use crate::validation::{ValidationError, ValidationErrorKind};
use std::fmt::Debug;

/// A CPU scheduling policy.
///
/// The engine calls the lifecycle hooks as processes move through their
/// states, asks [`select_next`](Self::select_next) whenever the CPU is
/// free, and asks [`should_preempt`](Self::should_preempt) on every READY
/// transition while a process is running.
pub trait SchedulingStrategy: Send + Debug {
    /// Rule name (e.g., "FCFS", "SRTF").
    fn name(&self) -> &'static str;

    /// A process finished admission and entered READY for the first time.
    fn on_arrival(&mut self, _process: &Process, _now: Time) {}

    /// A process (re-)entered READY.
    fn on_become_ready(&mut self, _process: &Process, _now: Time) {}

    /// Picks the next process to dispatch from the READY set.
    fn select_next(&mut self, ready: &[&Process], now: Time) -> Option<ProcessId>;

    /// Whether `candidate` should take the CPU away from `running`.
    fn should_preempt(
        &self,
        _running: &RunningProcess<'_>,
        _candidate: &Process,
        _now: Time,
    ) -> bool {
        false
    }

    /// Longest contiguous CPU grant, if the policy slices time.
    fn quantum(&self) -> Option<Time> {
        None
    }

    /// Clears any per-run state.
    fn reset(&mut self) {}
}

/// Builds the strategy for a configuration.
///
/// Fails only when Round Robin is selected without a positive quantum.
pub fn create_strategy(
    config: &RunConfig,
) -> Result<Box<dyn SchedulingStrategy>, ValidationError> {
    let strategy: Box<dyn SchedulingStrategy> = match &config.policy {
        Policy::Fcfs => Box::new(rules::Fcfs),
        Policy::Spn => Box::new(rules::Spn),
        Policy::Srtf => Box::new(rules::Srtf),
        Policy::RoundRobin => match config.quantum {
            Some(q) if q > 0 => Box::new(rules::RoundRobin::new(q)),
            _ => {
                return Err(ValidationError::new(
                    ValidationErrorKind::MissingQuantum,
                    "Round Robin requires a positive quantum",
                ))
            }
        },
        Policy::Priority { preemptive, aging } => {
            Box::new(rules::PriorityRule::new(*preemptive, *aging))
        }
    };
    Ok(strategy)
}
