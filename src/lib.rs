//! CPU process scheduling simulator for the U-Engine ecosystem.
//!
//! Runs a batch of processes (arrival time, CPU/IO burst pattern, priority)
//! through a single simulated CPU under a chosen scheduling policy and
//! produces a deterministic event trace, a Gantt timeline, and
//! turnaround / waiting / CPU-utilisation metrics.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `ProcessSpec`, `Process`, `Event`,
//!   `RunConfig`, `Policy`, `Workload`, `Timeline`
//! - **`validation`**: Input integrity checks (duplicate names, missing
//!   quantum, negative overheads)
//! - **`dispatching`**: Scheduling strategies (FCFS, SJF, SRTF, RR, Priority)
//! - **`simulation`**: Event queue and discrete-event engine
//! - **`analysis`**: Gantt timeline builder and metrics calculator
//! - **`generator`**: Seeded random workloads
//!
//! # Example
//!
//! ```
//! use u_procsched::models::{Policy, ProcessSpec, RunConfig, Workload};
//! use u_procsched::simulation::simulate;
//!
//! let workload = Workload::new(RunConfig::new(Policy::Srtf))
//!     .with_process(ProcessSpec::new("P1", 0, 10))
//!     .with_process(ProcessSpec::new("P2", 2, 3));
//!
//! let report = simulate(&workload).unwrap();
//! assert_eq!(report.outcome.dispatch_order(), vec!["P1", "P2", "P1"]);
//! assert_eq!(report.metrics.for_process("P2").unwrap().turnaround, 3);
//! ```
//!
//! # References
//!
//! - Silberschatz et al. (2018), "Operating System Concepts"
//! - Stallings (2018), "Operating Systems: Internals and Design Principles"
//! - Banks et al. (2010), "Discrete-Event System Simulation"

pub mod analysis;
pub mod dispatching;
pub mod generator;
pub mod models;
pub mod simulation;
pub mod validation;
