//! Run configuration and workload input.
//!
//! A [`Workload`] is the complete, fixed batch handed to the engine by an
//! external ingestion layer: the process specs plus a [`RunConfig`]
//! selecting the policy and the OS overhead costs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{EventOrdering, ProcessSpec, Time};

/// Priority aging parameters.
///
/// A READY process gains `increment` effective priority for every full
/// `threshold` ticks it has been waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aging {
    /// Waiting time per aging step (must be > 0).
    pub threshold: Time,
    /// Priority gained per step.
    pub increment: i32,
}

impl Aging {
    /// Creates aging parameters.
    pub fn new(threshold: Time, increment: i32) -> Self {
        Self {
            threshold,
            increment,
        }
    }
}

/// Scheduling policy selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// First come, first served.
    Fcfs,
    /// Shortest job (process) next, non-preemptive.
    Spn,
    /// Shortest remaining time first, preemptive.
    Srtf,
    /// Round Robin with [`RunConfig::quantum`].
    RoundRobin,
    /// External priority, optionally preemptive and with aging.
    Priority {
        /// Re-check on every READY transition.
        #[serde(default)]
        preemptive: bool,
        /// Starvation bound; off by default.
        #[serde(default)]
        aging: Option<Aging>,
    },
}

impl Policy {
    /// Non-preemptive priority without aging.
    pub fn priority() -> Self {
        Policy::Priority {
            preemptive: false,
            aging: None,
        }
    }

    /// Preemptive priority without aging.
    pub fn preemptive_priority() -> Self {
        Policy::Priority {
            preemptive: true,
            aging: None,
        }
    }

    /// Short policy name (the factory key).
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Fcfs => "fcfs",
            Policy::Spn => "sjf",
            Policy::Srtf => "srtf",
            Policy::RoundRobin => "rr",
            Policy::Priority {
                preemptive: false, ..
            } => "priority",
            Policy::Priority {
                preemptive: true, ..
            } => "priority-preemptive",
        }
    }

    /// Whether the policy needs a quantum.
    pub fn requires_quantum(&self) -> bool {
        matches!(self, Policy::RoundRobin)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scheduling policy '{0}'")]
pub struct UnknownPolicy(pub String);

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fcfs" | "fifo" => Ok(Policy::Fcfs),
            "sjf" | "spn" => Ok(Policy::Spn),
            "srtf" | "srt" => Ok(Policy::Srtf),
            "rr" | "round-robin" | "roundrobin" => Ok(Policy::RoundRobin),
            "priority" => Ok(Policy::priority()),
            "priority-preemptive" | "preemptive-priority" => Ok(Policy::preemptive_priority()),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Policy selection and OS overhead costs for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Scheduling policy.
    pub policy: Policy,
    /// Admission cost: arrival → READY.
    #[serde(default)]
    pub tip: Time,
    /// Termination cost: last burst end → closeout.
    #[serde(default)]
    pub tfp: Time,
    /// Context-switch cost, charged on every dispatch.
    #[serde(default)]
    pub tcp: Time,
    /// Round Robin quantum.
    #[serde(default)]
    pub quantum: Option<Time>,
    /// Same-instant event ordering.
    #[serde(default)]
    pub ordering: EventOrdering,
}

impl RunConfig {
    /// Zero-overhead configuration for a policy.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            tip: 0,
            tfp: 0,
            tcp: 0,
            quantum: None,
            ordering: EventOrdering::default(),
        }
    }

    /// Round Robin with the given quantum.
    pub fn round_robin(quantum: Time) -> Self {
        Self::new(Policy::RoundRobin).with_quantum(quantum)
    }

    /// Sets the admission cost.
    pub fn with_tip(mut self, tip: Time) -> Self {
        self.tip = tip;
        self
    }

    /// Sets the termination cost.
    pub fn with_tfp(mut self, tfp: Time) -> Self {
        self.tfp = tfp;
        self
    }

    /// Sets the context-switch cost.
    pub fn with_tcp(mut self, tcp: Time) -> Self {
        self.tcp = tcp;
        self
    }

    /// Sets all three overhead costs.
    pub fn with_overheads(self, tip: Time, tfp: Time, tcp: Time) -> Self {
        self.with_tip(tip).with_tfp(tfp).with_tcp(tcp)
    }

    /// Sets the quantum.
    pub fn with_quantum(mut self, quantum: Time) -> Self {
        self.quantum = Some(quantum);
        self
    }

    /// Sets the event ordering table.
    pub fn with_ordering(mut self, ordering: EventOrdering) -> Self {
        self.ordering = ordering;
        self
    }
}

/// A fixed batch of processes plus its run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// Processes to simulate.
    pub processes: Vec<ProcessSpec>,
    /// Run configuration.
    pub config: RunConfig,
}

impl Workload {
    /// Creates an empty workload.
    pub fn new(config: RunConfig) -> Self {
        Self {
            processes: Vec::new(),
            config,
        }
    }

    /// Adds a process.
    pub fn with_process(mut self, spec: ProcessSpec) -> Self {
        self.processes.push(spec);
        self
    }

    /// Adds several processes.
    pub fn with_processes(mut self, specs: impl IntoIterator<Item = ProcessSpec>) -> Self {
        self.processes.extend(specs);
        self
    }

    /// Same processes under a different configuration.
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Total CPU demand of the batch.
    pub fn total_service(&self) -> Time {
        self.processes.iter().map(ProcessSpec::total_service).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("FCFS".parse::<Policy>().unwrap(), Policy::Fcfs);
        assert_eq!("spn".parse::<Policy>().unwrap(), Policy::Spn);
        assert_eq!("sjf".parse::<Policy>().unwrap(), Policy::Spn);
        assert_eq!("rr".parse::<Policy>().unwrap(), Policy::RoundRobin);
        assert_eq!(
            "priority-preemptive".parse::<Policy>().unwrap(),
            Policy::preemptive_priority()
        );
        let err = "lottery".parse::<Policy>().unwrap_err();
        assert_eq!(err.to_string(), "unknown scheduling policy 'lottery'");
    }

    #[test]
    fn test_policy_name_round_trips() {
        for policy in [
            Policy::Fcfs,
            Policy::Spn,
            Policy::Srtf,
            Policy::RoundRobin,
            Policy::priority(),
            Policy::preemptive_priority(),
        ] {
            assert_eq!(policy.name().parse::<Policy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_run_config_builder() {
        let config = RunConfig::round_robin(4).with_overheads(1, 2, 3);
        assert_eq!(config.policy, Policy::RoundRobin);
        assert_eq!(config.quantum, Some(4));
        assert_eq!((config.tip, config.tfp, config.tcp), (1, 2, 3));
        assert!(config.policy.requires_quantum());
    }

    #[test]
    fn test_workload_from_json() {
        let json = r#"{
            "processes": [
                {"name": "A", "arrival": 0, "bursts": 2, "cpu_burst": 3, "io_burst": 1},
                {"name": "B", "arrival": 1, "bursts": 1, "cpu_burst": 4, "priority": 5}
            ],
            "config": {
                "policy": {"kind": "priority", "preemptive": true,
                           "aging": {"threshold": 5, "increment": 1}},
                "tcp": 1
            }
        }"#;
        let workload: Workload = serde_json::from_str(json).unwrap();
        assert_eq!(workload.processes.len(), 2);
        assert_eq!(workload.processes[1].priority, 5);
        assert_eq!(workload.processes[1].io_burst, 0);
        assert_eq!(workload.total_service(), 10);
        assert_eq!(workload.config.tcp, 1);
        assert_eq!(workload.config.tip, 0);
        assert_eq!(workload.config.ordering, EventOrdering::default());
        assert_eq!(
            workload.config.policy,
            Policy::Priority {
                preemptive: true,
                aging: Some(Aging::new(5, 1)),
            }
        );
    }
}
