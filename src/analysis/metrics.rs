//! Process scheduling metrics.
//!
//! Computes the standard per-process and batch indicators from the final
//! process records and the engine's CPU accounting.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Turnaround (TR) | completion - arrival |
//! | Normalized turnaround (TRn) | TR / CPU service time |
//! | Waiting | TR - CPU service time |
//! | Span | last completion - first arrival |
//! | CPU split | user / OS / idle as % of total time |
//!
//! # Reference
//! Stallings (2018), "Operating Systems: Internals and Design Principles", Ch. 9.2

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Process, ProcessId, Time};
use crate::simulation::CpuAccounting;

/// Indicators for a single finished process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    /// Process id.
    pub process: ProcessId,
    /// Process name.
    pub name: String,
    /// Arrival time.
    pub arrival: Time,
    /// Completion time (end of TFP).
    pub completion: Time,
    /// Total CPU service received.
    pub service: Time,
    /// completion - arrival.
    pub turnaround: Time,
    /// turnaround / service; `None` when service is 0.
    pub normalized_turnaround: Option<f64>,
    /// turnaround - service.
    pub waiting: Time,
}

/// CPU time split with percentages of the total simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    /// User CPU time.
    pub user: Time,
    /// OS overhead time (TCP + TFP).
    pub os: Time,
    /// Idle time.
    pub idle: Time,
    /// user + os + idle.
    pub total: Time,
    /// User share (0.0..=100.0).
    pub user_pct: f64,
    /// OS share (0.0..=100.0).
    pub os_pct: f64,
    /// Idle share (0.0..=100.0).
    pub idle_pct: f64,
}

impl CpuUsage {
    /// Builds the split from raw accounting.
    pub fn from_accounting(accounting: &CpuAccounting) -> Self {
        let total = accounting.total();
        let pct = |part: Time| {
            if total == 0 {
                0.0
            } else {
                part as f64 / total as f64 * 100.0
            }
        };
        Self {
            user: accounting.user,
            os: accounting.os,
            idle: accounting.idle,
            total,
            user_pct: pct(accounting.user),
            os_pct: pct(accounting.os),
            idle_pct: pct(accounting.idle),
        }
    }

    /// Sum of the three percentages.
    pub fn pct_sum(&self) -> f64 {
        self.user_pct + self.os_pct + self.idle_pct
    }
}

/// Batch-wide indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// Last completion - first arrival.
    pub span: Time,
    /// Mean turnaround over finished processes.
    pub mean_turnaround: f64,
    /// Mean normalized turnaround over processes with service > 0.
    pub mean_normalized_turnaround: Option<f64>,
    /// Mean waiting time.
    pub mean_waiting: f64,
    /// CPU split.
    pub cpu: CpuUsage,
}

/// A metric that could not be computed normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsWarning {
    /// Service time is 0, so normalized turnaround is undefined.
    ZeroServiceTime { process: ProcessId, name: String },
    /// The process never completed; it is left out of every metric.
    Unfinished { process: ProcessId, name: String },
    /// The run lasted 0 ticks; all percentages are reported as 0.
    ZeroTotalTime,
}

/// Per-process and batch metrics of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// One entry per finished process, in id order.
    pub processes: Vec<ProcessMetrics>,
    /// Batch indicators.
    pub batch: BatchMetrics,
    /// Degenerate cases encountered.
    pub warnings: Vec<MetricsWarning>,
}

impl Metrics {
    /// Computes metrics from final process records and CPU accounting.
    pub fn calculate(processes: &[Process], accounting: &CpuAccounting) -> Self {
        let mut rows = Vec::with_capacity(processes.len());
        let mut warnings = Vec::new();

        for p in processes {
            let Some(completion) = p.completion else {
                warnings.push(MetricsWarning::Unfinished {
                    process: p.id,
                    name: p.name.clone(),
                });
                continue;
            };
            let service = p.service_received;
            let turnaround = completion - p.arrival;
            let normalized_turnaround = if service > 0 {
                Some(turnaround as f64 / service as f64)
            } else {
                warnings.push(MetricsWarning::ZeroServiceTime {
                    process: p.id,
                    name: p.name.clone(),
                });
                None
            };
            rows.push(ProcessMetrics {
                process: p.id,
                name: p.name.clone(),
                arrival: p.arrival,
                completion,
                service,
                turnaround,
                normalized_turnaround,
                waiting: turnaround - service,
            });
        }

        let cpu = CpuUsage::from_accounting(accounting);
        if cpu.total == 0 {
            warnings.push(MetricsWarning::ZeroTotalTime);
        }

        let span = match (
            rows.iter().map(|r| r.arrival).min(),
            rows.iter().map(|r| r.completion).max(),
        ) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        };

        let n = rows.len();
        let mean = |sum: f64, count: usize| if count == 0 { 0.0 } else { sum / count as f64 };
        let mean_turnaround = mean(rows.iter().map(|r| r.turnaround as f64).sum(), n);
        let mean_waiting = mean(rows.iter().map(|r| r.waiting as f64).sum(), n);
        let normalized: Vec<f64> = rows.iter().filter_map(|r| r.normalized_turnaround).collect();
        let mean_normalized_turnaround = if normalized.is_empty() {
            None
        } else {
            Some(mean(normalized.iter().sum(), normalized.len()))
        };

        for w in &warnings {
            warn!(warning = ?w, "degenerate metric");
        }

        Self {
            processes: rows,
            batch: BatchMetrics {
                span,
                mean_turnaround,
                mean_normalized_turnaround,
                mean_waiting,
                cpu,
            },
            warnings,
        }
    }

    /// Metrics of a process by name.
    pub fn for_process(&self, name: &str) -> Option<&ProcessMetrics> {
        self.processes.iter().find(|m| m.name == name)
    }

    /// Whether any warning was raised.
    pub fn is_degenerate(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether the CPU percentages add up to 100 within `tolerance`.
    ///
    /// A zero-length run has no percentages and is always consistent.
    pub fn percentages_consistent(&self, tolerance: f64) -> bool {
        let cpu = &self.batch.cpu;
        cpu.total == 0 || (cpu.pct_sum() - 100.0).abs() <= tolerance
    }
}
