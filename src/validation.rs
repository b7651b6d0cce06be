//! Input validation for simulation workloads.
//!
//! Checks structural integrity of a workload before the event loop
//! starts. Detects:
//! - Empty batches and duplicate or blank process names
//! - Processes with zero CPU bursts
//! - Negative arrival, burst, or overhead values
//! - A missing or non-positive Round Robin quantum
//! - Aging parameters that can never fire
//!
//! Every problem is reported, not just the first one.

use crate::models::{Policy, Workload};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValidationErrorKind {
    /// The workload has no processes.
    EmptyWorkload,
    /// Two processes share the same name.
    DuplicateId,
    /// A process has a blank name.
    EmptyName,
    /// A process declares zero CPU bursts.
    NoBursts,
    /// Arrival or burst duration below zero.
    NegativeTime,
    /// TIP, TFP, or TCP below zero.
    NegativeOverhead,
    /// Round Robin without a quantum.
    MissingQuantum,
    /// Quantum ≤ 0.
    InvalidQuantum,
    /// Aging threshold ≤ 0.
    InvalidAging,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates a workload.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_workload(workload: &Workload) -> ValidationResult {
    let mut errors = Vec::new();

    if workload.processes.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyWorkload,
            "Workload has no processes",
        ));
    }

    let mut names = HashSet::new();
    for spec in &workload.processes {
        if spec.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyName,
                format!("Process arriving at {} has an empty name", spec.arrival),
            ));
        } else if !names.insert(spec.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate process name: {}", spec.name),
            ));
        }

        if spec.bursts == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoBursts,
                format!("Process '{}' has no CPU bursts", spec.name),
            ));
        }

        for (field, value) in [
            ("arrival", spec.arrival),
            ("cpu_burst", spec.cpu_burst),
            ("io_burst", spec.io_burst),
        ] {
            if value < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeTime,
                    format!("Process '{}' has negative {field}: {value}", spec.name),
                ));
            }
        }
    }

    let config = &workload.config;
    for (field, value) in [("tip", config.tip), ("tfp", config.tfp), ("tcp", config.tcp)] {
        if value < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeOverhead,
                format!("Overhead {field} is negative: {value}"),
            ));
        }
    }

    if config.policy.requires_quantum() {
        match config.quantum {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::MissingQuantum,
                format!("Policy '{}' requires a quantum", config.policy),
            )),
            Some(q) if q <= 0 => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidQuantum,
                format!("Quantum must be positive, got {q}"),
            )),
            Some(_) => {}
        }
    }

    if let Policy::Priority {
        aging: Some(aging), ..
    } = &config.policy
    {
        if aging.threshold <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAging,
                format!("Aging threshold must be positive, got {}", aging.threshold),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
