//! Random workload generation.
//!
//! Produces workloads that always pass [`validate_workload`](crate::validation::validate_workload):
//! unique zero-padded names, at least one burst, non-negative times.
//! The same seed always yields the same workload.
//!
//! # Usage
//!
//! ```
//! use u_procsched::generator::WorkloadGenerator;
//! use u_procsched::models::RunConfig;
//!
//! let gen = WorkloadGenerator::new(8).with_config(RunConfig::round_robin(3));
//! let a = gen.generate(7);
//! let b = gen.generate(7);
//! assert_eq!(a, b);
//! assert_eq!(a.processes.len(), 8);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::{Policy, ProcessSpec, RunConfig, Time, Workload};

/// Ranges used to draw random processes.
///
/// Every range is inclusive. Bounds given in the wrong order are swapped,
/// and negative bounds are raised to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadGenerator {
    /// Number of processes.
    pub processes: usize,
    /// Latest arrival time.
    pub max_arrival: Time,
    /// CPU bursts per process.
    pub bursts: (u32, u32),
    /// Length of each CPU burst.
    pub cpu_burst: (Time, Time),
    /// Length of each IO burst (multi-burst processes only).
    pub io_burst: (Time, Time),
    /// External priority.
    pub priority: (i32, i32),
    /// Configuration attached to every generated workload.
    pub config: RunConfig,
}

impl WorkloadGenerator {
    /// Creates a generator for `processes` processes with default ranges.
    pub fn new(processes: usize) -> Self {
        Self {
            processes: processes.max(1),
            max_arrival: 20,
            bursts: (1, 3),
            cpu_burst: (1, 10),
            io_burst: (1, 8),
            priority: (0, 9),
            config: RunConfig::new(Policy::Fcfs),
        }
    }

    /// Sets the latest arrival time.
    pub fn with_max_arrival(mut self, max_arrival: Time) -> Self {
        self.max_arrival = max_arrival;
        self
    }

    /// Sets the burst-count range.
    pub fn with_bursts(mut self, min: u32, max: u32) -> Self {
        self.bursts = (min, max);
        self
    }

    /// Sets the CPU burst length range.
    pub fn with_cpu_burst(mut self, min: Time, max: Time) -> Self {
        self.cpu_burst = (min, max);
        self
    }

    /// Sets the IO burst length range.
    pub fn with_io_burst(mut self, min: Time, max: Time) -> Self {
        self.io_burst = (min, max);
        self
    }

    /// Sets the priority range.
    pub fn with_priority(mut self, min: i32, max: i32) -> Self {
        self.priority = (min, max);
        self
    }

    /// Sets the run configuration.
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Generates a workload from `seed`.
    pub fn generate(&self, seed: u64) -> Workload {
        let mut rng = SmallRng::seed_from_u64(seed);
        self.generate_with(&mut rng)
    }

    /// Generates a workload drawing from `rng`.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> Workload {
        let width = self.processes.to_string().len();
        let (b_lo, b_hi) = ordered(self.bursts.0.max(1), self.bursts.1.max(1));
        let (c_lo, c_hi) = ordered(self.cpu_burst.0.max(0), self.cpu_burst.1.max(0));
        let (i_lo, i_hi) = ordered(self.io_burst.0.max(0), self.io_burst.1.max(0));
        let (p_lo, p_hi) = ordered(self.priority.0, self.priority.1);
        let max_arrival = self.max_arrival.max(0);

        let specs = (0..self.processes).map(|i| {
            let bursts = rng.random_range(b_lo..=b_hi);
            let io = if bursts > 1 {
                rng.random_range(i_lo..=i_hi)
            } else {
                0
            };
            ProcessSpec::new(
                format!("P{:0width$}", i + 1),
                rng.random_range(0..=max_arrival),
                rng.random_range(c_lo..=c_hi),
            )
            .with_bursts(bursts, io)
            .with_priority(rng.random_range(p_lo..=p_hi))
        });

        Workload::new(self.config.clone()).with_processes(specs.collect::<Vec<_>>())
    }
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_workload;

    #[test]
    fn test_same_seed_same_workload() {
        let gen = WorkloadGenerator::new(12);
        assert_eq!(gen.generate(42), gen.generate(42));
        assert_ne!(gen.generate(42), gen.generate(43));
    }

    #[test]
    fn test_generated_workloads_are_valid() {
        let gen = WorkloadGenerator::new(10).with_config(RunConfig::round_robin(2));
        for seed in 0..50 {
            assert!(validate_workload(&gen.generate(seed)).is_ok(), "seed {seed}");
        }
    }

    #[test]
    fn test_ranges_are_respected() {
        let gen = WorkloadGenerator::new(30)
            .with_max_arrival(5)
            .with_bursts(2, 2)
            .with_cpu_burst(3, 4)
            .with_io_burst(1, 1)
            .with_priority(7, 7);
        let w = gen.generate(1);
        for p in &w.processes {
            assert!((0..=5).contains(&p.arrival));
            assert_eq!(p.bursts, 2);
            assert!((3..=4).contains(&p.cpu_burst));
            assert_eq!(p.io_burst, 1);
            assert_eq!(p.priority, 7);
        }
    }

    #[test]
    fn test_bad_ranges_are_normalized() {
        let gen = WorkloadGenerator::new(5)
            .with_max_arrival(-3)
            .with_bursts(0, 0)
            .with_cpu_burst(6, -2);
        let w = gen.generate(9);
        assert!(validate_workload(&w).is_ok());
        for p in &w.processes {
            assert_eq!(p.arrival, 0);
            assert_eq!(p.bursts, 1);
            assert!((0..=6).contains(&p.cpu_burst));
        }
    }

    #[test]
    fn test_names_sort_numerically() {
        let w = WorkloadGenerator::new(12).generate(0);
        let names: Vec<&str> = w.processes.iter().map(|p| p.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "P01");
    }
}
