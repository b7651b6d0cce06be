//! Invariant checks over randomly generated workloads.
//!
//! Every policy is run over a range of seeds, with and without OS
//! overheads, and the trace, timeline and metrics are checked against
//! the properties any correct run must satisfy.

use tracing_test::traced_test;
use u_procsched::generator::WorkloadGenerator;
use u_procsched::models::{
    Aging, EventKind, EventOrdering, Policy, ProcessState, RunConfig, SliceKind,
};
use u_procsched::simulation::{simulate, SimulationReport};

const SEEDS: u64 = 40;

fn configs() -> Vec<RunConfig> {
    let mut configs = Vec::new();
    for (tip, tfp, tcp) in [(0, 0, 0), (1, 2, 1)] {
        for policy in [
            Policy::Fcfs,
            Policy::Spn,
            Policy::Srtf,
            Policy::priority(),
            Policy::Priority {
                preemptive: true,
                aging: Some(Aging::new(4, 1)),
            },
        ] {
            configs.push(RunConfig::new(policy).with_overheads(tip, tfp, tcp));
        }
        configs.push(RunConfig::round_robin(3).with_overheads(tip, tfp, tcp));
    }
    configs.push(RunConfig::round_robin(1).with_ordering(EventOrdering::arrival_first()));
    configs
}

fn for_each_run(mut check: impl FnMut(&RunConfig, u64, &SimulationReport)) {
    for config in configs() {
        let gen = WorkloadGenerator::new(6).with_config(config.clone());
        for seed in 0..SEEDS {
            let report = simulate(&gen.generate(seed))
                .unwrap_or_else(|e| panic!("{} seed {seed}: {e}", config.policy));
            check(&config, seed, &report);
        }
    }
}

#[test]
#[traced_test]
fn test_same_workload_same_trace() {
    let gen = WorkloadGenerator::new(8).with_config(RunConfig::round_robin(2).with_tcp(1));
    for seed in 0..10 {
        let workload = gen.generate(seed);
        let a = simulate(&workload).unwrap();
        let b = simulate(&workload).unwrap();
        assert_eq!(
            serde_json::to_string(&a.outcome.trace).unwrap(),
            serde_json::to_string(&b.outcome.trace).unwrap(),
            "seed {seed}"
        );
        assert_eq!(
            serde_json::to_string(&a.metrics).unwrap(),
            serde_json::to_string(&b.metrics).unwrap()
        );
    }
}

#[test]
fn test_timeline_partitions_the_run() {
    for_each_run(|config, seed, r| {
        assert!(
            r.timeline.is_valid(),
            "{} seed {seed}: {:?}",
            config.policy,
            r.timeline.violations
        );
        assert_eq!(r.timeline.cpu_lane_time(), r.outcome.end_time);
        assert_eq!(r.outcome.accounting.total(), r.outcome.end_time);

        let by_kind = r.timeline.time_by_kind();
        let get = |k: SliceKind| by_kind.get(&k).copied().unwrap_or(0);
        assert_eq!(get(SliceKind::Cpu), r.outcome.accounting.user);
        assert_eq!(get(SliceKind::OsOverhead), r.outcome.accounting.os);
        assert_eq!(get(SliceKind::Idle), r.outcome.accounting.idle);
    });
}

#[test]
fn test_at_most_one_runner() {
    for_each_run(|config, seed, r| {
        let mut running = None;
        for e in &r.outcome.trace {
            match e.kind {
                EventKind::Dispatch => {
                    assert!(running.is_none(), "{} seed {seed}: double dispatch", config.policy);
                    running = Some(e.process);
                }
                EventKind::Terminated | EventKind::Blocked | EventKind::Preempted => {
                    assert_eq!(running, Some(e.process), "{} seed {seed}", config.policy);
                    running = None;
                }
                _ => {}
            }
        }
        assert!(running.is_none());
    });
}

#[test]
fn test_trace_time_never_decreases() {
    for_each_run(|_, _, r| {
        assert!(r.outcome.trace.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(
            r.outcome.trace.last().map(|e| e.time),
            Some(r.outcome.end_time)
        );
    });
}

#[test]
fn test_every_process_finishes_its_work() {
    for_each_run(|_, _, r| {
        for p in &r.outcome.processes {
            assert_eq!(p.state, ProcessState::Done);
            assert_eq!(p.completed_bursts, p.bursts);
            assert_eq!(p.service_received, p.total_service());
            assert!(p.completion.is_some());
        }
        assert_eq!(r.outcome.events_of(EventKind::Arrival).len(), r.outcome.processes.len());
        assert_eq!(
            r.outcome.events_of(EventKind::TerminationDone).len(),
            r.outcome.processes.len()
        );
    });
}

#[test]
fn test_turnaround_bounds() {
    for_each_run(|_, _, r| {
        assert!(r.metrics.warnings.is_empty());
        for m in &r.metrics.processes {
            assert!(m.turnaround >= m.service);
            assert!(m.service >= 0);
            assert!(m.waiting >= 0);
            assert!(m.normalized_turnaround.unwrap() >= 1.0);
        }
        assert!(r.metrics.percentages_consistent(1e-6));
    });
}

#[test]
fn test_non_preemptive_policies_never_preempt() {
    for policy in [Policy::Fcfs, Policy::Spn, Policy::priority()] {
        let gen = WorkloadGenerator::new(6).with_config(RunConfig::new(policy));
        for seed in 0..SEEDS {
            let r = simulate(&gen.generate(seed)).unwrap();
            assert!(r.outcome.events_of(EventKind::Preempted).is_empty());
        }
    }
}

#[test]
fn test_round_robin_grants_never_exceed_quantum() {
    let q = 3;
    let gen = WorkloadGenerator::new(6).with_config(RunConfig::round_robin(q).with_tcp(1));
    for seed in 0..SEEDS {
        let r = simulate(&gen.generate(seed)).unwrap();
        assert!(r
            .timeline
            .cpu_slices()
            .filter(|s| s.kind == SliceKind::Cpu)
            .all(|s| s.duration() <= q));
    }
}
