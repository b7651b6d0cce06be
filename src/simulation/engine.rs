//! Discrete-event simulation engine.
//!
//! # Algorithm
//!
//! 1. Seed the queue with one `Arrival` per process.
//! 2. Pop the earliest event, advance the clock, and charge the elapsed
//!    time to user / OS / idle according to what the CPU was doing.
//! 3. Apply the transition, scheduling follow-up events and asking the
//!    strategy whether a newly READY process should preempt the runner.
//! 4. Once no pending event at the current instant ranks before
//!    `Dispatch`, let the strategy pick the next process for a free CPU.
//!
//! The run ends when the queue drains; every process must then be DONE.
//!
//! # Reference
//! Banks et al. (2010), "Discrete-Event System Simulation", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, trace};

use super::queue::{EventQueue, Scheduled};
use super::SimulationError;
use crate::dispatching::{create_strategy, RunningProcess, SchedulingStrategy};
use crate::models::{
    Event, EventKind, Process, ProcessId, ProcessState, RunConfig, Time, Workload,
};
use crate::validation::validate_workload;

/// What the single CPU is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// Nothing to run.
    Idle,
    /// Context switch (TCP) into `process` until `until`.
    Switching { process: ProcessId, until: Time },
    /// `process` executing user code since `since`.
    Running { process: ProcessId, since: Time },
    /// Termination work (TFP) for `process` until `until`.
    Terminating { process: ProcessId, until: Time },
}

impl CpuState {
    /// Process the CPU is held by or on behalf of.
    pub fn holder(&self) -> Option<ProcessId> {
        match *self {
            CpuState::Idle => None,
            CpuState::Switching { process, .. }
            | CpuState::Running { process, .. }
            | CpuState::Terminating { process, .. } => Some(process),
        }
    }
}

/// CPU time split accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuAccounting {
    /// Time spent in user code.
    pub user: Time,
    /// Time spent on TIP, TCP and TFP.
    pub os: Time,
    /// Time with nothing to do.
    pub idle: Time,
}

impl CpuAccounting {
    /// Sum of all three buckets.
    pub fn total(&self) -> Time {
        self.user + self.os + self.idle
    }

    /// Charges `elapsed` ticks spent in `cpu`. An otherwise idle CPU is
    /// busy with admission work while any TIP is pending.
    fn charge(&mut self, cpu: &CpuState, admitting: bool, elapsed: Time) {
        match cpu {
            CpuState::Idle if admitting => self.os += elapsed,
            CpuState::Idle => self.idle += elapsed,
            CpuState::Running { .. } => self.user += elapsed,
            CpuState::Switching { .. } | CpuState::Terminating { .. } => self.os += elapsed,
        }
    }
}

/// Everything a finished run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Configuration the run used.
    pub config: RunConfig,
    /// Fired events, in processing order.
    pub trace: Vec<Event>,
    /// Final process records, indexed by [`ProcessId`].
    pub processes: Vec<Process>,
    /// CPU time split.
    pub accounting: CpuAccounting,
    /// Clock when the last event fired.
    pub end_time: Time,
}

impl SimulationOutcome {
    /// Looks up a process by name.
    pub fn process_by_name(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }

    /// Name of a process id.
    pub fn name_of(&self, id: ProcessId) -> Option<&str> {
        self.processes.get(id.0).map(|p| p.name.as_str())
    }

    /// Events of one kind, in order.
    pub fn events_of(&self, kind: EventKind) -> Vec<&Event> {
        self.trace.iter().filter(|e| e.kind == kind).collect()
    }

    /// Process names in the order they were dispatched.
    pub fn dispatch_order(&self) -> Vec<&str> {
        self.events_of(EventKind::Dispatch)
            .into_iter()
            .filter_map(|e| self.name_of(e.process))
            .collect()
    }
}

/// The simulation engine.
///
/// Owns the clock, the CPU, the READY / BLOCKED / DONE collections and
/// the event queue. Nothing outside the event loop mutates them.
///
/// # Example
///
/// ```
/// use u_procsched::models::{Policy, ProcessSpec, RunConfig, Workload};
/// use u_procsched::simulation::Simulator;
///
/// let workload = Workload::new(RunConfig::new(Policy::Fcfs))
///     .with_process(ProcessSpec::new("P1", 0, 3))
///     .with_process(ProcessSpec::new("P2", 1, 2));
///
/// let outcome = Simulator::new(&workload).unwrap().run().unwrap();
/// assert_eq!(outcome.dispatch_order(), vec!["P1", "P2"]);
/// assert_eq!(outcome.end_time, 5);
/// ```
#[derive(Debug)]
pub struct Simulator {
    config: RunConfig,
    strategy: Box<dyn SchedulingStrategy>,
    processes: Vec<Process>,
    queue: EventQueue,
    clock: Time,
    cpu: CpuState,
    /// Sequence number of the event that will end the current CPU grant.
    run_end: Option<u64>,
    preempt_pending: bool,
    dispatch_pending: bool,
    /// Processes between `Arrival` and `AdmissionDone`.
    admitting: usize,
    /// READY transitions seen during a context switch, checked once it ends.
    deferred: Vec<ProcessId>,
    ready: Vec<ProcessId>,
    blocked: BTreeSet<ProcessId>,
    done: Vec<ProcessId>,
    ready_ticket: u64,
    accounting: CpuAccounting,
    trace: Vec<Event>,
}

impl Simulator {
    /// Validates the workload and prepares a run.
    ///
    /// The process table is sorted by name, so ids follow name order.
    pub fn new(workload: &Workload) -> Result<Self, SimulationError> {
        validate_workload(workload).map_err(SimulationError::InvalidWorkload)?;
        let strategy = create_strategy(&workload.config)
            .map_err(|e| SimulationError::InvalidWorkload(vec![e]))?;
        Ok(Self::prepare(workload, strategy))
    }

    /// Prepares a run driven by a caller-supplied strategy.
    ///
    /// The strategy is reset first, so one instance can serve several runs.
    /// The workload's policy is still validated but does not pick the rule.
    pub fn with_strategy(
        workload: &Workload,
        strategy: Box<dyn SchedulingStrategy>,
    ) -> Result<Self, SimulationError> {
        validate_workload(workload).map_err(SimulationError::InvalidWorkload)?;
        Ok(Self::prepare(workload, strategy))
    }

    fn prepare(workload: &Workload, mut strategy: Box<dyn SchedulingStrategy>) -> Self {
        strategy.reset();

        let mut specs: Vec<_> = workload.processes.iter().collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        let processes: Vec<Process> = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Process::from_spec(ProcessId(i), spec))
            .collect();

        let mut queue = EventQueue::new(workload.config.ordering.clone());
        queue.extend(
            processes
                .iter()
                .map(|p| Event::new(p.arrival, EventKind::Arrival, p.id)),
        );

        Self {
            config: workload.config.clone(),
            strategy,
            processes,
            queue,
            clock: 0,
            cpu: CpuState::Idle,
            run_end: None,
            preempt_pending: false,
            dispatch_pending: false,
            admitting: 0,
            deferred: Vec::new(),
            ready: Vec::new(),
            blocked: BTreeSet::new(),
            done: Vec::new(),
            ready_ticket: 0,
            accounting: CpuAccounting::default(),
            trace: Vec::new(),
        }
    }

    /// Current simulated time.
    pub fn clock(&self) -> Time {
        self.clock
    }

    /// Current CPU state.
    pub fn cpu(&self) -> CpuState {
        self.cpu
    }

    /// Runs the event loop to completion.
    pub fn run(mut self) -> Result<SimulationOutcome, SimulationError> {
        info!(
            policy = self.strategy.name(),
            processes = self.processes.len(),
            "starting simulation"
        );

        loop {
            if self.dispatch_pending && self.instant_settled() {
                self.dispatch_pending = false;
                self.try_dispatch()?;
            }

            let Some(scheduled) = self.queue.pop() else {
                break;
            };

            if self.is_stale(&scheduled) {
                trace!(
                    time = scheduled.event.time,
                    kind = %scheduled.event.kind,
                    process = %scheduled.event.process,
                    "discarding superseded event"
                );
                continue;
            }

            self.advance_to(scheduled.event.time)?;
            self.handle(scheduled.event)?;
        }

        let unfinished = self
            .processes
            .iter()
            .filter(|p| p.completion.is_none())
            .count();
        if unfinished > 0 {
            return Err(SimulationError::ProcessAbandoned(unfinished));
        }

        info!(
            end_time = self.clock,
            done = self.done.len(),
            events = self.trace.len(),
            user = self.accounting.user,
            os = self.accounting.os,
            idle = self.accounting.idle,
            "simulation finished"
        );

        Ok(SimulationOutcome {
            config: self.config,
            trace: self.trace,
            processes: self.processes,
            accounting: self.accounting,
            end_time: self.clock,
        })
    }

    /// No pending event at the current instant should be seen before a dispatch.
    fn instant_settled(&self) -> bool {
        match self.queue.peek_key() {
            None => true,
            Some(key) => {
                key.time > self.clock || key.rank >= self.queue.rank(EventKind::Dispatch)
            }
        }
    }

    /// A run-ending event overtaken by a preemption.
    fn is_stale(&self, scheduled: &Scheduled) -> bool {
        scheduled.event.kind.ends_run() && self.run_end != Some(scheduled.sequence)
    }

    fn advance_to(&mut self, time: Time) -> Result<(), SimulationError> {
        if time < self.clock {
            return Err(SimulationError::TimeRegression {
                clock: self.clock,
                event_time: time,
            });
        }
        self.accounting
            .charge(&self.cpu, self.admitting > 0, time - self.clock);
        self.clock = time;
        Ok(())
    }

    /// The instant `delta` ticks after the clock.
    fn after(&self, delta: Time) -> Result<Time, SimulationError> {
        self.clock
            .checked_add(delta)
            .ok_or(SimulationError::TimeOverflow {
                at: self.clock,
                delta,
            })
    }

    fn schedule(&mut self, event: Event) -> Result<u64, SimulationError> {
        if event.time < self.clock {
            return Err(SimulationError::TimeRegression {
                clock: self.clock,
                event_time: event.time,
            });
        }
        Ok(self.queue.push(event))
    }

    fn process(&self, id: ProcessId) -> Result<&Process, SimulationError> {
        self.processes
            .get(id.0)
            .ok_or(SimulationError::UnknownProcess(id))
    }

    fn process_mut(&mut self, id: ProcessId) -> Result<&mut Process, SimulationError> {
        self.processes
            .get_mut(id.0)
            .ok_or(SimulationError::UnknownProcess(id))
    }

    fn transition(&mut self, id: ProcessId, to: ProcessState) -> Result<(), SimulationError> {
        let at = self.clock;
        self.process_mut(id)?
            .transition(to)
            .map(|_| ())
            .map_err(|from| SimulationError::UnexpectedState {
                at,
                process: id,
                from,
                to,
            })
    }

    fn handle(&mut self, event: Event) -> Result<(), SimulationError> {
        let id = event.process;
        let state = self.process(id)?.state;
        if state.is_terminal() && event.kind != EventKind::TerminationDone {
            return Err(SimulationError::EventForFinishedProcess {
                at: self.clock,
                kind: event.kind,
                process: id,
            });
        }
        if let Some(to) = event.kind.target_state() {
            if !state.can_transition_to(to) {
                return Err(SimulationError::UnexpectedState {
                    at: self.clock,
                    process: id,
                    from: state,
                    to,
                });
            }
        }

        trace!(
            time = event.time,
            kind = %event.kind,
            process = %id,
            note = %event.note,
            "event"
        );
        let kind = event.kind;
        self.trace.push(event);

        match kind {
            EventKind::Arrival => self.on_arrival(id),
            EventKind::AdmissionDone => self.on_admission_done(id),
            EventKind::Dispatch => self.on_dispatch(id),
            EventKind::Preempted => self.on_preempted(id),
            EventKind::Blocked => self.on_blocked(id),
            EventKind::Terminated => self.on_terminated(id),
            EventKind::TerminationDone => self.on_termination_done(id),
            EventKind::IoDone => self.on_io_done(id),
        }
    }

    fn on_arrival(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        let tip = self.config.tip;
        let mut admission = Event::new(self.after(tip)?, EventKind::AdmissionDone, id);
        if tip > 0 {
            admission = admission.with_note(format!("tip {tip}"));
        }
        self.schedule(admission)?;
        self.admitting += 1;
        Ok(())
    }

    fn on_admission_done(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        self.transition(id, ProcessState::Ready)?;
        self.admitting = self.admitting.saturating_sub(1);
        self.enter_ready(id);
        let now = self.clock;
        let process = &self.processes[id.0];
        self.strategy.on_arrival(process, now);
        self.strategy.on_become_ready(process, now);
        self.check_preemption(id)
    }

    fn on_io_done(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        self.transition(id, ProcessState::Ready)?;
        self.blocked.remove(&id);
        self.enter_ready(id);
        self.strategy
            .on_become_ready(&self.processes[id.0], self.clock);
        self.check_preemption(id)
    }

    fn on_dispatch(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        match self.cpu {
            CpuState::Switching { process, until } if process == id => {
                if until != self.clock {
                    return Err(SimulationError::OverheadMismatch {
                        at: self.clock,
                        process: id,
                        until,
                    });
                }
            }
            other => {
                return Err(SimulationError::CpuOccupied {
                    at: self.clock,
                    requested: id,
                    holder: format!("{other:?}"),
                })
            }
        }
        self.transition(id, ProcessState::Running)?;
        let now = self.clock;
        self.cpu = CpuState::Running {
            process: id,
            since: now,
        };

        let process = &self.processes[id.0];
        let remaining = process.remaining_in_burst;
        let end = match self.strategy.quantum() {
            Some(q) if remaining > q => Event::new(self.after(q)?, EventKind::Preempted, id)
                .with_note(format!("quantum expired; remaining {}", remaining - q)),
            _ if process.on_last_burst() => {
                Event::new(self.after(remaining)?, EventKind::Terminated, id)
            }
            _ => Event::new(self.after(remaining)?, EventKind::Blocked, id),
        };
        debug!(
            time = now,
            process = %process.name,
            remaining,
            "dispatched"
        );
        self.run_end = Some(self.schedule(end)?);

        // Processes that became READY during the switch get their check now.
        for candidate in std::mem::take(&mut self.deferred) {
            if self.processes[candidate.0].state == ProcessState::Ready {
                self.check_preemption(candidate)?;
            }
        }
        Ok(())
    }

    /// Ends the current grant of `id`, returning its start time.
    fn release_cpu(&mut self, id: ProcessId) -> Result<Time, SimulationError> {
        let since = match self.cpu {
            CpuState::Running { process, since } if process == id => since,
            other => {
                return Err(SimulationError::CpuOccupied {
                    at: self.clock,
                    requested: id,
                    holder: format!("{other:?}"),
                })
            }
        };
        let ran = self.clock - since;
        self.process_mut(id)?.consume(ran);
        self.cpu = CpuState::Idle;
        self.run_end = None;
        self.preempt_pending = false;
        Ok(since)
    }

    fn on_preempted(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        self.release_cpu(id)?;
        self.transition(id, ProcessState::Ready)?;
        self.enter_ready(id);
        let process = &self.processes[id.0];
        debug!(
            time = self.clock,
            process = %process.name,
            remaining = process.remaining_in_burst,
            "preempted"
        );
        self.strategy.on_become_ready(process, self.clock);
        self.dispatch_pending = true;
        Ok(())
    }

    fn on_blocked(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        self.release_cpu(id)?;
        self.process_mut(id)?.finish_burst();
        self.transition(id, ProcessState::Blocked)?;
        self.blocked.insert(id);
        let io = self.processes[id.0].io_burst;
        self.schedule(Event::new(self.after(io)?, EventKind::IoDone, id))?;
        self.dispatch_pending = true;
        Ok(())
    }

    fn on_terminated(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        self.release_cpu(id)?;
        self.process_mut(id)?.finish_burst();
        self.transition(id, ProcessState::Done)?;
        self.done.push(id);

        let tfp = self.config.tfp;
        let until = self.after(tfp)?;
        self.cpu = CpuState::Terminating { process: id, until };
        let mut closeout = Event::new(until, EventKind::TerminationDone, id);
        if tfp > 0 {
            closeout = closeout.with_note(format!("tfp {tfp}"));
        }
        debug!(time = self.clock, process = %self.processes[id.0].name, "terminated");
        self.schedule(closeout)?;
        Ok(())
    }

    fn on_termination_done(&mut self, id: ProcessId) -> Result<(), SimulationError> {
        match self.cpu {
            CpuState::Terminating { process, until } if process == id => {
                if until != self.clock {
                    return Err(SimulationError::OverheadMismatch {
                        at: self.clock,
                        process: id,
                        until,
                    });
                }
            }
            other => {
                return Err(SimulationError::CpuOccupied {
                    at: self.clock,
                    requested: id,
                    holder: format!("{other:?}"),
                })
            }
        }
        let state = self.processes[id.0].state;
        if state != ProcessState::Done {
            return Err(SimulationError::UnexpectedState {
                at: self.clock,
                process: id,
                from: state,
                to: ProcessState::Done,
            });
        }
        self.processes[id.0].completion = Some(self.clock);
        self.cpu = CpuState::Idle;
        self.dispatch_pending = true;
        Ok(())
    }

    fn enter_ready(&mut self, id: ProcessId) {
        let process = &mut self.processes[id.0];
        process.last_ready_at = Some(self.clock);
        process.ready_seq = self.ready_ticket;
        self.ready_ticket += 1;
        self.ready.push(id);
        self.dispatch_pending = true;
    }

    /// Asks the strategy whether `candidate` should take the CPU now.
    fn check_preemption(&mut self, candidate: ProcessId) -> Result<(), SimulationError> {
        let (runner, since) = match self.cpu {
            CpuState::Running { process, since } => (process, since),
            CpuState::Switching { process, .. } if process != candidate => {
                if !self.deferred.contains(&candidate) {
                    self.deferred.push(candidate);
                }
                return Ok(());
            }
            _ => return Ok(()),
        };
        if self.preempt_pending || runner == candidate {
            return Ok(());
        }

        let now = self.clock;
        let view = RunningProcess::new(&self.processes[runner.0], since);
        let left = view.remaining_in_burst(now);
        // A burst ending at this instant completes instead of being preempted.
        if left == 0 {
            return Ok(());
        }
        let challenger = &self.processes[candidate.0];
        if !self.strategy.should_preempt(&view, challenger, now) {
            return Ok(());
        }

        debug!(
            time = now,
            runner = %view.process.name,
            challenger = %challenger.name,
            left,
            "preempting"
        );
        let note = format!("preempted by {}; remaining {left}", challenger.name);
        let seq = self.schedule(Event::new(now, EventKind::Preempted, runner).with_note(note))?;
        self.run_end = Some(seq);
        self.preempt_pending = true;
        Ok(())
    }

    fn try_dispatch(&mut self) -> Result<(), SimulationError> {
        if self.cpu != CpuState::Idle || self.ready.is_empty() {
            return Ok(());
        }

        let now = self.clock;
        let candidates: Vec<&Process> = self.ready.iter().map(|id| &self.processes[id.0]).collect();
        let Some(chosen) = self.strategy.select_next(&candidates, now) else {
            return Ok(());
        };
        let slot = self
            .ready
            .iter()
            .position(|&id| id == chosen)
            .ok_or(SimulationError::UnknownProcess(chosen))?;
        self.ready.remove(slot);

        let tcp = self.config.tcp;
        let until = self.after(tcp)?;
        self.cpu = CpuState::Switching {
            process: chosen,
            until,
        };
        let mut dispatch = Event::new(until, EventKind::Dispatch, chosen);
        if tcp > 0 {
            dispatch = dispatch.with_note(format!("tcp {tcp}"));
        }
        self.schedule(dispatch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Policy, ProcessSpec};

    fn run(workload: &Workload) -> SimulationOutcome {
        Simulator::new(workload).unwrap().run().unwrap()
    }

    #[test]
    fn test_rejects_invalid_workload() {
        let w = Workload::new(RunConfig::new(Policy::RoundRobin))
            .with_process(ProcessSpec::new("P1", 0, 2));
        let err = Simulator::new(&w).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidWorkload(ref e) if e.len() == 1));
    }

    #[test]
    fn test_ids_follow_name_order() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("b", 0, 1))
            .with_process(ProcessSpec::new("a", 0, 1));
        let out = run(&w);
        assert_eq!(out.processes[0].name, "a");
        assert_eq!(out.processes[1].name, "b");
        // Simultaneous arrivals fire in name order
        let arrivals: Vec<usize> = out
            .events_of(EventKind::Arrival)
            .iter()
            .map(|e| e.process.0)
            .collect();
        assert_eq!(arrivals, vec![0, 1]);
    }

    #[test]
    fn test_idle_before_first_arrival() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", 4, 3));
        let out = run(&w);
        assert_eq!(out.end_time, 7);
        assert_eq!(out.accounting.idle, 4);
        assert_eq!(out.accounting.user, 3);
        assert_eq!(out.accounting.total(), out.end_time);
    }

    #[test]
    fn test_overheads_are_charged_to_os() {
        // TIP 1, TFP 2, TCP 1: admit [0,1), switch [1,2), run [2,5), close [5,7)
        let w = Workload::new(RunConfig::new(Policy::Fcfs).with_overheads(1, 2, 1))
            .with_process(ProcessSpec::new("P1", 0, 3));
        let out = run(&w);
        let p = out.process_by_name("P1").unwrap();
        assert_eq!(p.completion, Some(7));
        assert_eq!(out.accounting.user, 3);
        assert_eq!(out.accounting.os, 4);
        assert_eq!(out.accounting.idle, 0);
        assert_eq!(out.end_time, 7);
    }

    #[test]
    fn test_admission_alone_is_os_time() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs).with_tip(2))
            .with_process(ProcessSpec::new("P1", 0, 3));
        let out = run(&w);
        assert_eq!(out.accounting.user, 3);
        assert_eq!(out.accounting.os, 2);
        assert_eq!(out.accounting.idle, 0);
        assert_eq!(out.end_time, 5);
    }

    #[test]
    fn test_admission_during_a_run_is_user_time() {
        // B is admitted over [1,3) while A holds the CPU
        let w = Workload::new(RunConfig::new(Policy::Fcfs).with_tip(2))
            .with_process(ProcessSpec::new("A", 0, 4))
            .with_process(ProcessSpec::new("B", 1, 1));
        let out = run(&w);
        // admit A [0,2), run A [2,6), run B [6,7)
        assert_eq!(out.accounting.os, 2);
        assert_eq!(out.accounting.user, 5);
        assert_eq!(out.accounting.idle, 0);
        assert_eq!(out.end_time, 7);
    }

    #[test]
    fn test_srtf_preempts_once_the_switch_ends() {
        // P2 becomes READY at t=1 while P1 is still being switched in
        let w = Workload::new(RunConfig::new(Policy::Srtf).with_tcp(2))
            .with_process(ProcessSpec::new("P1", 0, 100))
            .with_process(ProcessSpec::new("P2", 1, 1));
        let out = run(&w);
        assert_eq!(out.dispatch_order(), vec!["P1", "P2", "P1"]);

        let preempted = out.events_of(EventKind::Preempted);
        assert_eq!(preempted.len(), 1);
        assert_eq!(preempted[0].time, 2);
        assert_eq!(preempted[0].note, "preempted by P2; remaining 100");

        // P2: switch [2,4), run [4,5); P1: switch [5,7), run [7,107)
        assert_eq!(out.process_by_name("P2").unwrap().completion, Some(5));
        assert_eq!(out.process_by_name("P1").unwrap().completion, Some(107));
        assert_eq!(out.accounting.user, 101);
        assert_eq!(out.accounting.os, 6);
        assert_eq!(out.accounting.idle, 0);
    }

    #[test]
    fn test_priority_preempts_once_the_switch_ends() {
        let w = Workload::new(RunConfig::new(Policy::Priority {
            preemptive: true,
            aging: None,
        })
        .with_tcp(2))
        .with_process(ProcessSpec::new("low", 0, 5).with_priority(1))
        .with_process(ProcessSpec::new("high", 1, 2).with_priority(5));
        let out = run(&w);
        assert_eq!(out.dispatch_order(), vec!["low", "high", "low"]);
        assert_eq!(out.events_of(EventKind::Preempted)[0].time, 2);
        // high: switch [2,4), run [4,6); low: switch [6,8), run [8,13)
        assert_eq!(out.process_by_name("high").unwrap().completion, Some(6));
        assert_eq!(out.process_by_name("low").unwrap().completion, Some(13));
    }

    #[test]
    fn test_switch_target_is_not_its_own_challenger() {
        // RR never preempts, so a READY arrival during the switch changes nothing
        let w = Workload::new(RunConfig::round_robin(4).with_tcp(2))
            .with_process(ProcessSpec::new("A", 0, 3))
            .with_process(ProcessSpec::new("B", 1, 1));
        let out = run(&w);
        assert_eq!(out.dispatch_order(), vec!["A", "B"]);
        assert!(out.events_of(EventKind::Preempted).is_empty());
    }

    #[test]
    fn test_with_strategy_resets_reused_rule() {
        use crate::dispatching::rules::RoundRobin;

        let w = Workload::new(RunConfig::round_robin(2))
            .with_process(ProcessSpec::new("A", 0, 3))
            .with_process(ProcessSpec::new("B", 0, 3));

        // Ticket left over from an earlier run
        let mut stale = RoundRobin::new(2);
        let earlier = Process::from_spec(ProcessId(1), &ProcessSpec::new("B", 0, 3));
        stale.on_become_ready(&earlier, 0);
        assert_eq!(stale.queued(), 1);

        let sim = Simulator::with_strategy(&w, Box::new(stale)).unwrap();
        assert_eq!(
            format!("{:?}", sim.strategy),
            "RoundRobin { quantum: 2, tickets: {}, next_ticket: 0 }"
        );
        let out = sim.run().unwrap();
        assert_eq!(out.dispatch_order(), vec!["A", "B", "A", "B"]);
        assert_eq!(out.trace, run(&w).trace);
    }

    #[test]
    fn test_time_regression_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", 0, 1));
        let mut sim = Simulator::new(&w).unwrap();
        sim.clock = 10;
        assert_eq!(
            sim.run().unwrap_err(),
            SimulationError::TimeRegression {
                clock: 10,
                event_time: 0
            }
        );
    }

    #[test]
    fn test_dispatch_onto_busy_cpu_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("A", 0, 5))
            .with_process(ProcessSpec::new("B", 0, 5));
        let mut sim = Simulator::new(&w).unwrap();
        // A runs [0,5); B is READY when this dispatch fires
        sim.queue.push(Event::new(1, EventKind::Dispatch, ProcessId(1)));
        let err = sim.run().unwrap_err();
        assert!(matches!(
            err,
            SimulationError::CpuOccupied {
                at: 1,
                requested: ProcessId(1),
                ..
            }
        ));
    }

    #[test]
    fn test_event_after_done_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", 0, 1));
        let mut sim = Simulator::new(&w).unwrap();
        sim.queue.push(Event::new(10, EventKind::IoDone, ProcessId(0)));
        assert_eq!(
            sim.run().unwrap_err(),
            SimulationError::EventForFinishedProcess {
                at: 10,
                kind: EventKind::IoDone,
                process: ProcessId(0),
            }
        );
    }

    #[test]
    fn test_illegal_transition_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("A", 0, 5))
            .with_process(ProcessSpec::new("B", 0, 5));
        let mut sim = Simulator::new(&w).unwrap();
        // B is waiting in READY, not in IO
        sim.queue.push(Event::new(1, EventKind::IoDone, ProcessId(1)));
        assert_eq!(
            sim.run().unwrap_err(),
            SimulationError::UnexpectedState {
                at: 1,
                process: ProcessId(1),
                from: ProcessState::Ready,
                to: ProcessState::Ready,
            }
        );
    }

    #[test]
    fn test_early_dispatch_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs).with_tcp(2))
            .with_process(ProcessSpec::new("P1", 0, 5));
        let mut sim = Simulator::new(&w).unwrap();
        // The switch for P1 ends at t=2
        sim.queue.push(Event::new(1, EventKind::Dispatch, ProcessId(0)));
        assert_eq!(
            sim.run().unwrap_err(),
            SimulationError::OverheadMismatch {
                at: 1,
                process: ProcessId(0),
                until: 2,
            }
        );
    }

    #[test]
    fn test_unknown_process_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", 0, 1));
        let mut sim = Simulator::new(&w).unwrap();
        sim.queue.push(Event::new(0, EventKind::Arrival, ProcessId(9)));
        assert_eq!(
            sim.run().unwrap_err(),
            SimulationError::UnknownProcess(ProcessId(9))
        );
    }

    #[test]
    fn test_clock_overflow_aborts() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", Time::MAX - 1, 5));
        let err = Simulator::new(&w).unwrap().run().unwrap_err();
        assert_eq!(
            err,
            SimulationError::TimeOverflow {
                at: Time::MAX - 1,
                delta: 5,
            }
        );
    }

    #[test]
    fn test_io_cycle() {
        // P1: 2 bursts of 2 with IO 3; CPU idles during the IO
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", 0, 2).with_bursts(2, 3));
        let out = run(&w);
        let kinds: Vec<EventKind> = out.trace.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Arrival,
                EventKind::AdmissionDone,
                EventKind::Dispatch,
                EventKind::Blocked,
                EventKind::IoDone,
                EventKind::Dispatch,
                EventKind::Terminated,
                EventKind::TerminationDone,
            ]
        );
        assert_eq!(out.end_time, 7);
        assert_eq!(out.accounting.idle, 3);
        let p = &out.processes[0];
        assert_eq!(p.completed_bursts, 2);
        assert_eq!(p.service_received, 4);
    }

    #[test]
    fn test_other_process_runs_during_io() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("A", 0, 2).with_bursts(2, 4))
            .with_process(ProcessSpec::new("B", 1, 3));
        let out = run(&w);
        assert_eq!(out.dispatch_order(), vec!["A", "B", "A"]);
        // A: [0,2) io [2,6); B: [2,5); A: [6,8)
        assert_eq!(out.process_by_name("B").unwrap().completion, Some(5));
        assert_eq!(out.process_by_name("A").unwrap().completion, Some(8));
        assert_eq!(out.accounting.idle, 1);
    }

    #[test]
    fn test_dispatch_sees_same_instant_arrivals() {
        // Under SJF both processes arrive at t=0: the shorter one must win
        // even though "long" is admitted first by name order.
        let w = Workload::new(RunConfig::new(Policy::Spn))
            .with_process(ProcessSpec::new("a-long", 0, 9))
            .with_process(ProcessSpec::new("b-short", 0, 1));
        let out = run(&w);
        assert_eq!(out.dispatch_order(), vec!["b-short", "a-long"]);
    }

    #[test]
    fn test_stale_completion_is_not_traced() {
        let w = Workload::new(RunConfig::new(Policy::Srtf))
            .with_process(ProcessSpec::new("P1", 0, 10))
            .with_process(ProcessSpec::new("P2", 2, 3));
        let out = run(&w);
        let terminations = out.events_of(EventKind::Terminated);
        assert_eq!(terminations.len(), 2);
        assert_eq!(out.events_of(EventKind::Preempted).len(), 1);
    }

    #[test]
    fn test_zero_length_burst() {
        let w = Workload::new(RunConfig::new(Policy::Fcfs))
            .with_process(ProcessSpec::new("P1", 0, 0))
            .with_process(ProcessSpec::new("P2", 0, 2));
        let out = run(&w);
        assert_eq!(out.process_by_name("P1").unwrap().completion, Some(0));
        assert_eq!(out.process_by_name("P2").unwrap().completion, Some(2));
    }

    #[test]
    fn test_cpu_state_holder() {
        assert_eq!(CpuState::Idle.holder(), None);
        let s = CpuState::Running {
            process: ProcessId(3),
            since: 0,
        };
        assert_eq!(s.holder(), Some(ProcessId(3)));
    }
}
