//! View of the running process handed to preemption checks.

use crate::models::{Process, Time};

/// The process currently holding the CPU, with its dispatch time.
///
/// The process record's `remaining_in_burst` is the value at dispatch;
/// the live value is derived from the time elapsed since then.
#[derive(Debug, Clone, Copy)]
pub struct RunningProcess<'a> {
    /// Process record.
    pub process: &'a Process,
    /// Time the process started running.
    pub since: Time,
}

impl<'a> RunningProcess<'a> {
    /// Creates a view.
    pub fn new(process: &'a Process, since: Time) -> Self {
        Self { process, since }
    }

    /// Time spent running since dispatch.
    pub fn elapsed(&self, now: Time) -> Time {
        (now - self.since).max(0)
    }

    /// Time left in the current burst at `now`.
    pub fn remaining_in_burst(&self, now: Time) -> Time {
        (self.process.remaining_in_burst - self.elapsed(now)).max(0)
    }
}
