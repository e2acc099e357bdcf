//! Execution policies for multi-target forwards and result aggregation.

use std::fmt;
use std::ops::{BitOr, ControlFlow};

use serde::{Deserialize, Serialize};

use crate::params::ScriptCell;

/// Plugin did not handle the event.
pub const PLUGIN_CONTINUE: ScriptCell = 0;
/// Plugin handled the event; the reserved Stop sentinel.
pub const PLUGIN_HANDLED: ScriptCell = 1;
/// Plugin handled the event and wants the host's own handling suppressed.
pub const PLUGIN_HANDLED_MAIN: ScriptCell = 2;

/// How the results of a broadcast are combined.
///
/// * `IGNORE` discards every result (and never stops early). It dominates
///   any other flag it is combined with.
/// * Without `IGNORE`, the running result is the maximum of all results.
/// * `STOP` ends the broadcast at the first `PLUGIN_HANDLED` and reports
///   `PLUGIN_HANDLED`, unless `HIGHEST` is also set, in which case the
///   maximum computed so far is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExecPolicy {
    ignore: bool,
    stop: bool,
    highest: bool,
}

impl ExecPolicy {
    /// Aggregate the maximum, never stop early.
    pub const CONTINUE: Self = Self {
        ignore: false,
        stop: false,
        highest: false,
    };
    /// Discard all results.
    pub const IGNORE: Self = Self {
        ignore: true,
        stop: false,
        highest: false,
    };
    /// Stop at the first `PLUGIN_HANDLED`.
    pub const STOP: Self = Self {
        ignore: false,
        stop: true,
        highest: false,
    };
    /// Keep the maximum when stopping.
    pub const HIGHEST: Self = Self {
        ignore: false,
        stop: false,
        highest: true,
    };

    /// Returns whether every flag in `other` is set here.
    pub fn contains(self, other: Self) -> bool {
        (!other.ignore || self.ignore)
            && (!other.stop || self.stop)
            && (!other.highest || self.highest)
    }

    /// Returns whether results are discarded.
    pub fn is_ignore(self) -> bool {
        self.ignore
    }

    /// Returns whether the broadcast stops at `PLUGIN_HANDLED`.
    pub fn stops(self) -> bool {
        self.stop
    }

    /// Returns whether a stop keeps the running maximum.
    pub fn keeps_highest(self) -> bool {
        self.highest
    }
}

impl BitOr for ExecPolicy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            ignore: self.ignore || rhs.ignore,
            stop: self.stop || rhs.stop,
            highest: self.highest || rhs.highest,
        }
    }
}

impl fmt::Display for ExecPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.ignore {
            flags.push("ignore");
        }
        if self.stop {
            flags.push("stop");
        }
        if self.highest {
            flags.push("highest");
        }
        if flags.is_empty() {
            write!(f, "continue")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}

/// Result of executing a forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    /// Aggregated result.
    pub value: ScriptCell,
    /// Plugin functions actually invoked.
    pub invoked: usize,
    /// Whether a `STOP` policy ended the broadcast early.
    pub stopped: bool,
}

/// Running aggregation of one broadcast.
#[derive(Debug)]
pub struct Aggregator {
    policy: ExecPolicy,
    running: ScriptCell,
    invoked: usize,
    stopped: bool,
}

impl Aggregator {
    /// Starts an aggregation; the running result begins at `PLUGIN_CONTINUE`.
    pub fn new(policy: ExecPolicy) -> Self {
        Self {
            policy,
            running: PLUGIN_CONTINUE,
            invoked: 0,
            stopped: false,
        }
    }

    /// Feeds one plugin result. `Break` means no further plugin may run.
    pub fn feed(&mut self, result: ScriptCell) -> ControlFlow<()> {
        self.invoked += 1;
        if !self.policy.is_ignore() {
            self.running = self.running.max(result);
        }

        if self.policy.stops() && result == PLUGIN_HANDLED {
            self.stopped = true;
            if !self.policy.is_ignore() && !self.policy.keeps_highest() {
                self.running = PLUGIN_HANDLED;
            }
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    /// Final outcome.
    pub fn finish(self) -> ExecOutcome {
        ExecOutcome {
            value: if self.policy.is_ignore() {
                PLUGIN_CONTINUE
            } else {
                self.running
            },
            invoked: self.invoked,
            stopped: self.stopped,
        }
    }
}
