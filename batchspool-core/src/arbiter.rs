//! Single-fire arbitration of the three release conditions.
//!
//! A cycle races an inactivity timeout, a count threshold, and a manual flush.
//! Rather than three independent listeners racing to close the cycle, the
//! arbiter is a two-state machine: the first trigger observed while `Armed`
//! fires the release; everything after that is inert until `reset`.

use serde::{Deserialize, Serialize};

/// Which condition closed a cycle.
///
/// Declaration order is the tie precedence: a manual flush beats the count
/// threshold, which beats the inactivity timer. The two synchronous conditions
/// are checked on the call path of `send`/`flush`, so the asynchronous timer
/// can only win when neither of them is satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReleaseTrigger {
    ManualFlush,
    CountThreshold,
    InactivityTimeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArbiterState {
    Armed,
    Fired,
}

/// Collapses the three-way release race into one idempotent transition.
#[derive(Debug)]
pub struct TriggerArbiter {
    state: ArbiterState,
    fired_by: Option<ReleaseTrigger>,
}

impl TriggerArbiter {
    pub fn new() -> Self {
        Self {
            state: ArbiterState::Armed,
            fired_by: None,
        }
    }

    /// Observes a trigger; returns true exactly once per cycle.
    ///
    /// The first observation while armed transitions to `Fired`; later
    /// observations within the same cycle are ignored.
    pub fn observe(&mut self, trigger: ReleaseTrigger) -> bool {
        match self.state {
            ArbiterState::Armed => {
                self.state = ArbiterState::Fired;
                self.fired_by = Some(trigger);
                true
            }
            ArbiterState::Fired => false,
        }
    }

    /// Rearms for the next cycle.
    pub fn reset(&mut self) {
        self.state = ArbiterState::Armed;
        self.fired_by = None;
    }

    pub fn has_fired(&self) -> bool {
        self.state == ArbiterState::Fired
    }

    /// The trigger that closed the current cycle, if any.
    pub fn fired_by(&self) -> Option<ReleaseTrigger> {
        self.fired_by
    }
}

impl Default for TriggerArbiter {
    fn default() -> Self {
        Self::new()
    }
}
