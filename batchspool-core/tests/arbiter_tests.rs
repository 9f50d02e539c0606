use batchspool_core::arbiter::{ReleaseTrigger, TriggerArbiter};
use pretty_assertions::assert_eq;

#[test]
fn new_arbiter_is_armed() {
    let arbiter = TriggerArbiter::new();
    assert!(!arbiter.has_fired());
    assert_eq!(arbiter.fired_by(), None);
}

#[test]
fn first_trigger_fires_exactly_once() {
    let mut arbiter = TriggerArbiter::new();
    assert!(arbiter.observe(ReleaseTrigger::CountThreshold));
    assert!(arbiter.has_fired());
    assert_eq!(arbiter.fired_by(), Some(ReleaseTrigger::CountThreshold));
}

#[test]
fn later_triggers_are_inert_until_reset() {
    let mut arbiter = TriggerArbiter::new();
    assert!(arbiter.observe(ReleaseTrigger::ManualFlush));
    assert!(!arbiter.observe(ReleaseTrigger::CountThreshold));
    assert!(!arbiter.observe(ReleaseTrigger::InactivityTimeout));
    assert!(!arbiter.observe(ReleaseTrigger::ManualFlush));
    // still reports the condition that actually closed the cycle
    assert_eq!(arbiter.fired_by(), Some(ReleaseTrigger::ManualFlush));
}

#[test]
fn reset_rearms_for_the_next_cycle() {
    let mut arbiter = TriggerArbiter::new();
    assert!(arbiter.observe(ReleaseTrigger::InactivityTimeout));
    arbiter.reset();
    assert!(!arbiter.has_fired());
    assert_eq!(arbiter.fired_by(), None);
    assert!(arbiter.observe(ReleaseTrigger::CountThreshold));
}

#[test]
fn trigger_precedence_order() {
    // Declaration order doubles as tie precedence: manual > count > timer.
    assert!(ReleaseTrigger::ManualFlush < ReleaseTrigger::CountThreshold);
    assert!(ReleaseTrigger::CountThreshold < ReleaseTrigger::InactivityTimeout);
}
