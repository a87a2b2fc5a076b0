//! ApprovalQueue: the decide-then-dismiss scenario, no-ops, and the no-dedup property.

mod fixtures;

use std::collections::HashMap;

use fixtures::{approval, t0};
use proptest::prelude::*;
use warden::{ApprovalQueue, ApprovalState, CapabilityName, Decision, Resolution, RiskLevel};

#[test]
fn approve_then_remove_leaves_queue_empty() {
    let queue = ApprovalQueue::new();
    let a1 = approval("a1", "run-1");
    assert_eq!(a1.risk, RiskLevel::High);
    assert_eq!(a1.capability, CapabilityName::ShellExec);
    queue.add_approval(a1);

    assert!(queue.update_approval_status("a1", Resolution::Approved));
    let record = queue.get("a1").unwrap();
    assert_eq!(record.decision, Decision::Approved);
    assert!(record.decided_at.is_some());
    // Decided records stay visible until dismissed.
    assert_eq!(queue.len(), 1);

    assert!(queue.remove_approval("a1"));
    assert!(queue.is_empty());
    assert!(queue.pending_at(t0()).is_empty());
}

#[test]
fn update_status_on_missing_id_is_noop() {
    let queue = ApprovalQueue::new();
    queue.add_approval(approval("a1", "run-1"));
    let before = queue.approvals();
    assert!(!queue.update_approval_status("nope", Resolution::Approved));
    assert_eq!(queue.approvals(), before);
    assert!(!queue.remove_approval("nope"));
    assert_eq!(queue.len(), 1);
}

#[test]
fn decided_record_is_not_decided_again() {
    let queue = ApprovalQueue::new();
    queue.add_approval(approval("a1", "run-1"));
    let at = t0() + chrono::Duration::minutes(1);
    assert!(queue.update_approval_status_at("a1", Resolution::Rejected, at));
    assert!(!queue.update_approval_status("a1", Resolution::Approved));
    let record = queue.get("a1").unwrap();
    assert_eq!(record.decision, Decision::Rejected);
    assert_eq!(record.decided_at, Some(at));
}

#[test]
fn duplicate_ids_are_decided_one_at_a_time() {
    let queue = ApprovalQueue::new();
    queue.add_approval(approval("a1", "run-1"));
    queue.add_approval(approval("a1", "run-1"));
    assert!(queue.update_approval_status("a1", Resolution::Approved));
    assert!(queue.update_approval_status("a1", Resolution::Rejected));
    let decisions: Vec<_> = queue.approvals().into_iter().map(|a| a.decision).collect();
    assert_eq!(decisions, vec![Decision::Approved, Decision::Rejected]);
    assert!(queue.remove_approval("a1"));
    assert!(queue.is_empty());
}

#[test]
fn set_pending_replaces_and_expiry_is_derived() {
    let queue = ApprovalQueue::new();
    queue.add_approval(approval("old", "run-0"));
    queue.set_pending_approvals(vec![approval("a1", "run-1"), approval("a2", "run-1")]);
    assert_eq!(queue.len(), 2);
    assert!(queue.get("old").is_none());

    let later = t0() + chrono::Duration::hours(1);
    assert_eq!(queue.pending_at(t0()).len(), 2);
    assert!(queue.pending_at(later).is_empty());
    assert_eq!(queue.expired(later).len(), 2);
    assert_eq!(queue.get("a1").unwrap().state_at(later), ApprovalState::Expired);
}

#[derive(Clone, Debug)]
enum Op {
    Add(u8),
    Remove(u8),
    Decide(u8, bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4).prop_map(Op::Add),
        (0u8..4).prop_map(Op::Remove),
        ((0u8..4), any::<bool>()).prop_map(|(id, approve)| Op::Decide(id, approve)),
    ]
}

proptest! {
    /// The queue keeps exactly as many records per id as were added since the last
    /// removal of that id: it neither merges nor drops duplicates.
    #[test]
    fn queue_does_not_deduplicate(ops in prop::collection::vec(op(), 0..40)) {
        let queue = ApprovalQueue::new();
        let mut expected: HashMap<String, usize> = HashMap::new();
        for op in ops {
            match op {
                Op::Add(n) => {
                    let id = format!("a{}", n);
                    queue.add_approval(approval(&id, "run-1"));
                    *expected.entry(id).or_default() += 1;
                }
                Op::Remove(n) => {
                    let id = format!("a{}", n);
                    let had = expected.remove(&id).unwrap_or(0) > 0;
                    prop_assert_eq!(queue.remove_approval(&id), had);
                }
                Op::Decide(n, approve) => {
                    let resolution = if approve {
                        Resolution::Approved
                    } else {
                        Resolution::Rejected
                    };
                    queue.update_approval_status(&format!("a{}", n), resolution);
                }
            }
        }
        let mut actual: HashMap<String, usize> = HashMap::new();
        for a in queue.approvals() {
            *actual.entry(a.id).or_default() += 1;
        }
        prop_assert_eq!(actual, expected);
    }
}
