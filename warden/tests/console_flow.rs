//! Console: run switching, proposals, and the decision round trip with the run backend.

mod fixtures;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fixtures::{fresh_approval, shell, snapshot};
use serde_json::json;
use stream_event::EventSequence;
use tokio::sync::Notify;
use warden::{
    BackendError, CapabilityName, Console, DecideError, Decision, EventKind, EventStream,
    MockGovernanceBackend, MockRunBackend, Resolution, Run, RunBackend, RunStatus, StreamEnd,
    StreamError, Verdict,
};

struct Harness {
    console: Console,
    runs: Arc<MockRunBackend>,
}

async fn harness() -> Harness {
    let governance = Arc::new(MockGovernanceBackend::new(snapshot()));
    let runs = Arc::new(MockRunBackend::new());
    let console = Console::new(governance, runs.clone());
    console.governance().refresh().await.unwrap();
    Harness { console, runs }
}

#[tokio::test]
async fn starting_a_run_cancels_the_previous_one_and_clears_approvals() {
    let h = harness().await;
    let _feed1 = h.runs.live_feed("run-1");
    let mut first = h.console.start_run(Run::new("run-1")).await.unwrap();
    h.console.approvals().add_approval(fresh_approval("a1", "run-1"));

    let _feed2 = h.runs.live_feed("run-2");
    let _second = h.console.start_run(Run::new("run-2")).await.unwrap();

    assert!(first.is_cancelled());
    assert_eq!(first.run().await, Ok(StreamEnd::Cancelled));
    assert!(h.console.approvals().is_empty());
    assert!(h.console.is_current("run-2"));
    assert_eq!(h.console.activity().active_run().as_deref(), Some("run-2"));
}

#[tokio::test]
async fn failed_subscribe_leaves_no_active_run() {
    let h = harness().await;
    assert!(h.console.start_run(Run::new("run-9")).await.is_err());
    assert!(h.console.active_run().is_none());
    assert!(h.console.activity().active_run().is_none());
}

#[tokio::test]
async fn propose_enqueues_only_for_the_active_run() {
    let h = harness().await;
    let _feed = h.runs.live_feed("run-1");
    let _sub = h.console.start_run(Run::new("run-1")).await.unwrap();

    let verdict = h.console.propose(
        "run-1",
        "Developer",
        CapabilityName::ShellExec,
        shell("make deploy"),
    );
    let Verdict::NeedsApproval(approval) = verdict else {
        panic!("expected NeedsApproval");
    };
    assert_eq!(h.console.approvals().pending(), vec![approval]);
    assert_eq!(h.console.active_run().unwrap().status, RunStatus::AwaitingApproval);

    let stale = h.console.propose("run-0", "Developer", CapabilityName::ShellExec, shell("ls"));
    assert!(matches!(stale, Verdict::NeedsApproval(_)));
    assert_eq!(h.console.approvals().len(), 1);

    let low = h.console.propose("run-1", "QA", CapabilityName::DocsRead, shell("cat README"));
    assert!(matches!(low, Verdict::Proceed(_)));
    assert_eq!(h.console.approvals().len(), 1);
}

#[tokio::test]
async fn confirmed_decision_is_recorded_and_dismissable() {
    let h = harness().await;
    let _feed = h.runs.live_feed("run-1");
    let _sub = h.console.start_run(Run::new("run-1")).await.unwrap();
    let Verdict::NeedsApproval(approval) =
        h.console.propose("run-1", "Developer", CapabilityName::ShellExec, shell("make deploy"))
    else {
        panic!("expected NeedsApproval");
    };

    h.console.decide(&approval.id, Resolution::Approved).await.unwrap();
    assert_eq!(h.runs.decisions(), vec![(approval.id.clone(), Resolution::Approved)]);
    assert_eq!(h.console.approvals().get(&approval.id).unwrap().decision, Decision::Approved);
    assert_eq!(h.console.active_run().unwrap().status, RunStatus::Running);

    assert_eq!(
        h.console.decide(&approval.id, Resolution::Rejected).await,
        Err(DecideError::AlreadyDecided(approval.id.clone()))
    );
    assert!(h.console.dismiss(&approval.id));
    assert!(h.console.approvals().is_empty());
}

#[tokio::test]
async fn unconfirmed_decision_restores_the_approval() {
    let h = harness().await;
    h.console.approvals().add_approval(fresh_approval("a1", "run-1"));
    h.runs.set_decision_failure(Some(BackendError::Transport("timeout".to_string())));

    let err = h.console.decide("a1", Resolution::Approved).await.unwrap_err();
    assert!(matches!(err, DecideError::Backend(BackendError::Transport(_))));
    let record = h.console.approvals().get("a1").unwrap();
    assert_eq!(record.decision, Decision::Pending);
    assert!(record.decided_at.is_none());

    h.runs.set_decision_failure(None);
    h.console.decide("a1", Resolution::Rejected).await.unwrap();
    assert_eq!(h.runs.decisions().len(), 2);
}

/// Streams like [`MockRunBackend`]; decisions wait for `gate` and are never confirmed.
struct UnconfirmedDecisions {
    inner: MockRunBackend,
    gate: Notify,
}

#[async_trait]
impl RunBackend for UnconfirmedDecisions {
    async fn subscribe(&self, run_id: &str) -> Result<EventStream, StreamError> {
        self.inner.subscribe(run_id).await
    }

    async fn submit_decision(
        &self,
        _approval_id: &str,
        _resolution: Resolution,
    ) -> Result<(), BackendError> {
        self.gate.notified().await;
        Err(BackendError::Transport("timeout".to_string()))
    }
}

#[tokio::test]
async fn unconfirmed_decision_is_not_restored_into_a_newer_run() {
    let runs = Arc::new(UnconfirmedDecisions {
        inner: MockRunBackend::new(),
        gate: Notify::new(),
    });
    let _feed1 = runs.inner.live_feed("run-1");
    let _feed2 = runs.inner.live_feed("run-2");
    let console = Console::new(Arc::new(MockGovernanceBackend::new(snapshot())), runs.clone());
    let _first = console.start_run(Run::new("run-1")).await.unwrap();
    console.approvals().add_approval(fresh_approval("a1", "run-1"));

    // The decision is in flight when run-2 starts; the backend answers afterwards.
    let switch = async {
        let second = console.start_run(Run::new("run-2")).await.unwrap();
        runs.gate.notify_one();
        second
    };
    let (decided, _second) = tokio::join!(console.decide("a1", Resolution::Approved), switch);

    assert!(matches!(decided, Err(DecideError::Backend(BackendError::Transport(_)))));
    assert!(console.is_current("run-2"));
    assert!(console.approvals().is_empty());
    assert!(console.approvals().get("a1").is_none());
}

#[tokio::test]
async fn decision_applies_to_the_pending_record_among_duplicates() {
    let h = harness().await;
    let mut decided = fresh_approval("a1", "run-1");
    assert!(decided.decide(Resolution::Rejected, Utc::now()));
    h.console
        .approvals()
        .set_pending_approvals(vec![decided, fresh_approval("a1", "run-1")]);

    h.runs.set_decision_failure(Some(BackendError::Transport("timeout".to_string())));
    assert!(h.console.decide("a1", Resolution::Approved).await.is_err());
    let records = h.console.approvals().approvals();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].decision, Decision::Rejected);
    assert_eq!(records[1].decision, Decision::Pending);

    h.runs.set_decision_failure(None);
    h.console.decide("a1", Resolution::Approved).await.unwrap();
    let records = h.console.approvals().approvals();
    assert_eq!(records[0].decision, Decision::Rejected);
    assert_eq!(records[1].decision, Decision::Approved);
    assert_eq!(
        h.console.decide("a1", Resolution::Rejected).await,
        Err(DecideError::AlreadyDecided("a1".to_string()))
    );
}

#[tokio::test]
async fn missing_and_expired_approvals_are_refused_locally() {
    let h = harness().await;
    assert_eq!(
        h.console.decide("nope", Resolution::Approved).await,
        Err(DecideError::NotFound("nope".to_string()))
    );
    h.console.approvals().add_approval(fixtures::approval("old", "run-1"));
    assert_eq!(
        h.console.decide("old", Resolution::Approved).await,
        Err(DecideError::Expired("old".to_string()))
    );
    h.console.decide("old", Resolution::Rejected).await.unwrap();
    assert_eq!(h.runs.decisions(), vec![("old".to_string(), Resolution::Rejected)]);
}

#[tokio::test]
async fn streamed_approvals_reach_the_console_queue() {
    let h = harness().await;
    let mut seq = EventSequence::new("run-1");
    let feed = h.runs.live_feed("run-1");
    let mut sub = h.console.start_run(Run::new("run-1")).await.unwrap();

    feed.send(Ok(seq.next(
        EventKind::ApprovalRequired,
        json!({ "approval": fresh_approval("a7", "run-1") }),
    )))
    .unwrap();
    feed.send(Ok(seq.next(EventKind::Done, json!(null)))).unwrap();

    assert_eq!(sub.run().await, Ok(StreamEnd::Completed(EventKind::Done)));
    assert_eq!(h.console.approvals().pending().len(), 1);

    let ended = h.console.end_run().unwrap();
    assert_eq!(ended.id, "run-1");
    assert!(h.console.active_run().is_none());
    assert!(h.console.end_run().is_none());
}
