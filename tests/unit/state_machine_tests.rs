//! Lifecycle, score and notification behavior of `SessionStateMachine`.

use std::sync::{Arc, Mutex};

use playstate::session::SessionStateMachine;
use playstate::{AppError, SessionEvent, SessionState, Transition};

fn recorded(machine: &mut SessionStateMachine) -> Arc<Mutex<Vec<SessionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    machine.subscribe(move |event| sink.lock().unwrap().push(*event));
    events
}

fn active_machine() -> SessionStateMachine {
    let mut machine = SessionStateMachine::new();
    assert_eq!(machine.start(), Transition::Applied);
    machine
}

#[test]
fn new_machine_is_idle_with_zero_score() {
    let machine = SessionStateMachine::new();
    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(machine.score(), 0);
    assert!(!machine.is_session_over());
    assert!(machine.started_at().is_none());
    assert!(machine.elapsed().is_none());
}

#[test]
fn only_first_start_transitions() {
    let mut machine = SessionStateMachine::new();
    let events = recorded(&mut machine);

    assert_eq!(machine.start(), Transition::Applied);
    for _ in 0..5 {
        assert_eq!(machine.start(), Transition::Ignored);
    }

    assert_eq!(machine.state(), SessionState::Active);
    assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Started]);
    assert!(machine.started_at().is_some());
}

#[test]
fn fail_from_active_is_terminal() {
    let mut machine = active_machine();
    let events = recorded(&mut machine);

    assert_eq!(machine.fail(), Transition::Applied);

    assert!(machine.is_failed());
    assert!(!machine.is_finished());
    assert!(machine.is_session_over());
    assert!(machine.ended_at().is_some());
    assert_eq!(machine.start(), Transition::Ignored);
    assert_eq!(machine.finish(), Transition::Ignored);
    assert_eq!(machine.fail(), Transition::Ignored);
    assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Failed]);
}

#[test]
fn fail_from_idle_is_allowed() {
    let mut machine = SessionStateMachine::new();
    assert_eq!(machine.fail(), Transition::Applied);
    assert_eq!(machine.state(), SessionState::Failed);
    assert_eq!(machine.start(), Transition::Ignored);
}

#[test]
fn finish_from_idle_is_ignored() {
    let mut machine = SessionStateMachine::new();
    let events = recorded(&mut machine);

    assert_eq!(machine.finish(), Transition::Ignored);

    assert_eq!(machine.state(), SessionState::Idle);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn finished_session_cannot_fail() {
    let mut machine = active_machine();
    assert_eq!(machine.finish(), Transition::Applied);
    assert_eq!(machine.fail(), Transition::Ignored);
    assert_eq!(machine.state(), SessionState::Finished);
}

#[test]
fn score_notification_carries_new_total() {
    let mut machine = active_machine();
    let events = recorded(&mut machine);

    machine.add_score(10);
    machine.add_score(5);

    assert_eq!(machine.score(), 15);
    assert_eq!(
        *events.lock().unwrap(),
        vec![SessionEvent::ScoreChanged(10), SessionEvent::ScoreChanged(15)]
    );
}

#[test]
fn score_is_frozen_after_failure() {
    for prior in [0_u32, 10, 1_000] {
        let mut machine = active_machine();
        machine.add_score(prior);
        machine.fail();
        let events = recorded(&mut machine);

        assert_eq!(machine.add_score(10), Transition::Ignored);
        assert_eq!(machine.add_score(u32::MAX), Transition::Ignored);

        assert_eq!(machine.score(), prior);
        assert!(events.lock().unwrap().is_empty());
    }
}

#[test]
fn score_accumulates_before_start_and_after_finish() {
    let mut machine = SessionStateMachine::new();
    assert_eq!(machine.add_score(3), Transition::Applied);
    machine.start();
    machine.finish();
    assert_eq!(machine.add_score(4), Transition::Applied);
    assert_eq!(machine.score(), 7);
}

#[test]
fn score_saturates() {
    let mut machine = active_machine();
    machine.add_score(u32::MAX);
    machine.add_score(1);
    assert_eq!(machine.score(), u32::MAX);
}

#[test]
fn finish_with_commits_before_notifying() {
    let mut machine = active_machine();
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);
    machine.subscribe(move |event| sink.lock().unwrap().push(format!("{event:?}")));

    let commit_log = Arc::clone(&order);
    let outcome = machine
        .finish_with(|| {
            commit_log.lock().unwrap().push("commit".to_owned());
            Ok(())
        })
        .expect("commit succeeds");

    assert_eq!(outcome, Transition::Applied);
    assert_eq!(*order.lock().unwrap(), vec!["commit", "Finished"]);
}

#[test]
fn finish_with_skips_commit_when_illegal() {
    let mut machine = SessionStateMachine::new();
    let mut called = false;

    let outcome = machine
        .finish_with(|| {
            called = true;
            Ok(())
        })
        .expect("ignored transition is not an error");

    assert_eq!(outcome, Transition::Ignored);
    assert!(!called);
}

#[test]
fn failed_commit_still_finishes_and_notifies() {
    let mut machine = active_machine();
    let events = recorded(&mut machine);

    let err = machine
        .finish_with(|| Err(AppError::Persistence("disk full".into())))
        .expect_err("commit error is surfaced");

    assert!(matches!(err, AppError::Persistence(_)));
    assert!(machine.is_finished());
    assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Finished]);
}

#[tokio::test]
async fn async_finish_awaits_commit_first() {
    let mut machine = active_machine();
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);
    machine.subscribe(move |event| sink.lock().unwrap().push(format!("{event:?}")));

    let commit_log = Arc::clone(&order);
    let outcome = machine
        .finish_with_async(async move {
            tokio::task::yield_now().await;
            commit_log.lock().unwrap().push("commit".to_owned());
            Ok(())
        })
        .await
        .expect("commit succeeds");

    assert_eq!(outcome, Transition::Applied);
    assert_eq!(*order.lock().unwrap(), vec!["commit", "Finished"]);
}

#[test]
fn snapshot_reflects_state() {
    let mut machine = active_machine();
    machine.add_score(20);
    machine.fail();

    let snapshot = machine.snapshot();
    assert_eq!(snapshot.id, machine.id());
    assert_eq!(snapshot.state, SessionState::Failed);
    assert_eq!(snapshot.score, 20);
    assert!(snapshot.started_at.is_some());
    assert!(snapshot.ended_at.is_some());
    assert!(machine.elapsed().expect("elapsed") >= chrono::Duration::zero());
}

#[test]
fn sessions_get_distinct_ids() {
    assert_ne!(SessionStateMachine::new().id(), SessionStateMachine::new().id());
}

#[tokio::test]
async fn dropped_async_finish_leaves_session_active() {
    let mut machine = active_machine();
    let events = recorded(&mut machine);

    let cut_short = tokio::time::timeout(
        std::time::Duration::from_millis(10),
        machine.finish_with_async(std::future::pending::<playstate::Result<()>>()),
    )
    .await;

    assert!(cut_short.is_err(), "commit never completes");
    assert_eq!(machine.state(), SessionState::Active);
    assert!(machine.ended_at().is_none());
    assert!(events.lock().unwrap().is_empty());

    let outcome = machine
        .finish_with_async(async { Ok(()) })
        .await
        .expect("second commit succeeds");
    assert_eq!(outcome, Transition::Applied);
    assert!(machine.is_finished());
    assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Finished]);
}
