//! In-memory session state machine.
//!
//! Owns the lifecycle state and the score counter, validates every
//! transition against [`SessionState::can_transition_to`], and broadcasts
//! the resulting [`SessionEvent`]s through its [`EventBus`].
//!
//! Illegal transitions follow one policy everywhere: they are ignored,
//! leave state and score untouched, emit nothing, and report
//! [`Transition::Ignored`].

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{EventBus, SessionEvent, SubscriptionId};
use crate::models::session::SessionState;
use crate::Result;

/// Outcome of a lifecycle or score operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operation changed the session and notified listeners.
    Applied,
    /// The operation was not legal in the current state and did nothing.
    Ignored,
}

impl Transition {
    /// Whether the operation took effect.
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Point-in-time view of a session, for diagnostics output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: Uuid,
    /// Lifecycle state.
    pub state: SessionState,
    /// Accumulated score.
    pub score: u32,
    /// When the session became active.
    pub started_at: Option<DateTime<Utc>>,
    /// When the session reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
}

/// Lifecycle and score tracker for one play session.
#[derive(Debug)]
pub struct SessionStateMachine {
    id: Uuid,
    state: SessionState,
    score: u32,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    events: EventBus,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    /// Idle session with a zero score and a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            score: 0,
            started_at: None,
            ended_at: None,
            events: EventBus::new(),
        }
    }

    /// Move from `Idle` to `Active` and emit [`SessionEvent::Started`].
    ///
    /// Repeated start signals are ignored.
    pub fn start(&mut self) -> Transition {
        if !self.enter(SessionState::Active) {
            return Transition::Ignored;
        }
        self.started_at = Some(Utc::now());
        self.events.emit(SessionEvent::Started);
        Transition::Applied
    }

    /// Move to `Failed` from `Idle` or `Active` and emit
    /// [`SessionEvent::Failed`]. The score is frozen from here on.
    pub fn fail(&mut self) -> Transition {
        if !self.enter(SessionState::Failed) {
            return Transition::Ignored;
        }
        self.ended_at = Some(Utc::now());
        self.events.emit(SessionEvent::Failed);
        Transition::Applied
    }

    /// Move from `Active` to `Finished` and emit [`SessionEvent::Finished`]
    /// without any persistence step.
    pub fn finish(&mut self) -> Transition {
        if !self.enter(SessionState::Finished) {
            return Transition::Ignored;
        }
        self.ended_at = Some(Utc::now());
        self.events.emit(SessionEvent::Finished);
        Transition::Applied
    }

    /// Move from `Active` to `Finished` once `commit` has run, then emit
    /// [`SessionEvent::Finished`].
    ///
    /// `commit` only runs when the transition is legal. The state changes and
    /// the notification is emitted once `commit` returns, whatever it
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the error from `commit`. The session is `Finished` regardless.
    pub fn finish_with<F>(&mut self, commit: F) -> Result<Transition>
    where
        F: FnOnce() -> Result<()>,
    {
        if !self.permits(SessionState::Finished) {
            return Ok(Transition::Ignored);
        }
        let committed = commit();
        self.complete_finish(&committed);
        committed.map(|()| Transition::Applied)
    }

    /// Same as [`Self::finish_with`], awaiting `commit` before the state
    /// changes.
    ///
    /// `commit` is dropped unpolled when the transition is illegal. If the
    /// returned future is dropped before `commit` completes, the session
    /// stays `Active` and a later finish runs a fresh commit.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `commit`. The session is `Finished`
    /// regardless.
    pub async fn finish_with_async<Fut>(&mut self, commit: Fut) -> Result<Transition>
    where
        Fut: Future<Output = Result<()>>,
    {
        if !self.permits(SessionState::Finished) {
            return Ok(Transition::Ignored);
        }
        let committed = commit.await;
        self.complete_finish(&committed);
        committed.map(|()| Transition::Applied)
    }

    /// Add `amount` to the score and emit [`SessionEvent::ScoreChanged`]
    /// carrying the new total.
    ///
    /// Ignored once the session has failed. Finished sessions still
    /// accumulate. The counter saturates at `u32::MAX`.
    pub fn add_score(&mut self, amount: u32) -> Transition {
        if !self.state.accepts_score() {
            debug!(session_id = %self.id, amount, "score ignored after failure");
            return Transition::Ignored;
        }
        self.score = self.score.saturating_add(amount);
        debug!(session_id = %self.id, amount, score = self.score, "score changed");
        self.events.emit(SessionEvent::ScoreChanged(self.score));
        Transition::Applied
    }

    /// Whether the session reached `Failed` or `Finished`.
    #[must_use]
    pub fn is_session_over(&self) -> bool {
        self.state.is_terminal()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether the session ended in failure.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == SessionState::Failed
    }

    /// Whether the session finished the level.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Session identifier used in traces.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session became active.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the session reached a terminal state.
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Time spent active: up to now while running, up to the end once over.
    /// `None` before the session starts.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        Some(self.ended_at.unwrap_or_else(Utc::now) - started)
    }

    /// Serializable view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            state: self.state,
            score: self.score,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    /// Register a callback for every session event.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Register a channel listener for every session event.
    pub fn subscribe_channel(
        &mut self,
    ) -> (
        SubscriptionId,
        tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        self.events.subscribe_channel()
    }

    /// Remove a listener. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn enter(&mut self, next: SessionState) -> bool {
        if !self.permits(next) {
            return false;
        }
        self.apply(next);
        true
    }

    fn permits(&self, next: SessionState) -> bool {
        let allowed = self.state.can_transition_to(next);
        if !allowed {
            debug!(
                session_id = %self.id,
                from = %self.state,
                to = %next,
                "transition ignored"
            );
        }
        allowed
    }

    fn apply(&mut self, next: SessionState) {
        info!(session_id = %self.id, from = %self.state, to = %next, score = self.score, "session transition");
        self.state = next;
    }

    fn complete_finish(&mut self, committed: &Result<()>) {
        if let Err(err) = committed {
            warn!(session_id = %self.id, %err, "session finished but progress was not saved");
        }
        self.apply(SessionState::Finished);
        self.ended_at = Some(Utc::now());
        self.events.emit(SessionEvent::Finished);
    }
}
