//! Composition root tying the interaction signal, the session state machine
//! and the progress store together.
//!
//! The controller is passed around explicitly; there is no global instance.
//! Embedders that call it from several threads wrap it in one mutex and hold
//! the lock across each call, including the progress write inside
//! [`GameController::finish`].

use tracing::{info, info_span};

use crate::config::{GameConfig, DEFAULT_SCORE_STEP};
use crate::events::{SessionEvent, SubscriptionId};
use crate::models::session::SessionState;
use crate::persistence::ProgressStore;
use crate::session::{SessionSnapshot, SessionStateMachine, Transition};
use crate::Result;

/// Public lifecycle API for one play session plus cross-session progress.
#[derive(Debug)]
pub struct GameController {
    machine: SessionStateMachine,
    store: ProgressStore,
    score_step: u32,
}

impl GameController {
    /// Controller over an already-loaded progress store.
    #[must_use]
    pub fn new(store: ProgressStore) -> Self {
        Self {
            machine: SessionStateMachine::new(),
            store,
            score_step: DEFAULT_SCORE_STEP,
        }
    }

    /// Controller reading progress from the configured save file.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        let store = ProgressStore::open(config);
        info!(
            path = %config.save_path().display(),
            level = store.last_finished_level(),
            "progress loaded"
        );
        Self::new(store).with_score_step(config.score_step)
    }

    /// Override the points awarded by [`Self::add_default_score`].
    #[must_use]
    pub fn with_score_step(mut self, score_step: u32) -> Self {
        self.score_step = score_step;
        self
    }

    /// Handle the external "movement/interaction detected" signal.
    ///
    /// Same transition as [`Self::start`], named for the signal that drives
    /// it. Only the first delivery starts the session.
    pub fn on_interaction(&mut self) -> Transition {
        self.machine.start()
    }

    /// Start the session directly. Ignored unless idle.
    ///
    /// Gameplay wiring goes through [`Self::on_interaction`].
    pub fn start(&mut self) -> Transition {
        self.machine.start()
    }

    /// Fail the session. Ignored once the session is over.
    pub fn fail(&mut self) -> Transition {
        self.machine.fail()
    }

    /// Finish the session at `level`, persisting it as the last finished
    /// level before [`SessionEvent::Finished`] fires.
    ///
    /// Ignored, without writing, unless the session is active.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` when the progress write fails. The
    /// session is still `Finished` and listeners are still notified.
    pub fn finish(&mut self, level: u32) -> Result<Transition> {
        let _span = info_span!("finish", session_id = %self.machine.id(), level).entered();
        let store = &mut self.store;
        self.machine.finish_with(|| store.save(level))
    }

    /// Same as [`Self::finish`], running the progress write on a blocking
    /// worker thread. Listeners are notified only after the write completes.
    ///
    /// Dropping the future before the write completes leaves the session
    /// `Active`; calling this again writes `level` again and refreshes the
    /// cached level.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` when the progress write fails.
    pub async fn finish_async(&mut self, level: u32) -> Result<Transition> {
        info!(session_id = %self.machine.id(), level, "finishing session with background write");
        self.machine
            .finish_with_async(self.store.save_in_background(level))
            .await
    }

    /// Add `amount` points. Ignored once the session has failed.
    pub fn add_score(&mut self, amount: u32) -> Transition {
        self.machine.add_score(amount)
    }

    /// Add the configured default step (10 unless overridden).
    pub fn add_default_score(&mut self) -> Transition {
        self.machine.add_score(self.score_step)
    }

    /// Whether the session is over (failed or finished) and no longer
    /// playable.
    #[must_use]
    pub fn is_session_over(&self) -> bool {
        self.machine.is_session_over()
    }

    /// Reset persisted progress to level 0.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the zeroed record cannot be written.
    pub fn reset_progress(&mut self) -> Result<()> {
        self.store.reset()
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.machine.score()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Whether the session ended in failure.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.machine.is_failed()
    }

    /// Whether the session finished the level.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.machine.is_finished()
    }

    /// Last finished level, as cached by the progress store.
    #[must_use]
    pub fn last_finished_level(&self) -> u32 {
        self.store.last_finished_level()
    }

    /// Points awarded by [`Self::add_default_score`].
    #[must_use]
    pub fn score_step(&self) -> u32 {
        self.score_step
    }

    /// Serializable view of the current session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    /// Read-only access to the session state machine.
    #[must_use]
    pub fn session(&self) -> &SessionStateMachine {
        &self.machine
    }

    /// Register a callback for every session event.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.machine.subscribe(listener)
    }

    /// Register a channel listener for every session event.
    pub fn subscribe_channel(
        &mut self,
    ) -> (
        SubscriptionId,
        tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        self.machine.subscribe_channel()
    }

    /// Remove a listener. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.machine.unsubscribe(id)
    }
}
