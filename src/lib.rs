#![forbid(unsafe_code)]

//! Play-session lifecycle tracking with durable level progress.
//!
//! A [`GameController`] drives one [`session::SessionStateMachine`]
//! (idle, active, then failed or finished), notifies registered listeners
//! of every transition and score change, and records the last finished
//! level through a [`persistence::ProgressStore`].

pub mod cli;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod models;
pub mod persistence;
pub mod session;

pub use config::GameConfig;
pub use controller::GameController;
pub use errors::{AppError, Result};
pub use events::SessionEvent;
pub use models::progress::ProgressRecord;
pub use models::session::SessionState;
pub use session::Transition;
