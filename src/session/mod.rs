//! Interview session management
//!
//! This module provides the session state machine and the `TurnCoordinator`
//! that drives it:
//! - Session, message, and phase types
//! - Turn orchestration (speech capture/playback, question generation)
//! - Transcript persistence after every mutation
//! - Stale-completion discarding across restarts

mod coordinator;
mod model;

pub use coordinator::{CoordinatorConfig, TurnCoordinator};
pub use model::{ActivePhase, Message, Phase, Sender, Session};
