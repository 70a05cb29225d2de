use crate::motion::FramePush;
use crate::session::TurnCoordinator;
use crate::speech::UtterancePush;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one session coordinator for this service instance
    pub coordinator: Arc<TurnCoordinator>,

    /// Producer side of the edge-fed video frame slot
    pub frames: FramePush,

    /// Producer side of the edge-fed recognized utterance channel
    pub utterances: UtterancePush,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TurnCoordinator>,
        frames: FramePush,
        utterances: UtterancePush,
    ) -> Self {
        Self {
            coordinator,
            frames,
            utterances,
        }
    }
}
