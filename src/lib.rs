pub mod ai;
pub mod config;
pub mod error;
pub mod http;
pub mod motion;
pub mod session;
pub mod speech;
pub mod store;

pub use ai::{GeminiClient, QuestionGenerator};
pub use config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use motion::{FramePush, MotionDetector, RemoteFrames, VideoFrame};
pub use session::{
    ActivePhase, CoordinatorConfig, Message, Phase, Sender, Session, TurnCoordinator,
};
pub use speech::{
    PacedSpeaker, PlaybackOutcome, RemoteCapture, SpeechCapture, SpeechPlayback, UtterancePush,
};
pub use store::{HttpStore, InterviewStore, MemoryStore, StoredInterview};
