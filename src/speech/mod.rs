pub mod capture;
pub mod playback;

pub use capture::{RemoteCapture, SpeechCapture, UtterancePush};
pub use playback::{PacedSpeaker, PlaybackOutcome, SpeechPlayback};
