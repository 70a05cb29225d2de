use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::time::sleep;
use tracing::info;

/// How an utterance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The utterance played to the end
    Completed,
    /// A newer utterance (or a cancel) cut this one off
    Interrupted,
}

/// Interruptible speech playback: at most one utterance audible at a time.
///
/// `speak` cancels whatever is currently playing before starting the new
/// utterance, and signals completion exactly once: the interrupted call
/// resolves `Interrupted`, never `Completed`.
#[async_trait::async_trait]
pub trait SpeechPlayback: Send + Sync {
    async fn speak(&self, text: &str) -> Result<PlaybackOutcome>;

    /// Stop the current utterance without starting a new one
    /// (session end, logout).
    async fn cancel(&self);
}

/// Playback adapter that paces utterances by length.
///
/// Synthesis itself happens at the device edge; the service holds the floor
/// for the utterance's estimated duration so turn handover only happens
/// after the interviewer has finished speaking.
pub struct PacedSpeaker {
    words_per_minute: u32,
    current: Mutex<Option<(u64, oneshot::Sender<()>)>>,
    next_id: AtomicU64,
}

impl PacedSpeaker {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            current: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Estimated time to speak `text` at the configured rate
    pub fn utterance_duration(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        let ms_per_word = 60_000 / self.words_per_minute as u64;
        Duration::from_millis(words * ms_per_word)
    }

    /// Interrupt the current utterance, replacing it with `replacement`
    async fn swap_current(&self, replacement: Option<(u64, oneshot::Sender<()>)>) {
        let mut current = self.current.lock().await;
        if let Some((_, interrupt)) = current.take() {
            let _ = interrupt.send(());
        }
        *current = replacement;
    }
}

#[async_trait::async_trait]
impl SpeechPlayback for PacedSpeaker {
    async fn speak(&self, text: &str) -> Result<PlaybackOutcome> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.swap_current(Some((id, tx))).await;

        let duration = self.utterance_duration(text);
        info!("Speaking ({} words, ~{:?})", text.split_whitespace().count(), duration);

        tokio::select! {
            _ = sleep(duration) => {
                // Release the slot, but only if a newer utterance hasn't
                // already claimed it.
                let mut current = self.current.lock().await;
                if matches!(current.as_ref(), Some((held, _)) if *held == id) {
                    *current = None;
                }
                Ok(PlaybackOutcome::Completed)
            }
            _ = rx => Ok(PlaybackOutcome::Interrupted),
        }
    }

    async fn cancel(&self) {
        self.swap_current(None).await;
    }
}
