use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::{info, warn};

/// One-shot speech capture: convert the candidate's next utterance to text.
///
/// Only one capture may be outstanding at a time; starting a second one
/// fails fast rather than queueing. Every failure cause (no speech, timeout,
/// permission) is reported as the same capture error, and the coordinator
/// treats them all identically.
#[async_trait::async_trait]
pub trait SpeechCapture: Send + Sync {
    async fn capture(&self) -> Result<String>;
}

/// Capture adapter fed by the device edge.
///
/// The edge runs actual speech recognition and posts recognized utterances
/// to the control surface; `capture()` waits for the next one, up to a
/// configured timeout.
pub struct RemoteCapture {
    rx: Mutex<mpsc::Receiver<String>>,
    busy: AtomicBool,
    wait: Duration,
}

/// Cloneable producer handle for [`RemoteCapture`]
#[derive(Clone)]
pub struct UtterancePush {
    tx: mpsc::Sender<String>,
}

impl RemoteCapture {
    /// Create the adapter plus its producer handle
    pub fn channel(wait: Duration) -> (UtterancePush, RemoteCapture) {
        let (tx, rx) = mpsc::channel(8);
        (
            UtterancePush { tx },
            RemoteCapture {
                rx: Mutex::new(rx),
                busy: AtomicBool::new(false),
                wait,
            },
        )
    }
}

#[async_trait::async_trait]
impl SpeechCapture for RemoteCapture {
    async fn capture(&self) -> Result<String> {
        if self.busy.swap(true, Ordering::SeqCst) {
            warn!("Rejecting capture: one is already outstanding");
            return Err(Error::Capture("a capture is already in progress".into()));
        }

        info!("Listening for one utterance (timeout {:?})", self.wait);

        let result = {
            let mut rx = self.rx.lock().await;
            // Drop anything recognized before we started listening.
            while rx.try_recv().is_ok() {}
            timeout(self.wait, rx.recv()).await
        };
        self.busy.store(false, Ordering::SeqCst);

        match result {
            Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Some(_)) => Err(Error::Capture("nothing was recognized".into())),
            Ok(None) => Err(Error::Capture("recognition channel closed".into())),
            Err(_) => Err(Error::Capture("no speech detected".into())),
        }
    }
}

impl UtterancePush {
    /// Feed one recognized utterance to the outstanding capture.
    ///
    /// Fails when nothing is listening (no capture outstanding and the
    /// channel buffer is full).
    pub async fn push(&self, text: String) -> Result<()> {
        self.tx
            .send(text)
            .await
            .map_err(|_| Error::Capture("recognition channel closed".into()))
    }
}
