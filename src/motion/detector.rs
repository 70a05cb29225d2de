use super::frame::{FrameSource, VideoFrame};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Sampling cadence for the motion loop
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Per-channel delta (0-255 scale) above which a pixel counts as changed
pub const CHANNEL_THRESHOLD: u8 = 20;

/// Fraction of pixels whose color changed beyond the threshold between two
/// equally sized frames, as a percentage clamped to `[0, 100]`.
///
/// A pixel is changed when any of its three channel deltas exceeds
/// [`CHANNEL_THRESHOLD`].
pub fn motion_percentage(prev: &VideoFrame, curr: &VideoFrame) -> f64 {
    debug_assert_eq!(prev.width, curr.width);
    debug_assert_eq!(prev.height, curr.height);

    let total = curr.pixel_count();
    if total == 0 {
        return 0.0;
    }

    let mut changed = 0usize;
    for (p, c) in prev.pixels.chunks_exact(3).zip(curr.pixels.chunks_exact(3)) {
        let delta = |a: u8, b: u8| a.abs_diff(b) > CHANNEL_THRESHOLD;
        if delta(p[0], c[0]) || delta(p[1], c[1]) || delta(p[2], c[2]) {
            changed += 1;
        }
    }

    let percentage = 100.0 * changed as f64 / total as f64;
    percentage.clamp(0.0, 100.0)
}

/// Samples a video source at a fixed cadence and publishes a bounded motion
/// score into a single-slot channel (latest sample wins, no history).
///
/// The previous-frame snapshot is owned exclusively by the sampling task.
/// The detector must be explicitly stopped on session end, restart, or
/// teardown; the loop also exits on its own if the frame source's producer
/// goes away.
pub struct MotionDetector {
    latest: watch::Receiver<f64>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MotionDetector {
    /// Start sampling the given source every [`SAMPLE_INTERVAL`].
    ///
    /// The first sample after start reports `0` and seeds the
    /// previous-frame buffer.
    pub fn start(source: Arc<dyn FrameSource>) -> Self {
        info!("Starting motion detector");

        let (tx, rx) = watch::channel(0.0);
        let running = Arc::new(AtomicBool::new(true));

        let task_running = Arc::clone(&running);
        let task = tokio::spawn(async move {
            sample_loop(source, tx, task_running).await;
        });

        Self {
            latest: rx,
            running,
            task: Mutex::new(Some(task)),
        }
    }

    /// Degraded detector for when the camera is denied or video is
    /// disabled: reports a constant `0` and performs no sampling work.
    pub fn degraded() -> Self {
        info!("Motion detector degraded: no video source, reporting constant 0");

        // The receiver keeps returning the seeded 0 after the sender drops.
        let (_tx, rx) = watch::channel(0.0);

        Self {
            latest: rx,
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Latest motion percentage (0 until the second sample lands)
    pub fn latest(&self) -> f64 {
        *self.latest.borrow()
    }

    /// Watch the motion score stream (single-slot, last sample wins)
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.latest.clone()
    }

    /// Whether the sampling loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the sampling loop to stop and wait for it to finish.
    ///
    /// After this returns, no further samples are published.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping motion detector");

        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                error!("Motion sampling task panicked: {}", e);
            }
        }
    }
}

async fn sample_loop(
    source: Arc<dyn FrameSource>,
    tx: watch::Sender<f64>,
    running: Arc<AtomicBool>,
) {
    info!("Motion sampling task started");

    let mut ticker = interval(SAMPLE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut prev: Option<VideoFrame> = None;

    loop {
        ticker.tick().await;

        if !running.load(Ordering::SeqCst) {
            break;
        }

        let Some(frame) = source.grab() else {
            continue;
        };
        if !frame.is_well_formed() {
            continue;
        }

        let current = frame.downsample();
        let percentage = match &prev {
            Some(p) if p.width == current.width && p.height == current.height => {
                motion_percentage(p, &current)
            }
            // First sample, or the source changed resolution: reseed.
            _ => 0.0,
        };

        if tx.send(percentage).is_err() {
            break;
        }

        prev = Some(current);
    }

    info!("Motion sampling task stopped");
}
