use tokio::sync::watch;

/// One sampled video frame (tightly packed RGB, 3 bytes per pixel)
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGB pixel data, row-major, `width * height * 3` bytes
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Number of pixels in the frame
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Whether the pixel buffer matches the declared dimensions
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.pixel_count() * 3
    }

    /// Downsample to half width and half height (floor, minimum 1) by
    /// taking every second pixel on both axes.
    pub fn downsample(&self) -> VideoFrame {
        let out_w = (self.width / 2).max(1);
        let out_h = (self.height / 2).max(1);

        let mut pixels = Vec::with_capacity((out_w * out_h * 3) as usize);
        for y in 0..out_h {
            for x in 0..out_w {
                let src_y = (y * 2).min(self.height.saturating_sub(1));
                let src_x = (x * 2).min(self.width.saturating_sub(1));
                let idx = ((src_y * self.width + src_x) * 3) as usize;
                pixels.extend_from_slice(&self.pixels[idx..idx + 3]);
            }
        }

        VideoFrame {
            width: out_w,
            height: out_h,
            pixels,
        }
    }
}

/// Source of live video frames for the motion detector
///
/// Implementations hand out the most recent frame, or `None` when no frame
/// has arrived yet. The detector never queues frames; it samples whatever is
/// current at each tick.
pub trait FrameSource: Send + Sync {
    /// Latest available frame, if any
    fn grab(&self) -> Option<VideoFrame>;
}

/// Frame source fed by the device edge over the control surface
///
/// A single-slot channel: each pushed frame replaces the previous one, so
/// the sampling loop always sees the newest frame and a slow consumer never
/// builds a backlog.
pub struct RemoteFrames {
    rx: watch::Receiver<Option<VideoFrame>>,
}

/// Cloneable producer handle for [`RemoteFrames`]
#[derive(Clone)]
pub struct FramePush {
    tx: watch::Sender<Option<VideoFrame>>,
}

impl RemoteFrames {
    /// Create the source plus its producer handle
    pub fn channel() -> (FramePush, RemoteFrames) {
        let (tx, rx) = watch::channel(None);
        (FramePush { tx }, RemoteFrames { rx })
    }
}

impl FrameSource for RemoteFrames {
    fn grab(&self) -> Option<VideoFrame> {
        self.rx.borrow().clone()
    }
}

impl FramePush {
    /// Replace the current frame (last write wins)
    pub fn push(&self, frame: VideoFrame) {
        let _ = self.tx.send(Some(frame));
    }

    /// Drop the current frame (video turned off at the edge)
    pub fn clear(&self) {
        let _ = self.tx.send(None);
    }
}
