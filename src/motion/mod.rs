pub mod detector;
pub mod frame;

pub use detector::{motion_percentage, MotionDetector, CHANNEL_THRESHOLD, SAMPLE_INTERVAL};
pub use frame::{FramePush, FrameSource, RemoteFrames, VideoFrame};
