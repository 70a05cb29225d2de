use thiserror::Error;

/// Error taxonomy for the interview session core
///
/// Nothing here is fatal to the process: validation and capture errors are
/// recoverable by retrying the action, upstream and auth errors by retrying
/// or restarting the session.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected locally before any state change (missing role/stack, empty answer)
    #[error("{0}")]
    Validation(String),

    /// Speech capture failed, whatever the cause (no speech, timeout, permission)
    #[error("Speech capture failed: {0}")]
    Capture(String),

    /// A generation or persistence call did not succeed
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The store rejected our credential; the client must re-authenticate
    #[error("Authentication rejected")]
    Auth,

    /// Camera or video source unavailable
    #[error("Video device unavailable: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, Error>;
