use thiserror::Error;

/// The playback task has shut down; further commands cannot be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Playback session has stopped")]
pub struct PlaybackStopped;
