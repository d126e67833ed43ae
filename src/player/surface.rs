//! Media surface command interface
//!
//! The playback session drives a host-provided surface through this narrow
//! interface instead of holding a raw handle into a UI tree.

use serde::Serialize;
use thiserror::Error;

/// Errors from the media surface
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("playback start was rejected: {0}")]
    AutoplayRejected(String),
    #[error("adaptive engine failed to attach: {0}")]
    AttachFailed(String),
}

/// Snapshot of the media clock
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MediaClock {
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    pub playback_rate: f64,
}

/// Notifications raised by the surface
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    TimeUpdate(f64),
    DurationChanged(f64),
    Playing,
    Paused,
    /// Stalled waiting for data
    Waiting,
    CanPlay,
    /// Adaptive engine finished parsing the manifest
    ManifestParsed,
    /// Directly assigned source has its first frame available
    LoadedData,
    Ended,
    Error(String),
}

/// Commands the playback session issues to its host
pub trait MediaSurface {
    /// Whether an adaptive-streaming engine is available for manifests
    fn supports_adaptive(&self) -> bool;

    /// Create an adaptive engine instance and load a manifest into it
    fn attach_adaptive(&mut self, manifest_url: &str) -> Result<(), PlaybackError>;

    /// Destroy the current adaptive engine instance, if any
    fn detach_adaptive(&mut self);

    /// Assign a source directly to the media element
    fn attach_source(&mut self, url: &str);

    /// Remove the current source
    fn detach_source(&mut self);

    fn seek(&mut self, time: f64);

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    fn set_playback_rate(&mut self, rate: f64);

    fn clock(&self) -> MediaClock;

    /// Events raised since the last poll, oldest first
    fn poll_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}
