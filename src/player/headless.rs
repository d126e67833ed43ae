//! Headless media surface
//!
//! Simulates a media element with an optional adaptive engine: it keeps a
//! clock, raises the load events a real element would, and records every
//! command so tests can inspect what the session asked for.

use std::collections::VecDeque;

use super::surface::{MediaClock, MediaEvent, MediaSurface, PlaybackError};

/// Command log entry
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    AttachAdaptive(String),
    DetachAdaptive,
    AttachSource(String),
    DetachSource,
    Seek(f64),
    Play,
    Pause,
    Rate(f64),
}

/// Media surface without any real decoding
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    adaptive_supported: bool,
    reject_autoplay: bool,
    engine: Option<String>,
    source: Option<String>,
    clock: MediaClock,
    /// Duration reported once a source loads
    media_duration: f64,
    events: VecDeque<MediaEvent>,
    calls: Vec<SurfaceCall>,
}

impl HeadlessSurface {
    pub fn new(adaptive_supported: bool) -> Self {
        Self {
            adaptive_supported,
            reject_autoplay: false,
            engine: None,
            source: None,
            clock: MediaClock {
                paused: true,
                playback_rate: 1.0,
                ..MediaClock::default()
            },
            media_duration: 5400.0,
            events: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Refuse the next play request, like a browser autoplay policy
    pub fn rejecting_autoplay(mut self) -> Self {
        self.reject_autoplay = true;
        self
    }

    /// Duration reported by subsequently loaded sources
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.media_duration = seconds;
        self
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// URL the adaptive engine is playing, if attached
    pub fn engine_url(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    /// URL assigned directly, if any
    pub fn source_url(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Jump the clock (as if the user had been watching)
    pub fn set_time(&mut self, time: f64) {
        self.clock.current_time = time;
    }

    /// Advance playback by `dt` seconds of wall time
    pub fn advance(&mut self, dt: f64) {
        if self.clock.paused || (self.engine.is_none() && self.source.is_none()) {
            return;
        }
        let next = self.clock.current_time + dt * self.clock.playback_rate;
        if self.clock.duration > 0.0 && next >= self.clock.duration {
            self.clock.current_time = self.clock.duration;
            self.clock.paused = true;
            self.events.push_back(MediaEvent::TimeUpdate(self.clock.current_time));
            self.events.push_back(MediaEvent::Ended);
        } else {
            self.clock.current_time = next;
            self.events.push_back(MediaEvent::TimeUpdate(next));
        }
    }

    /// Take pending events, oldest first
    pub fn drain_events(&mut self) -> Vec<MediaEvent> {
        self.events.drain(..).collect()
    }

    fn loaded(&mut self, event: MediaEvent) {
        self.clock.current_time = 0.0;
        self.clock.duration = self.media_duration;
        self.events.push_back(MediaEvent::DurationChanged(self.media_duration));
        self.events.push_back(event);
        self.events.push_back(MediaEvent::CanPlay);
    }
}

impl MediaSurface for HeadlessSurface {
    fn supports_adaptive(&self) -> bool {
        self.adaptive_supported
    }

    fn attach_adaptive(&mut self, manifest_url: &str) -> Result<(), PlaybackError> {
        self.calls
            .push(SurfaceCall::AttachAdaptive(manifest_url.to_string()));
        if !self.adaptive_supported {
            return Err(PlaybackError::AttachFailed("no adaptive engine".into()));
        }
        // The engine takes over the element
        self.source = None;
        self.engine = Some(manifest_url.to_string());
        self.loaded(MediaEvent::ManifestParsed);
        Ok(())
    }

    fn detach_adaptive(&mut self) {
        if self.engine.take().is_some() {
            self.calls.push(SurfaceCall::DetachAdaptive);
        }
    }

    fn attach_source(&mut self, url: &str) {
        self.calls.push(SurfaceCall::AttachSource(url.to_string()));
        self.source = Some(url.to_string());
        self.loaded(MediaEvent::LoadedData);
    }

    fn detach_source(&mut self) {
        if self.source.take().is_some() {
            self.calls.push(SurfaceCall::DetachSource);
        }
        self.clock.paused = true;
    }

    fn seek(&mut self, time: f64) {
        self.calls.push(SurfaceCall::Seek(time));
        let upper = if self.clock.duration > 0.0 {
            self.clock.duration
        } else {
            f64::MAX
        };
        self.clock.current_time = time.clamp(0.0, upper);
        self.events
            .push_back(MediaEvent::TimeUpdate(self.clock.current_time));
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.calls.push(SurfaceCall::Play);
        if self.reject_autoplay {
            self.reject_autoplay = false;
            return Err(PlaybackError::AutoplayRejected("user gesture required".into()));
        }
        if self.clock.paused {
            self.clock.paused = false;
            self.events.push_back(MediaEvent::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.push(SurfaceCall::Pause);
        if !self.clock.paused {
            self.clock.paused = true;
            self.events.push_back(MediaEvent::Paused);
        }
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.calls.push(SurfaceCall::Rate(rate));
        self.clock.playback_rate = rate;
    }

    fn clock(&self) -> MediaClock {
        self.clock
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.drain_events()
    }
}
