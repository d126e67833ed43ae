//! WebVTT cue parsing and text tracks
//!
//! A [`TextTrack`] is the player-side view of a converted caption document.
//! Advancing it along the media clock raises a cue-change when the set of
//! active cues differs from the previous position.

use serde::Serialize;

/// One timed caption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
    pub text: String,
}

impl Cue {
    pub fn is_active(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds
pub fn parse_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    let (clock, millis) = s.split_once('.')?;
    if millis.len() != 3 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;

    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        [m, s] => (0, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        _ => return None,
    };
    if m >= 60 || sec >= 60 {
        return None;
    }

    Some((h * 3600 + m * 60 + sec) as f64 + millis as f64 / 1000.0)
}

/// Group lines into blocks; any line that is empty after trimming separates them
fn blocks(document: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in document.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Parse a WebVTT document into cues, skipping malformed blocks
pub fn parse_webvtt(document: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for block in blocks(document) {
        let mut lines = block.into_iter();
        let Some(first) = lines.next() else {
            continue;
        };

        // Optional cue identifier before the timing line
        let timing = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(line) if line.contains("-->") => line,
                _ => continue,
            }
        };

        let Some((start, rest)) = timing.split_once("-->") else {
            continue;
        };
        // Cue settings follow the end timestamp
        let end = rest.split_whitespace().next().unwrap_or_default();
        let (Some(start), Some(end)) = (parse_timestamp(start), parse_timestamp(end)) else {
            continue;
        };

        let text = lines.collect::<Vec<_>>().join("\n");
        if end > start && !text.trim().is_empty() {
            cues.push(Cue { start, end, text });
        }
    }

    cues
}

/// How the platform treats a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackMode {
    #[default]
    Disabled,
    /// Loaded and timed, but drawn by the overlay instead of the platform
    Hidden,
}

/// Caption track bound to the media clock
#[derive(Debug, Clone)]
pub struct TextTrack {
    pub language: String,
    pub label: String,
    pub mode: TrackMode,
    cues: Vec<Cue>,
    active: Vec<usize>,
}

impl TextTrack {
    pub fn new(language: impl Into<String>, label: impl Into<String>, cues: Vec<Cue>) -> Self {
        Self {
            language: language.into(),
            label: label.into(),
            mode: TrackMode::Disabled,
            cues,
            active: Vec::new(),
        }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Currently active cues in start order
    pub fn active_cues(&self) -> Vec<&Cue> {
        self.active.iter().filter_map(|&i| self.cues.get(i)).collect()
    }

    /// Advance to `time`; returns true when the active set changed
    ///
    /// Disabled tracks are not timed and never change.
    pub fn advance(&mut self, time: f64) -> bool {
        if self.mode == TrackMode::Disabled {
            return false;
        }
        let next: Vec<usize> = self
            .cues
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_active(time))
            .map(|(i, _)| i)
            .collect();
        if next != self.active {
            self.active = next;
            true
        } else {
            false
        }
    }
}
