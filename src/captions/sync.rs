//! Binds the selected caption track to the media clock
//!
//! Every track of the current batch is loaded in hidden mode: timed by the
//! player but drawn by the overlay. Only the track matching the selected
//! language is subscribed to; its cue changes replace the exposed cue list.

use tracing::debug;

use super::convert::CaptionBatch;
use super::cues::{parse_webvtt, Cue, TextTrack, TrackMode};

/// Exposes the currently visible caption lines
#[derive(Debug, Default)]
pub struct CueSynchronizer {
    tracks: Vec<TextTrack>,
    selected: Option<String>,
    subscription: Option<usize>,
    active: Vec<Cue>,
}

impl CueSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the available tracks with a new batch
    pub fn load_batch(&mut self, batch: &CaptionBatch, time: f64) {
        self.unsubscribe();
        self.tracks = batch
            .tracks()
            .iter()
            .map(|t| {
                let cues = t.content().map(|c| parse_webvtt(&c)).unwrap_or_default();
                let mut track = TextTrack::new(t.language.clone(), t.display_label.clone(), cues);
                track.mode = TrackMode::Hidden;
                track
            })
            .collect();
        for track in &mut self.tracks {
            track.advance(time);
        }
        self.subscribe();
    }

    /// Change the selected caption language (`None` turns captions off)
    pub fn select_language(&mut self, language: Option<String>) {
        self.unsubscribe();
        self.selected = language;
        self.subscribe();
    }

    /// Advance along the media clock; returns true if the visible cues changed
    pub fn on_time_update(&mut self, time: f64) -> bool {
        let mut fired = false;
        for (i, track) in self.tracks.iter_mut().enumerate() {
            let changed = track.advance(time);
            if changed && Some(i) == self.subscription {
                fired = true;
            }
        }
        if fired {
            self.refresh_active();
        }
        fired
    }

    /// Drop all tracks and subscriptions
    pub fn clear(&mut self) {
        self.unsubscribe();
        self.tracks.clear();
    }

    pub fn active_cues(&self) -> &[Cue] {
        &self.active
    }

    /// Visible caption lines, one entry per cue
    pub fn active_lines(&self) -> Vec<&str> {
        self.active.iter().map(|c| c.text.as_str()).collect()
    }

    /// Language of the track currently subscribed to
    pub fn subscribed_language(&self) -> Option<&str> {
        self.subscription
            .and_then(|i| self.tracks.get(i))
            .map(|t| t.language.as_str())
    }

    pub fn tracks(&self) -> &[TextTrack] {
        &self.tracks
    }

    fn unsubscribe(&mut self) {
        if let Some(i) = self.subscription.take() {
            debug!(track = i, "caption cue subscription dropped");
        }
        self.active.clear();
    }

    fn subscribe(&mut self) {
        let Some(language) = self.selected.as_deref() else {
            return;
        };
        self.subscription = self.tracks.iter().position(|t| t.language == language);
        if let Some(i) = self.subscription {
            debug!(track = i, language, "caption cue subscription added");
            self.refresh_active();
        }
    }

    fn refresh_active(&mut self) {
        self.active = self
            .subscription
            .and_then(|i| self.tracks.get(i))
            .map(|t| t.active_cues().into_iter().cloned().collect())
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{BlobStore, ConvertedCaptionTrack};

    const EN: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:03.000\nhello\n\n00:00:05.000 --> 00:00:06.000\nbye\n";
    const AR: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:03.000\nmarhaba\n";

    fn batch(store: &BlobStore) -> CaptionBatch {
        CaptionBatch::new(vec![
            ConvertedCaptionTrack::new("en", "English", store.create(EN)),
            ConvertedCaptionTrack::new("ar", "Arabic", store.create(AR)),
        ])
    }

    #[test]
    fn test_selected_track_drives_active_lines() {
        let store = BlobStore::new();
        let mut sync = CueSynchronizer::new();
        sync.select_language(Some("en".into()));
        sync.load_batch(&batch(&store), 0.0);
        assert_eq!(sync.subscribed_language(), Some("en"));
        assert!(sync.active_lines().is_empty());

        assert!(sync.on_time_update(1.5));
        assert_eq!(sync.active_lines(), vec!["hello"]);

        assert!(sync.on_time_update(4.0));
        assert!(sync.active_lines().is_empty());
    }

    #[test]
    fn test_unselected_tracks_do_not_fire() {
        let store = BlobStore::new();
        let mut sync = CueSynchronizer::new();
        sync.load_batch(&batch(&store), 0.0);
        assert!(!sync.on_time_update(1.5));
        assert!(sync.active_lines().is_empty());
        assert!(sync
            .tracks()
            .iter()
            .all(|t| t.mode == TrackMode::Hidden));
    }

    #[test]
    fn test_switching_language_replaces_cues() {
        let store = BlobStore::new();
        let mut sync = CueSynchronizer::new();
        sync.select_language(Some("en".into()));
        sync.load_batch(&batch(&store), 2.0);
        assert_eq!(sync.active_lines(), vec!["hello"]);

        sync.select_language(Some("ar".into()));
        assert_eq!(sync.active_lines(), vec!["marhaba"]);

        sync.select_language(None);
        assert!(sync.active_lines().is_empty());
        assert_eq!(sync.subscribed_language(), None);
    }

    #[test]
    fn test_missing_language_subscribes_nothing() {
        let store = BlobStore::new();
        let mut sync = CueSynchronizer::new();
        sync.select_language(Some("fr".into()));
        sync.load_batch(&batch(&store), 2.0);
        assert_eq!(sync.subscribed_language(), None);
        assert!(sync.active_lines().is_empty());
    }
}
