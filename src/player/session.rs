//! Playback session reducer
//!
//! One [`PlaybackSession`] owns the lifecycle of one playable item: source
//! resolution, the active rendition, caption batches and the media clock.
//! Inputs arrive as discrete [`SessionCommand`]s; side effects that need I/O
//! are returned as [`SessionEffect`]s for the driver to run. Every async
//! completion carries the fetch epoch it was started under and is ignored
//! once a newer request exists.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::surface::{MediaEvent, MediaSurface};
use crate::api::ResolveError;
use crate::captions::{CaptionBatch, CueSynchronizer};
use crate::models::{
    EpisodeRef, Item, MediaType, Resolution, ResolveRequest, Severity,
    StreamLink, SubtitleDescriptor,
};
use crate::services::TextLookup;

/// Seek step for the progress bar, in seconds
pub const SEEK_STEP: f64 = 5.0;

/// Speeds offered in the settings panel
pub const PLAYBACK_RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Inputs to the session
#[derive(Debug)]
pub enum SessionCommand {
    /// A new item was selected; `start_time` is where playback should begin
    ItemChanged {
        item: Item,
        episode: Option<EpisodeRef>,
        start_time: f64,
    },
    EpisodeChanged(EpisodeRef),
    ProviderChanged(Option<String>),
    ServerPreferencesChanged(Vec<String>),
    ResolutionFinished {
        epoch: u64,
        result: Result<Resolution, ResolveError>,
    },
    RecommendationsFinished {
        epoch: u64,
        items: Vec<Item>,
    },
    CaptionsReceived {
        epoch: u64,
        batch: CaptionBatch,
    },
    QualitySelected(String),
    CaptionSelected(Option<String>),
    TogglePlay,
    SeekBy(f64),
    SeekTo(f64),
    SetPlaybackRate(f64),
    Media(MediaEvent),
    Teardown,
}

/// Side effects requested by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Resolve {
        epoch: u64,
        request: ResolveRequest,
    },
    FetchRecommendations {
        epoch: u64,
        item_id: String,
        media_type: MediaType,
    },
    ConvertCaptions {
        epoch: u64,
        descriptors: Vec<SubtitleDescriptor>,
    },
    Notify {
        message: String,
        severity: Severity,
    },
    ProviderSelected(String),
    FetchStateChanged(bool),
    EpisodeSelected(EpisodeRef),
}

/// Observable session state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSessionState {
    pub item: Option<Item>,
    pub episode: Option<EpisodeRef>,
    pub provider: Option<String>,
    pub server_preferences: Vec<String>,
    /// Strictly increasing per resolution request
    pub fetch_epoch: u64,
    pub active_stream_url: Option<String>,
    pub active_quality: Option<String>,
    pub stream_links: Vec<StreamLink>,
    pub subtitles: Vec<SubtitleDescriptor>,
    /// Provider that produced the current links
    pub resolved_provider: Option<String>,
    pub recommendations: Vec<Item>,
    pub is_buffering: bool,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    /// Position to resume at across a rendition swap
    pub pending_resume_time: Option<f64>,
    pub playback_rate: f64,
    pub error: Option<String>,
}

impl Default for PlaybackSessionState {
    fn default() -> Self {
        Self {
            item: None,
            episode: None,
            provider: None,
            server_preferences: Vec::new(),
            fetch_epoch: 0,
            active_stream_url: None,
            active_quality: None,
            stream_links: Vec::new(),
            subtitles: Vec::new(),
            resolved_provider: None,
            recommendations: Vec::new(),
            is_buffering: false,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            pending_resume_time: None,
            playback_rate: 1.0,
            error: None,
        }
    }
}

/// Where the media attach sequence stands
#[derive(Debug, Clone, Copy, PartialEq)]
enum AttachPhase {
    Idle,
    /// Adaptive engine attached; seek once the manifest is parsed
    AwaitingManifest { resume: f64 },
    /// Source assigned directly; seek once data is available
    AwaitingData { resume: f64 },
    Ready,
}

/// Reducer for one mounted player
pub struct PlaybackSession<S: MediaSurface> {
    state: PlaybackSessionState,
    surface: S,
    text: Arc<dyn TextLookup>,
    locale: String,
    initial_time: f64,
    attach: AttachPhase,
    adaptive_attached: bool,
    captions: CaptionBatch,
    cues: CueSynchronizer,
    selected_caption: Option<String>,
    /// A resolution is outstanding
    fetching: bool,
}

impl<S: MediaSurface> PlaybackSession<S> {
    pub fn new(surface: S, text: Arc<dyn TextLookup>, locale: impl Into<String>) -> Self {
        Self {
            state: PlaybackSessionState::default(),
            surface,
            text,
            locale: locale.into(),
            initial_time: 0.0,
            attach: AttachPhase::Idle,
            adaptive_attached: false,
            captions: CaptionBatch::empty(),
            cues: CueSynchronizer::new(),
            selected_caption: None,
            fetching: false,
        }
    }

    /// Seed provider and server preferences before the first item
    pub fn with_preferences(mut self, provider: Option<String>, servers: Vec<String>) -> Self {
        self.state.provider = provider;
        self.state.server_preferences = servers;
        self
    }

    pub fn state(&self) -> &PlaybackSessionState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn captions(&self) -> &CaptionBatch {
        &self.captions
    }

    pub fn cues(&self) -> &CueSynchronizer {
        &self.cues
    }

    pub fn selected_caption(&self) -> Option<&str> {
        self.selected_caption.as_deref()
    }

    pub fn text(&self) -> &dyn TextLookup {
        self.text.as_ref()
    }

    /// Quality labels of the current links, in resolver order
    pub fn qualities(&self) -> Vec<&str> {
        self.state
            .stream_links
            .iter()
            .map(|l| l.quality.as_str())
            .collect()
    }

    /// Feed pending surface events through the reducer until none are left
    ///
    /// Handling an event may issue commands (seek, play) that raise more
    /// events, so the surface is polled again until it goes quiet.
    pub fn sync_media(&mut self) -> Vec<SessionEffect> {
        const MAX_ROUNDS: usize = 8;
        let mut effects = Vec::new();
        for _ in 0..MAX_ROUNDS {
            let events = self.surface.poll_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                effects.extend(self.handle(SessionCommand::Media(event)));
            }
        }
        effects
    }

    /// Apply one command
    pub fn handle(&mut self, command: SessionCommand) -> Vec<SessionEffect> {
        match command {
            SessionCommand::ItemChanged {
                item,
                episode,
                start_time,
            } => {
                let unchanged = self.state.item.as_ref().map(|i| &i.id) == Some(&item.id)
                    && self.state.episode == episode;
                if unchanged {
                    return Vec::new();
                }
                self.state.item = Some(item);
                self.state.episode = episode;
                self.state.current_time = 0.0;
                self.state.duration = 0.0;
                self.initial_time = start_time.max(0.0);
                self.start_resolution()
            }
            SessionCommand::EpisodeChanged(episode) => {
                if self.state.episode == Some(episode) || self.state.item.is_none() {
                    return Vec::new();
                }
                self.state.episode = Some(episode);
                self.state.current_time = 0.0;
                self.state.duration = 0.0;
                self.initial_time = 0.0;
                let mut effects = vec![SessionEffect::EpisodeSelected(episode)];
                effects.extend(self.start_resolution());
                effects
            }
            SessionCommand::ProviderChanged(provider) => {
                if self.state.provider == provider {
                    return Vec::new();
                }
                self.state.provider = provider;
                self.restart_in_place()
            }
            SessionCommand::ServerPreferencesChanged(servers) => {
                if self.state.server_preferences == servers {
                    return Vec::new();
                }
                self.state.server_preferences = servers;
                self.restart_in_place()
            }
            SessionCommand::ResolutionFinished { epoch, result } => {
                if epoch != self.state.fetch_epoch {
                    debug!(epoch, current = self.state.fetch_epoch, "discarding stale resolution");
                    return Vec::new();
                }
                self.apply_resolution(result)
            }
            SessionCommand::RecommendationsFinished { epoch, items } => {
                if epoch == self.state.fetch_epoch {
                    self.state.recommendations = items;
                } else {
                    debug!(epoch, "discarding stale recommendations");
                }
                Vec::new()
            }
            SessionCommand::CaptionsReceived { epoch, batch } => {
                if epoch != self.state.fetch_epoch {
                    // Dropping the stale batch revokes its resources
                    debug!(epoch, tracks = batch.len(), "discarding stale caption batch");
                    return Vec::new();
                }
                self.apply_captions(batch);
                Vec::new()
            }
            SessionCommand::QualitySelected(label) => {
                self.switch_quality(&label);
                Vec::new()
            }
            SessionCommand::CaptionSelected(language) => {
                self.selected_caption = language.clone();
                self.cues.select_language(language);
                Vec::new()
            }
            SessionCommand::TogglePlay => {
                if self.surface.clock().paused {
                    self.try_play();
                } else {
                    self.surface.pause();
                }
                Vec::new()
            }
            SessionCommand::SeekBy(delta) => {
                let now = self.surface.clock().current_time;
                self.seek_clamped(now + delta);
                Vec::new()
            }
            SessionCommand::SeekTo(time) => {
                self.seek_clamped(time);
                Vec::new()
            }
            SessionCommand::SetPlaybackRate(rate) => {
                if rate > 0.0 {
                    self.surface.set_playback_rate(rate);
                    self.state.playback_rate = rate;
                }
                Vec::new()
            }
            SessionCommand::Media(event) => {
                self.on_media_event(event);
                Vec::new()
            }
            SessionCommand::Teardown => self.teardown(),
        }
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Re-resolve the same item, resuming where playback was
    fn restart_in_place(&mut self) -> Vec<SessionEffect> {
        if self.state.item.is_none() {
            return Vec::new();
        }
        if self.state.active_stream_url.is_some() {
            self.initial_time = self.surface.clock().current_time;
        }
        self.start_resolution()
    }

    fn start_resolution(&mut self) -> Vec<SessionEffect> {
        let Some(item) = self.state.item.clone() else {
            return Vec::new();
        };

        self.state.fetch_epoch += 1;
        let epoch = self.state.fetch_epoch;

        self.detach_media();
        self.drop_captions();
        self.state.is_buffering = true;
        self.state.stream_links.clear();
        self.state.subtitles.clear();
        self.state.active_quality = None;
        self.state.resolved_provider = None;
        self.state.recommendations.clear();
        self.state.error = None;

        info!(item = %item.id, epoch, "resolving sources");
        self.fetching = true;

        let request = ResolveRequest {
            item_id: item.id.clone(),
            media_type: item.media_type,
            episode: self.state.episode,
            provider: self.state.provider.clone(),
            server_preferences: self.state.server_preferences.clone(),
        };

        vec![
            SessionEffect::FetchStateChanged(true),
            SessionEffect::Resolve { epoch, request },
            SessionEffect::FetchRecommendations {
                epoch,
                item_id: item.id,
                media_type: item.media_type,
            },
        ]
    }

    fn apply_resolution(&mut self, result: Result<Resolution, ResolveError>) -> Vec<SessionEffect> {
        self.fetching = false;
        let mut effects = vec![SessionEffect::FetchStateChanged(false)];

        let resolution = match result {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "source resolution failed");
                let error = e.to_string();
                let message = self
                    .text
                    .text("player.resolve_failed", &[("error", error.as_str())]);
                self.fail(message.clone());
                effects.push(SessionEffect::Notify {
                    message,
                    severity: Severity::Error,
                });
                return effects;
            }
        };

        let Some(first) = resolution.links.first().cloned() else {
            let title = self
                .state
                .item
                .as_ref()
                .map(|i| i.title.clone())
                .unwrap_or_default();
            let message = self
                .text
                .text("player.no_sources", &[("title", title.as_str())]);
            self.fail(message.clone());
            effects.push(SessionEffect::Notify {
                message,
                severity: Severity::Error,
            });
            return effects;
        };

        info!(
            links = resolution.links.len(),
            provider = %resolution.provider,
            quality = %first.quality,
            "sources resolved"
        );

        self.state.stream_links = resolution.links;
        self.state.subtitles = resolution.subtitles;
        self.state.active_quality = Some(first.quality.clone());
        self.state.resolved_provider = Some(resolution.provider.clone());
        self.set_active_link(first);

        effects.push(SessionEffect::ProviderSelected(resolution.provider));
        if !self.state.subtitles.is_empty() {
            effects.push(SessionEffect::ConvertCaptions {
                epoch: self.state.fetch_epoch,
                descriptors: self.state.subtitles.clone(),
            });
        }
        effects
    }

    fn fail(&mut self, message: String) {
        self.state.is_buffering = false;
        self.state.active_stream_url = None;
        self.state.error = Some(message);
    }

    // -------------------------------------------------------------------------
    // Media attach
    // -------------------------------------------------------------------------

    /// Swap the active rendition and run the attach sequence
    fn set_active_link(&mut self, link: StreamLink) {
        if self.adaptive_attached {
            self.surface.detach_adaptive();
            self.adaptive_attached = false;
        }

        // Consumed by this swap
        let resume = self
            .state
            .pending_resume_time
            .take()
            .unwrap_or(self.initial_time);

        let url = link.url.clone();
        self.state.active_stream_url = Some(url.clone());
        self.state.is_buffering = true;

        if link.is_manifest() && self.surface.supports_adaptive() {
            match self.surface.attach_adaptive(&url) {
                Ok(()) => {
                    debug!(%url, resume, "adaptive engine attached");
                    self.adaptive_attached = true;
                    self.attach = AttachPhase::AwaitingManifest { resume };
                    return;
                }
                Err(e) => warn!(error = %e, "adaptive attach failed, assigning source directly"),
            }
        }

        debug!(%url, resume, "source assigned");
        self.surface.attach_source(&url);
        self.attach = AttachPhase::AwaitingData { resume };
    }

    fn finish_attach(&mut self, resume: f64) {
        if resume > 0.0 {
            self.surface.seek(resume);
        }
        self.attach = AttachPhase::Ready;
        self.try_play();
    }

    /// Start playback; a rejection is logged only
    fn try_play(&mut self) {
        if let Err(e) = self.surface.play() {
            warn!(error = %e, "playback start rejected");
        }
    }

    fn detach_media(&mut self) {
        if self.adaptive_attached {
            self.surface.detach_adaptive();
            self.adaptive_attached = false;
        }
        self.surface.detach_source();
        self.attach = AttachPhase::Idle;
        self.state.active_stream_url = None;
        self.state.is_playing = false;
    }

    fn switch_quality(&mut self, label: &str) {
        let Some(link) = self
            .state
            .stream_links
            .iter()
            .find(|l| l.quality == label)
            .cloned()
        else {
            debug!(label, "no rendition with that quality");
            return;
        };
        if self.state.active_stream_url.as_deref() == Some(link.url.as_str()) {
            return;
        }

        let position = self.surface.clock().current_time;
        info!(from = ?self.state.active_quality, to = label, position, "switching quality");
        self.state.pending_resume_time = Some(position);
        self.state.active_quality = Some(link.quality.clone());
        self.set_active_link(link);
    }

    fn seek_clamped(&mut self, target: f64) {
        if self.state.active_stream_url.is_none() {
            return;
        }
        let duration = self.surface.clock().duration;
        let upper = if duration > 0.0 { duration } else { f64::MAX };
        self.surface.seek(target.clamp(0.0, upper));
    }

    fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate(time) => {
                self.state.current_time = time;
                self.cues.on_time_update(time);
            }
            MediaEvent::DurationChanged(duration) => self.state.duration = duration,
            MediaEvent::Playing => {
                self.state.is_playing = true;
                self.state.is_buffering = false;
            }
            MediaEvent::Paused | MediaEvent::Ended => self.state.is_playing = false,
            MediaEvent::Waiting => self.state.is_buffering = true,
            MediaEvent::CanPlay => self.state.is_buffering = false,
            MediaEvent::ManifestParsed => {
                if let AttachPhase::AwaitingManifest { resume } = self.attach {
                    self.finish_attach(resume);
                }
            }
            MediaEvent::LoadedData => {
                if let AttachPhase::AwaitingData { resume } = self.attach {
                    self.finish_attach(resume);
                }
            }
            MediaEvent::Error(message) => {
                warn!(%message, "media error");
                self.state.is_buffering = false;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Captions
    // -------------------------------------------------------------------------

    fn apply_captions(&mut self, batch: CaptionBatch) {
        // The previous batch is dropped (and revoked) here
        self.captions = batch;
        self.selected_caption = self.captions.default_language(&self.locale);
        debug!(
            tracks = self.captions.len(),
            selected = ?self.selected_caption,
            "caption batch applied"
        );
        self.cues.load_batch(&self.captions, self.state.current_time);
        self.cues.select_language(self.selected_caption.clone());
    }

    fn drop_captions(&mut self) {
        self.cues.clear();
        self.captions = CaptionBatch::empty();
        self.selected_caption = None;
    }

    /// Reset to idle; a resolution still in flight clears the host's fetch indicator
    fn teardown(&mut self) -> Vec<SessionEffect> {
        // Bump the epoch so in-flight completions land as stale
        self.state.fetch_epoch += 1;
        self.detach_media();
        self.drop_captions();
        let epoch = self.state.fetch_epoch;
        self.state = PlaybackSessionState {
            fetch_epoch: epoch,
            provider: self.state.provider.take(),
            server_preferences: std::mem::take(&mut self.state.server_preferences),
            ..PlaybackSessionState::default()
        };
        self.initial_time = 0.0;

        if std::mem::take(&mut self.fetching) {
            vec![SessionEffect::FetchStateChanged(false)]
        } else {
            Vec::new()
        }
    }
}

impl<S: MediaSurface> Drop for PlaybackSession<S> {
    fn drop(&mut self) {
        if self.adaptive_attached {
            self.surface.detach_adaptive();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{BlobStore, ConvertedCaptionTrack};
    use crate::player::headless::{HeadlessSurface, SurfaceCall};
    use crate::services::StaticText;

    fn session() -> PlaybackSession<HeadlessSurface> {
        PlaybackSession::new(HeadlessSurface::new(true), Arc::new(StaticText::default()), "ar")
    }

    fn item(id: &str) -> Item {
        Item::new(id, MediaType::Movie, format!("Movie {}", id))
    }

    fn link(quality: &str, url: &str) -> StreamLink {
        StreamLink {
            url: url.into(),
            quality: quality.into(),
            provider: "alpha".into(),
        }
    }

    fn resolution(links: Vec<StreamLink>) -> Resolution {
        Resolution {
            links,
            subtitles: Vec::new(),
            provider: "alpha".into(),
        }
    }

    fn select(s: &mut PlaybackSession<HeadlessSurface>, id: &str) -> u64 {
        s.handle(SessionCommand::ItemChanged {
            item: item(id),
            episode: None,
            start_time: 0.0,
        });
        s.state().fetch_epoch
    }

    #[test]
    fn test_item_change_requests_resolution() {
        let mut s = session();
        let effects = s.handle(SessionCommand::ItemChanged {
            item: item("42"),
            episode: None,
            start_time: 0.0,
        });
        assert!(s.state().is_buffering);
        assert_eq!(effects[0], SessionEffect::FetchStateChanged(true));
        assert!(matches!(&effects[1], SessionEffect::Resolve { epoch: 1, request } if request.item_id == "42"));
        assert!(matches!(&effects[2], SessionEffect::FetchRecommendations { epoch: 1, .. }));
    }

    #[test]
    fn test_same_item_does_not_refetch() {
        let mut s = session();
        select(&mut s, "42");
        let effects = s.handle(SessionCommand::ItemChanged {
            item: item("42"),
            episode: None,
            start_time: 0.0,
        });
        assert!(effects.is_empty());
        assert_eq!(s.state().fetch_epoch, 1);
    }

    #[test]
    fn test_stale_resolution_is_discarded() {
        let mut s = session();
        let first = select(&mut s, "1");
        let second = select(&mut s, "2");
        assert!(second > first);

        let effects = s.handle(SessionCommand::ResolutionFinished {
            epoch: first,
            result: Ok(resolution(vec![link("720p", "https://cdn/one.mp4")])),
        });
        assert!(effects.is_empty());
        assert!(s.state().active_stream_url.is_none());
        assert!(s.state().stream_links.is_empty());

        s.handle(SessionCommand::ResolutionFinished {
            epoch: second,
            result: Ok(resolution(vec![link("1080p", "https://cdn/two.mp4")])),
        });
        assert_eq!(s.state().active_stream_url.as_deref(), Some("https://cdn/two.mp4"));
        assert_eq!(s.state().active_quality.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_zero_links_notifies_and_clears_buffering() {
        let mut s = session();
        let epoch = select(&mut s, "1");
        let effects = s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(Vec::new())),
        });
        assert!(!s.state().is_buffering);
        assert!(s.state().active_stream_url.is_none());
        assert!(effects.iter().any(|e| matches!(
            e,
            SessionEffect::Notify { severity: Severity::Error, message } if message.contains("Movie 1")
        )));
    }

    #[test]
    fn test_resolution_error_surfaces_message() {
        let mut s = session();
        let epoch = select(&mut s, "1");
        let effects = s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Err(ResolveError::Status(502)),
        });
        assert!(!s.state().is_buffering);
        let notes: Vec<_> = effects
            .iter()
            .filter(|e| matches!(e, SessionEffect::Notify { .. }))
            .collect();
        assert_eq!(notes.len(), 1);
        assert!(s.state().error.as_deref().unwrap_or_default().contains("502"));
    }

    #[test]
    fn test_manifest_seeks_after_parse() {
        let mut s = session();
        s.handle(SessionCommand::ItemChanged {
            item: item("1"),
            episode: None,
            start_time: 30.0,
        });
        let epoch = s.state().fetch_epoch;
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("auto", "https://cdn/master.m3u8")])),
        });
        assert_eq!(s.surface().engine_url(), Some("https://cdn/master.m3u8"));
        assert!(!s.surface().calls().contains(&SurfaceCall::Seek(30.0)));

        s.sync_media();
        assert!(s.surface().calls().contains(&SurfaceCall::Seek(30.0)));
        assert!(s.state().is_playing);
        assert!(!s.state().is_buffering);
    }

    #[test]
    fn test_manifest_without_adaptive_support_assigns_directly() {
        let mut s = PlaybackSession::new(
            HeadlessSurface::new(false),
            Arc::new(StaticText::default()),
            "en",
        );
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("auto", "https://cdn/master.m3u8")])),
        });
        assert_eq!(s.surface().engine_url(), None);
        assert_eq!(s.surface().source_url(), Some("https://cdn/master.m3u8"));
    }

    #[test]
    fn test_quality_switch_preserves_position() {
        let mut s = session();
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![
                link("720p", "https://cdn/720.mp4"),
                link("1080p", "https://cdn/1080.mp4"),
            ])),
        });
        s.sync_media();
        s.surface_mut().set_time(42.0);

        s.handle(SessionCommand::QualitySelected("1080p".into()));
        assert_eq!(s.state().active_quality.as_deref(), Some("1080p"));
        assert_eq!(s.state().pending_resume_time, None, "consumed by the swap");
        s.sync_media();

        let clock = s.surface().clock();
        assert!((clock.current_time - 42.0).abs() <= 0.5);
        assert_eq!(s.surface().source_url(), Some("https://cdn/1080.mp4"));
    }

    #[test]
    fn test_quality_switch_to_same_url_is_noop() {
        let mut s = session();
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("720p", "https://cdn/720.mp4")])),
        });
        s.sync_media();
        s.surface_mut().clear_calls();
        s.handle(SessionCommand::QualitySelected("720p".into()));
        s.handle(SessionCommand::QualitySelected("4k".into()));
        assert!(s.surface().calls().is_empty());
    }

    #[test]
    fn test_autoplay_rejection_is_not_surfaced() {
        let mut s = PlaybackSession::new(
            HeadlessSurface::new(true).rejecting_autoplay(),
            Arc::new(StaticText::default()),
            "en",
        );
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("720p", "https://cdn/720.mp4")])),
        });
        let effects = s.sync_media();
        assert!(effects.is_empty());
        assert!(!s.state().is_playing);
        assert!(s.state().error.is_none());

        // A manual toggle still starts playback
        s.handle(SessionCommand::TogglePlay);
        s.sync_media();
        assert!(s.state().is_playing);
    }

    fn batch(store: &BlobStore, langs: &[&str]) -> CaptionBatch {
        CaptionBatch::new(
            langs
                .iter()
                .map(|l| {
                    ConvertedCaptionTrack::new(
                        *l,
                        *l,
                        store.create("WEBVTT\n\n00:00:00.000 --> 00:00:10.000\nhi\n"),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_default_caption_follows_locale() {
        let store = BlobStore::new();
        let mut s = session();
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::CaptionsReceived {
            epoch,
            batch: batch(&store, &["en", "ar"]),
        });
        assert_eq!(s.selected_caption(), Some("ar"));
        assert_eq!(s.cues().subscribed_language(), Some("ar"));

        let epoch = select(&mut s, "2");
        s.handle(SessionCommand::CaptionsReceived {
            epoch,
            batch: batch(&store, &["en", "fr"]),
        });
        assert_eq!(s.selected_caption(), None);
        assert!(s.cues().active_cues().is_empty());
    }

    #[test]
    fn test_caption_batches_release_resources() {
        let store = BlobStore::new();
        let mut s = session();
        let epoch = select(&mut s, "1");
        for n in 1..=5 {
            s.handle(SessionCommand::CaptionsReceived {
                epoch,
                batch: batch(&store, &vec!["en"; n]),
            });
            assert_eq!(store.live_count(), n);
        }

        // Stale batches are released immediately
        s.handle(SessionCommand::CaptionsReceived {
            epoch: epoch - 1,
            batch: batch(&store, &["de", "it"]),
        });
        assert_eq!(store.live_count(), 5);

        s.handle(SessionCommand::Teardown);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.revoked_count(), store.created_count());
    }

    #[test]
    fn test_teardown_ignores_inflight_results() {
        let mut s = session();
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::Teardown);
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("720p", "https://cdn/720.mp4")])),
        });
        assert!(s.state().active_stream_url.is_none());
        assert!(s.state().item.is_none());
    }

    #[test]
    fn test_episode_change_reports_selection() {
        let mut s = session();
        select(&mut s, "show");
        let ep = EpisodeRef {
            season: 1,
            episode: 2,
        };
        let effects = s.handle(SessionCommand::EpisodeChanged(ep));
        assert_eq!(effects[0], SessionEffect::EpisodeSelected(ep));
        assert!(matches!(&effects[2], SessionEffect::Resolve { request, .. } if request.episode == Some(ep)));
    }

    #[test]
    fn test_provider_change_resumes_position() {
        let mut s = session();
        let epoch = select(&mut s, "1");
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("720p", "https://cdn/a.mp4")])),
        });
        s.sync_media();
        s.surface_mut().set_time(100.0);

        s.handle(SessionCommand::ProviderChanged(Some("beta".into())));
        let epoch = s.state().fetch_epoch;
        s.handle(SessionCommand::ResolutionFinished {
            epoch,
            result: Ok(resolution(vec![link("720p", "https://cdn/b.mp4")])),
        });
        s.sync_media();
        assert!((s.surface().clock().current_time - 100.0).abs() <= 0.5);
    }
}
