//! Player shell
//!
//! Owns everything one mounted player needs: the playback session and its
//! driver, the overlay, the input dispatcher with its cursor, and the
//! element tree the overlay is laid out into. Keys enter through
//! [`PlayerApp::handle_key`]; [`PlayerApp::tick`] fires timers and applies
//! async completions.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ambient::{AmbientColorCache, Rgb, NEUTRAL};
use crate::focus::{Dispatch, FocusId, FocusSurface, InputDispatcher, UiTree};
use crate::models::{EpisodeRef, Item, Rect, SubtitleSettings};
use crate::overlay::{OverlayCommand, OverlayFocus, OverlayOptions, PlayerOverlay};
use crate::player::{MediaSurface, PlaybackSession, SessionCommand, SessionDriver};
use crate::services::{load_subtitle_settings, save_subtitle_settings, RecordingNotifier, SettingsStore};
use crate::ui::layout::{overlay_layout, OverlayLayout};

/// What a node of the element tree stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Body(OverlayFocus),
    PanelItem(usize),
}

/// The mounted player
pub struct PlayerApp<S: MediaSurface> {
    session: PlaybackSession<S>,
    driver: SessionDriver,
    overlay: PlayerOverlay,
    dispatcher: InputDispatcher,
    tree: UiTree,
    nodes: HashMap<FocusId, Node>,
    layout: OverlayLayout,
    viewport: Rect,
    settings: Arc<dyn SettingsStore>,
    subtitle_settings: SubtitleSettings,
    notifier: Arc<RecordingNotifier>,
    ambient: Arc<AmbientColorCache>,
    ambient_tx: mpsc::UnboundedSender<(String, Rgb)>,
    ambient_rx: mpsc::UnboundedReceiver<(String, Rgb)>,
    backdrop: Rgb,
    pip: bool,
    should_quit: bool,
}

impl<S: MediaSurface> PlayerApp<S> {
    pub fn new(
        session: PlaybackSession<S>,
        driver: SessionDriver,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<RecordingNotifier>,
        ambient: Arc<AmbientColorCache>,
        viewport: Rect,
    ) -> Self {
        // Loaded once per session
        let subtitle_settings = load_subtitle_settings(settings.as_ref());
        let (ambient_tx, ambient_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            session,
            driver,
            overlay: PlayerOverlay::new(),
            dispatcher: InputDispatcher::new(viewport),
            tree: UiTree::new(viewport),
            nodes: HashMap::new(),
            layout: OverlayLayout::default(),
            viewport,
            settings,
            subtitle_settings,
            notifier,
            ambient,
            ambient_tx,
            ambient_rx,
            backdrop: NEUTRAL,
            pip: false,
            should_quit: false,
        };
        app.rebuild_tree();
        app
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn session(&self) -> &PlaybackSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PlaybackSession<S> {
        &mut self.session
    }

    pub fn overlay(&self) -> &PlayerOverlay {
        &self.overlay
    }

    pub fn dispatcher(&self) -> &InputDispatcher {
        &self.dispatcher
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn subtitle_settings(&self) -> &SubtitleSettings {
        &self.subtitle_settings
    }

    pub fn notifier(&self) -> &RecordingNotifier {
        &self.notifier
    }

    pub fn backdrop(&self) -> Rgb {
        self.backdrop
    }

    pub fn pip(&self) -> bool {
        self.pip
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start playing `item`
    pub fn open(&mut self, item: Item, episode: Option<EpisodeRef>, start_time: f64) {
        info!(item = %item.id, title = %item.title, "opening item");
        if let Some(url) = item.artwork_url.clone() {
            self.request_backdrop(url);
        } else {
            self.backdrop = NEUTRAL;
        }
        self.driver.dispatch(
            &mut self.session,
            SessionCommand::ItemChanged {
                item,
                episode,
                start_time,
            },
        );
        self.refresh_overlay();
    }

    pub fn select_episode(&mut self, episode: EpisodeRef) {
        self.driver
            .dispatch(&mut self.session, SessionCommand::EpisodeChanged(episode));
    }

    pub fn select_provider(&mut self, provider: Option<String>) {
        self.driver
            .dispatch(&mut self.session, SessionCommand::ProviderChanged(provider));
    }

    pub fn resize(&mut self, viewport: Rect) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.dispatcher.set_viewport(viewport);
            self.rebuild_tree();
        }
    }

    /// Tear the player down; pending completions become stale
    pub fn close(&mut self) {
        self.driver.dispatch(&mut self.session, SessionCommand::Teardown);
        self.should_quit = true;
    }

    /// Fire timers and apply whatever async work has completed
    pub fn tick(&mut self, now: Instant) {
        self.driver.pump(&mut self.session);
        while let Ok((url, color)) = self.ambient_rx.try_recv() {
            let current = self
                .session
                .state()
                .item
                .as_ref()
                .and_then(|i| i.artwork_url.as_deref());
            if current == Some(url.as_str()) {
                self.backdrop = color;
            }
        }
        self.dispatcher.tick(now);
        self.overlay.tick(now, self.session.state().is_playing);
        self.refresh_overlay();
    }

    /// Wait for the next async completion (resolution, captions...)
    pub async fn wait_for_completion(&mut self) -> bool {
        let applied = self.driver.next(&mut self.session).await;
        self.refresh_overlay();
        applied
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Dispatch {
        if key.kind != KeyEventKind::Press {
            return Dispatch::Unhandled;
        }
        let interrupt =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        let quit = key.code == KeyCode::Char('q') && !self.dispatcher.cursor().is_armed();
        if interrupt || quit {
            self.close();
            return Dispatch::Consumed;
        }

        self.rebuild_tree();
        let outcome = self.dispatcher.dispatch(
            key,
            now,
            &mut self.tree,
            Some(&mut self.overlay),
        );
        debug!(?outcome, key = ?key.code, "key dispatched");

        match outcome {
            Dispatch::Moved(id) => {
                if let Some(Node::Body(target)) = self.nodes.get(&id).copied() {
                    self.overlay.machine_mut().focus(target);
                }
            }
            Dispatch::CursorClick(_) | Dispatch::Activated(_) => {
                for id in self.tree.take_activations() {
                    match self.nodes.get(&id).copied() {
                        Some(Node::Body(target)) => self.overlay.activate(target, now),
                        Some(Node::PanelItem(i)) => self.overlay.activate_panel_item(i, now),
                        None => {}
                    }
                }
            }
            _ => {}
        }

        self.apply_overlay_commands();
        self.refresh_overlay();
        outcome
    }

    /// Move the pointer-emulation cursor (mouse or host driven)
    pub fn move_cursor(&mut self, x: f64, y: f64) {
        self.dispatcher.cursor_mut().move_to(x, y);
    }

    fn apply_overlay_commands(&mut self) {
        for command in self.overlay.take_commands() {
            let session_command = match command {
                OverlayCommand::TogglePlay => SessionCommand::TogglePlay,
                OverlayCommand::SeekBy(delta) => SessionCommand::SeekBy(delta),
                OverlayCommand::SetPlaybackRate(rate) => SessionCommand::SetPlaybackRate(rate),
                OverlayCommand::SelectQuality(label) => SessionCommand::QualitySelected(label),
                OverlayCommand::SelectCaption(language) => SessionCommand::CaptionSelected(language),
                OverlayCommand::AdjustSubtitles(adjust) => {
                    self.subtitle_settings = adjust.apply(self.subtitle_settings);
                    let saved =
                        save_subtitle_settings(self.settings.as_ref(), &self.subtitle_settings);
                    if let Err(e) = saved {
                        warn!(error = %e, "could not persist subtitle settings");
                    }
                    continue;
                }
                OverlayCommand::TogglePip => {
                    self.pip = !self.pip;
                    debug!(pip = self.pip, "picture in picture toggled");
                    continue;
                }
                OverlayCommand::OpenRecommendation(i) => {
                    match self.session.state().recommendations.get(i).cloned() {
                        Some(item) => self.open(item, None, 0.0),
                        None => debug!(index = i, "recommendation no longer listed"),
                    }
                    continue;
                }
            };
            self.driver.dispatch(&mut self.session, session_command);
        }
    }

    // -------------------------------------------------------------------------
    // Overlay plumbing
    // -------------------------------------------------------------------------

    fn refresh_overlay(&mut self) {
        let state = self.session.state();
        let options = OverlayOptions {
            qualities: self.session.qualities().into_iter().map(String::from).collect(),
            captions: self
                .session
                .captions()
                .tracks()
                .iter()
                .map(|t| (t.language.clone(), t.display_label.clone()))
                .collect(),
            recommendations: state.recommendations.len(),
        };
        self.overlay.set_options(options);
        self.rebuild_tree();
    }

    /// Lay the overlay out and mirror it into the element tree
    fn rebuild_tree(&mut self) {
        let focused_rec = match self.overlay.machine().focus_map().current() {
            Some(OverlayFocus::Recommendation(i)) => i,
            _ => 0,
        };
        self.layout = overlay_layout(
            self.viewport,
            &self.overlay.state(),
            self.overlay.options().recommendations,
            focused_rec,
            self.overlay.panel_len(),
            self.subtitle_settings.vertical_position_percent,
        );

        let mut tree = UiTree::new(self.viewport);
        let mut nodes = HashMap::new();
        let body = tree.add_container(tree.root(), "overlay", self.viewport);
        let focused = self.overlay.machine().focused();
        let mut focus = None;
        for (target, rect) in &self.layout.body {
            let id = tree.add_focusable(body, &format!("{:?}", target), *rect);
            nodes.insert(id, Node::Body(*target));
            if focused == Some(*target) {
                focus = Some(id);
            }
        }
        if let Some(frame) = self.layout.panel {
            let panel = tree.add_container(tree.root(), "panel", frame);
            for (i, rect) in self.layout.panel_items.iter().enumerate() {
                let id = tree.add_focusable(panel, &format!("panel-{}", i), *rect);
                nodes.insert(id, Node::PanelItem(i));
                if self.overlay.machine().panel_focus() == Some(i) {
                    focus = Some(id);
                }
            }
            tree.open_modal(panel);
        }
        if let Some(id) = focus {
            tree.focus(id);
        }
        self.tree = tree;
        self.nodes = nodes;
    }

    fn request_backdrop(&mut self, url: String) {
        if let Some(color) = self.ambient.get(&url) {
            self.backdrop = color;
            return;
        }
        self.backdrop = NEUTRAL;
        let cache = Arc::clone(&self.ambient);
        let tx = self.ambient_tx.clone();
        tokio::spawn(async move {
            let color = cache.color_for(&url).await;
            let _ = tx.send((url, color));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::{AmbientError, ArtworkSource};
    use crate::api::{RecommendationService, ResolveError, SourceResolver};
    use crate::captions::{BlobStore, CaptionError, CaptionFetcher, SubtitleConverter};
    use crate::models::{MediaType, Resolution, ResolveRequest, StreamLink};
    use crate::overlay::{Control, Panel};
    use crate::player::{HeadlessSurface, Services};
    use crate::services::{MemorySettingsStore, NoopCallbacks, StaticText};
    use async_trait::async_trait;

    struct TwoRenditions;

    #[async_trait]
    impl SourceResolver for TwoRenditions {
        async fn resolve(&self, _request: &ResolveRequest) -> Result<Resolution, ResolveError> {
            Ok(Resolution {
                links: vec![
                    StreamLink {
                        url: "https://cdn.test/720.mp4".into(),
                        quality: "720p".into(),
                        provider: "alpha".into(),
                    },
                    StreamLink {
                        url: "https://cdn.test/1080.mp4".into(),
                        quality: "1080p".into(),
                        provider: "alpha".into(),
                    },
                ],
                subtitles: Vec::new(),
                provider: "alpha".into(),
            })
        }
    }

    struct NoRecs;

    #[async_trait]
    impl RecommendationService for NoRecs {
        async fn recommendations_for(&self, _id: &str, _t: MediaType) -> anyhow::Result<Vec<Item>> {
            Ok(Vec::new())
        }
    }

    struct NoCaptions;

    #[async_trait]
    impl CaptionFetcher for NoCaptions {
        async fn fetch(&self, _url: &str) -> Result<String, CaptionError> {
            Err(CaptionError::Status(404))
        }
    }

    struct NoArtwork;

    #[async_trait]
    impl ArtworkSource for NoArtwork {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, AmbientError> {
            Err(AmbientError::Status(404))
        }
    }

    fn app() -> PlayerApp<HeadlessSurface> {
        let services = Services {
            resolver: Arc::new(TwoRenditions),
            recommendations: Arc::new(NoRecs),
            converter: SubtitleConverter::new(Arc::new(NoCaptions), BlobStore::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            callbacks: Arc::new(NoopCallbacks),
        };
        let session = PlaybackSession::new(
            HeadlessSurface::new(true),
            Arc::new(StaticText::default()),
            "en",
        );
        PlayerApp::new(
            session,
            SessionDriver::new(services),
            Arc::new(MemorySettingsStore::new()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(AmbientColorCache::new(4, Arc::new(NoArtwork))),
            Rect::new(0.0, 0.0, 120.0, 40.0),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn loaded() -> PlayerApp<HeadlessSurface> {
        let mut app = app();
        app.open(Item::new("1", MediaType::Movie, "One"), None, 0.0);
        // resolution + recommendations
        app.wait_for_completion().await;
        app.wait_for_completion().await;
        app
    }

    #[tokio::test]
    async fn test_quality_switch_from_overlay_keeps_position() {
        let mut app = loaded().await;
        let now = Instant::now();
        assert_eq!(app.session().state().active_quality.as_deref(), Some("720p"));
        app.session_mut().surface_mut().set_time(42.0);

        app.overlay.activate(OverlayFocus::Control(Control::Settings), now);
        app.overlay.machine_mut().open_sub_view(crate::overlay::SettingsView::Quality, now);
        app.tick(now + crate::overlay::PANEL_FOCUS_DELAY);
        app.handle_key(key(KeyCode::Down), now);
        app.handle_key(key(KeyCode::Enter), now);

        let state = app.session().state();
        assert_eq!(state.active_quality.as_deref(), Some("1080p"));
        assert!((state.current_time - 42.0).abs() <= 0.5);
    }

    #[tokio::test]
    async fn test_cursor_click_activates_control_under_pointer() {
        let mut app = loaded().await;
        let now = Instant::now();
        let rect = app
            .layout()
            .rect_of(OverlayFocus::Control(Control::Subtitles))
            .unwrap();
        let (x, y) = rect.center();

        for _ in 0..3 {
            app.handle_key(key(KeyCode::Enter), now);
        }
        assert!(app.dispatcher().cursor().is_armed());
        app.move_cursor(x, y);
        let outcome = app.handle_key(key(KeyCode::Enter), now);
        assert!(matches!(outcome, Dispatch::CursorClick(Some(_))));
        assert_eq!(app.overlay().state().active_panel, Panel::Subtitles);
    }

    #[tokio::test]
    async fn test_resize_keeps_cursor_armed_and_in_bounds() {
        let mut app = loaded().await;
        let now = Instant::now();
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Enter), now);
        }
        app.move_cursor(10.0, 10.0);

        app.resize(Rect::new(0.0, 0.0, 200.0, 60.0));
        assert!(app.dispatcher().cursor().is_armed());
        assert_eq!(app.dispatcher().cursor().position(), (10.0, 10.0));

        app.move_cursor(150.0, 50.0);
        app.resize(Rect::new(0.0, 0.0, 80.0, 24.0));
        assert!(app.dispatcher().cursor().is_armed());
        assert_eq!(app.dispatcher().cursor().position(), (80.0, 24.0));
    }

    #[tokio::test]
    async fn test_disarming_arrow_moves_overlay_focus() {
        let mut app = loaded().await;
        let now = Instant::now();
        assert_eq!(
            app.overlay().machine().focused(),
            Some(OverlayFocus::Control(Control::PlayPause))
        );
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Enter), now);
        }
        assert!(app.dispatcher().cursor().is_armed());

        let outcome = app.handle_key(key(KeyCode::Down), now);
        assert!(matches!(outcome, Dispatch::Moved(_)));
        assert!(!app.dispatcher().cursor().is_armed());
        assert_eq!(app.overlay().machine().focused(), Some(OverlayFocus::Progress));
    }

    #[tokio::test]
    async fn test_subtitle_adjustments_are_persisted() {
        let mut app = loaded().await;
        let now = Instant::now();
        app.overlay.activate(OverlayFocus::Control(Control::Settings), now);
        app.overlay
            .machine_mut()
            .open_sub_view(crate::overlay::SettingsView::SubtitleSettings, now);
        app.tick(now + crate::overlay::PANEL_FOCUS_DELAY);
        app.handle_key(key(KeyCode::Right), now);

        assert_eq!(app.subtitle_settings().font_size_percent, 110);
        assert_eq!(load_subtitle_settings(app.settings.as_ref()).font_size_percent, 110);
    }

    #[tokio::test]
    async fn test_quit_tears_session_down() {
        let mut app = loaded().await;
        app.handle_key(key(KeyCode::Char('q')), Instant::now());
        assert!(app.should_quit());
        assert!(app.session().state().item.is_none());
    }
}
