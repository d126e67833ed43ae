//! Runs session effects
//!
//! The session itself never awaits. Effects that need I/O are spawned on the
//! tokio runtime and their completions come back through an unbounded channel
//! as [`SessionCommand`]s tagged with the epoch they were started under.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::session::{PlaybackSession, SessionCommand, SessionEffect};
use super::surface::MediaSurface;
use crate::api::{RecommendationService, SourceResolver};
use crate::captions::SubtitleConverter;
use crate::services::{Notifier, PlayerCallbacks};

/// External collaborators the driver talks to
#[derive(Clone)]
pub struct Services {
    pub resolver: Arc<dyn SourceResolver>,
    pub recommendations: Arc<dyn RecommendationService>,
    pub converter: SubtitleConverter,
    pub notifier: Arc<dyn Notifier>,
    pub callbacks: Arc<dyn PlayerCallbacks>,
}

/// Executes effects and feeds completions back into the session
pub struct SessionDriver {
    services: Services,
    tx: mpsc::UnboundedSender<SessionCommand>,
    rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SessionDriver {
    pub fn new(services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { services, tx, rx }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Run effects; async ones complete later through the channel
    pub fn execute(&self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Resolve { epoch, request } => {
                    let resolver = Arc::clone(&self.services.resolver);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = resolver.resolve(&request).await;
                        let _ = tx.send(SessionCommand::ResolutionFinished { epoch, result });
                    });
                }
                SessionEffect::FetchRecommendations {
                    epoch,
                    item_id,
                    media_type,
                } => {
                    let service = Arc::clone(&self.services.recommendations);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let items = match service.recommendations_for(&item_id, media_type).await {
                            Ok(items) => items,
                            Err(e) => {
                                debug!(error = %e, item = %item_id, "recommendations unavailable");
                                Vec::new()
                            }
                        };
                        let _ = tx.send(SessionCommand::RecommendationsFinished { epoch, items });
                    });
                }
                SessionEffect::ConvertCaptions { epoch, descriptors } => {
                    let converter = self.services.converter.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let batch = converter.convert_batch(&descriptors).await;
                        // A closed channel drops the batch, which revokes it
                        if tx.send(SessionCommand::CaptionsReceived { epoch, batch }).is_err() {
                            warn!(epoch, "session gone before captions arrived");
                        }
                    });
                }
                SessionEffect::Notify { message, severity } => {
                    self.services.notifier.notify(&message, severity);
                }
                SessionEffect::ProviderSelected(provider) => {
                    self.services.callbacks.provider_selected(&provider);
                }
                SessionEffect::FetchStateChanged(fetching) => {
                    self.services.callbacks.fetch_state_changed(fetching);
                }
                SessionEffect::EpisodeSelected(episode) => {
                    self.services.callbacks.episode_selected(episode);
                }
            }
        }
    }

    /// Apply a command and run whatever it asks for
    pub fn dispatch<S: MediaSurface>(&self, session: &mut PlaybackSession<S>, command: SessionCommand) {
        let effects = session.handle(command);
        self.execute(effects);
        let effects = session.sync_media();
        self.execute(effects);
    }

    /// Drain completions that are already waiting; returns how many were applied
    pub fn pump<S: MediaSurface>(&mut self, session: &mut PlaybackSession<S>) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.rx.try_recv() {
            let effects = session.handle(command);
            self.execute(effects);
            applied += 1;
        }
        let effects = session.sync_media();
        self.execute(effects);
        applied
    }

    /// Wait for the next completion and apply it
    pub async fn next<S: MediaSurface>(&mut self, session: &mut PlaybackSession<S>) -> bool {
        let Some(command) = self.rx.recv().await else {
            return false;
        };
        self.dispatch(session, command);
        true
    }
}
