//! Caption fetching and conversion
//!
//! Fetches raw SubRip payloads, rewrites their timestamps from
//! `00:00:00,000` to `00:00:00.000`, prepends the `WEBVTT` header and wraps
//! the result in a transient resource. One bad track never sinks the batch.

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};

use super::store::{BlobHandle, BlobStore};
use super::normalize_language;
use crate::models::SubtitleDescriptor;

/// Errors for a single caption track
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("caption server returned HTTP {0}")]
    Status(u16),
    #[error("caption payload has no cues")]
    NoCues,
}

/// Source of raw caption payloads
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CaptionError>;
}

/// Fetch captions over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpCaptionFetcher {
    client: reqwest::Client,
}

impl HttpCaptionFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaptionFetcher for HttpCaptionFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CaptionError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CaptionError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

fn timestamp_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2}:)?(\d{2}:\d{2})[,.](\d{3})").ok())
        .as_ref()
}

/// Convert SRT content to WebVTT
///
/// Only timing lines are rewritten; dialogue is preserved as-is. Input that
/// already carries a `WEBVTT` header is passed through.
pub fn srt_to_webvtt(srt: &str) -> Result<String, CaptionError> {
    let srt = srt.trim_start_matches('\u{feff}');
    let re = timestamp_re().ok_or(CaptionError::NoCues)?;

    if srt.trim_start().starts_with("WEBVTT") {
        if !srt.lines().any(|l| l.contains("-->")) {
            return Err(CaptionError::NoCues);
        }
        return Ok(srt.replace("\r\n", "\n"));
    }

    let mut webvtt = String::from("WEBVTT\n\n");
    let mut cues = 0usize;

    for line in srt.lines() {
        if line.contains("-->") && re.is_match(line) {
            cues += 1;
            webvtt.push_str(&re.replace_all(line, |caps: &regex::Captures| {
                let hours = caps.get(1).map(|m| m.as_str()).unwrap_or("00:");
                let hours = if hours.len() == 2 {
                    format!("0{}", hours)
                } else {
                    hours.to_string()
                };
                format!("{}{}.{}", hours, &caps[2], &caps[3])
            }));
        } else if !line.trim().is_empty() {
            webvtt.push_str(line);
        }
        webvtt.push('\n');
    }

    if cues == 0 {
        return Err(CaptionError::NoCues);
    }
    Ok(webvtt)
}

/// A converted caption track that owns its transient resource
#[derive(Debug)]
pub struct ConvertedCaptionTrack {
    pub language: String,
    pub display_label: String,
    resource: BlobHandle,
}

impl ConvertedCaptionTrack {
    pub fn new(
        language: impl Into<String>,
        display_label: impl Into<String>,
        resource: BlobHandle,
    ) -> Self {
        Self {
            language: language.into(),
            display_label: display_label.into(),
            resource,
        }
    }

    /// URL the renderer loads the track from
    pub fn renderable_url(&self) -> &str {
        self.resource.url()
    }

    pub fn content(&self) -> Option<Arc<str>> {
        self.resource.content()
    }
}

/// All tracks produced by one conversion pass
///
/// Dropping the batch revokes every resource it owns.
#[derive(Debug, Default)]
pub struct CaptionBatch {
    tracks: Vec<ConvertedCaptionTrack>,
}

impl CaptionBatch {
    pub fn new(tracks: Vec<ConvertedCaptionTrack>) -> Self {
        Self { tracks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[ConvertedCaptionTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Language of the track matching the user's locale, if any
    pub fn default_language(&self, locale: &str) -> Option<String> {
        let wanted = normalize_language(locale);
        self.tracks
            .iter()
            .find(|t| normalize_language(&t.language) == wanted)
            .map(|t| t.language.clone())
    }

    pub fn find(&self, language: &str) -> Option<&ConvertedCaptionTrack> {
        self.tracks.iter().find(|t| t.language == language)
    }
}

/// Fetches and converts caption descriptors into renderable tracks
#[derive(Clone)]
pub struct SubtitleConverter {
    fetcher: Arc<dyn CaptionFetcher>,
    store: BlobStore,
}

impl SubtitleConverter {
    pub fn new(fetcher: Arc<dyn CaptionFetcher>, store: BlobStore) -> Self {
        Self { fetcher, store }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Fetch and convert every descriptor; failures are logged and skipped
    pub async fn convert_batch(&self, descriptors: &[SubtitleDescriptor]) -> CaptionBatch {
        let results = join_all(descriptors.iter().map(|d| self.convert_one(d))).await;

        let tracks: Vec<ConvertedCaptionTrack> = results
            .into_iter()
            .zip(descriptors)
            .filter_map(|(result, descriptor)| match result {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!(
                        language = %descriptor.language,
                        url = %descriptor.source_url,
                        error = %e,
                        "skipping caption track"
                    );
                    None
                }
            })
            .collect();

        debug!(
            converted = tracks.len(),
            requested = descriptors.len(),
            "caption batch ready"
        );
        CaptionBatch { tracks }
    }

    async fn convert_one(
        &self,
        descriptor: &SubtitleDescriptor,
    ) -> Result<ConvertedCaptionTrack, CaptionError> {
        let raw = self.fetcher.fetch(&descriptor.source_url).await?;
        let webvtt = srt_to_webvtt(&raw)?;
        Ok(ConvertedCaptionTrack::new(
            descriptor.language.clone(),
            descriptor.display_label.clone(),
            self.store.create(webvtt),
        ))
    }
}
