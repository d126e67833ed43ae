//! Source-resolution client
//!
//! Turns a catalog item (plus optional episode, provider and server
//! preferences) into playable stream links and raw subtitle descriptors.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::captions::language_label;
use crate::models::{Resolution, ResolveRequest, StreamLink, SubtitleDescriptor};

/// Errors from source resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no playable source found")]
    NotFound,
    #[error("resolver returned HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed resolver response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can resolve playable sources
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError>;
}

/// Resolver response body
#[derive(Debug, Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    links: Vec<WireLink>,
    #[serde(default)]
    subtitles: Vec<WireSubtitle>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    url: String,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSubtitle {
    #[serde(alias = "lang")]
    language: String,
    url: String,
    #[serde(default)]
    label: Option<String>,
}

impl ResolveResponse {
    /// Convert the wire shape into our model, filling gaps from the request
    fn into_resolution(self, request: &ResolveRequest) -> Resolution {
        let provider = self
            .provider
            .or_else(|| request.provider.clone())
            .unwrap_or_else(|| "default".to_string());

        let links = self
            .links
            .into_iter()
            .filter(|l| !l.url.is_empty())
            .map(|l| StreamLink {
                url: l.url,
                quality: l.quality.unwrap_or_else(|| "auto".to_string()),
                provider: l.provider.unwrap_or_else(|| provider.clone()),
            })
            .collect();

        let subtitles = self
            .subtitles
            .into_iter()
            .map(|s| SubtitleDescriptor {
                display_label: s
                    .label
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| language_label(&s.language)),
                language: s.language,
                source_url: s.url,
            })
            .collect();

        Resolution {
            links,
            subtitles,
            provider,
        }
    }
}

/// HTTP resolver client
pub struct HttpSourceResolver {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSourceResolver {
    /// Create a client against the given base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the lookup URL for a request
    ///
    /// Format: `{base}/resolve/{movie|tv}/{id}.json?season=&episode=&provider=&servers=`
    pub fn request_url(&self, request: &ResolveRequest) -> String {
        let mut url = format!(
            "{}/resolve/{}/{}.json",
            self.base_url,
            request.media_type.as_str(),
            urlencoding::encode(&request.item_id)
        );

        let mut query: Vec<String> = Vec::new();
        if let Some(ep) = request.episode {
            query.push(format!("season={}", ep.season));
            query.push(format!("episode={}", ep.episode));
        }
        if let Some(provider) = &request.provider {
            query.push(format!("provider={}", urlencoding::encode(provider)));
        }
        if !request.server_preferences.is_empty() {
            query.push(format!(
                "servers={}",
                urlencoding::encode(&request.server_preferences.join(","))
            ));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

#[async_trait]
impl SourceResolver for HttpSourceResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError> {
        let url = self.request_url(request);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound);
        }
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let body: ResolveResponse = serde_json::from_str(&text)?;
        Ok(body.into_resolution(request))
    }
}
