//! Recommendations client
//!
//! Best-effort "more like this" lookup. Callers treat any failure as an
//! empty list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Item, MediaType};

/// Anything that can suggest related items
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommendations_for(&self, item_id: &str, media_type: MediaType) -> Result<Vec<Item>>;
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(alias = "items")]
    results: Vec<Item>,
}

/// HTTP recommendations client
pub struct HttpRecommendations {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecommendations {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RecommendationService for HttpRecommendations {
    async fn recommendations_for(&self, item_id: &str, media_type: MediaType) -> Result<Vec<Item>> {
        let url = format!(
            "{}/recommendations/{}/{}.json",
            self.base_url,
            media_type.as_str(),
            urlencoding::encode(item_id)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch recommendations")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Recommendations returned HTTP {}", status);
        }

        let body: RecommendationsResponse = response
            .json()
            .await
            .context("Failed to parse recommendations")?;

        // Never recommend the item being watched
        Ok(body
            .results
            .into_iter()
            .filter(|item| !item.id.is_empty() && item.id != item_id)
            .collect())
    }
}
