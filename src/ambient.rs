//! Ambient backdrop color derived from artwork
//!
//! The overlay tints its backdrop with the average color of the current
//! item's artwork. Lookups go through a bounded, owner-scoped LRU cache; any
//! fetch or decode failure yields [`NEUTRAL`] and is cached like a success so
//! a broken URL is not retried on every focus change.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Edge length artwork is reduced to before averaging
const SAMPLE_SIZE: u32 = 32;

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Backdrop used when no artwork color is available
pub const NEUTRAL: Rgb = Rgb(24, 24, 28);

#[derive(Debug, Error)]
pub enum AmbientError {
    #[error("artwork request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("artwork returned HTTP {0}")]
    Status(u16),
    #[error("artwork could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Fetches raw artwork bytes
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AmbientError>;
}

/// Artwork over HTTP
#[derive(Debug, Clone)]
pub struct HttpArtworkSource {
    client: reqwest::Client,
}

impl HttpArtworkSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpArtworkSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtworkSource for HttpArtworkSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AmbientError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AmbientError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Average color of an encoded image
pub fn average_color(bytes: &[u8]) -> Result<Rgb, AmbientError> {
    let image = image::load_from_memory(bytes)?
        .thumbnail(SAMPLE_SIZE, SAMPLE_SIZE)
        .to_rgb8();

    let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
    for pixel in image.pixels() {
        r += pixel[0] as u64;
        g += pixel[1] as u64;
        b += pixel[2] as u64;
        n += 1;
    }
    if n == 0 {
        return Ok(NEUTRAL);
    }
    Ok(Rgb((r / n) as u8, (g / n) as u8, (b / n) as u8))
}

/// Bounded cache of artwork colors keyed by URL
pub struct AmbientColorCache {
    entries: Mutex<LruCache<String, Rgb>>,
    source: Arc<dyn ArtworkSource>,
}

impl AmbientColorCache {
    pub fn new(capacity: usize, source: Arc<dyn ArtworkSource>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            source,
        }
    }

    /// Cached color for `url`, without fetching
    pub fn get(&self, url: &str) -> Option<Rgb> {
        self.entries.lock().ok()?.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Color for `url`, fetching and caching it on a miss
    pub async fn color_for(&self, url: &str) -> Rgb {
        if let Some(color) = self.get(url) {
            return color;
        }

        let color = match self.source.fetch(url).await {
            Ok(bytes) => average_color(&bytes),
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            warn!(%url, error = %e, "ambient color unavailable, using neutral");
            NEUTRAL
        });

        debug!(%url, ?color, "ambient color cached");
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(url.to_string(), color);
        }
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb as Pixel};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(color: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(8, 8, Pixel(color));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    struct Counting {
        calls: AtomicUsize,
        body: Option<Vec<u8>>,
    }

    #[async_trait]
    impl ArtworkSource for Counting {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, AmbientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().ok_or(AmbientError::Status(404))
        }
    }

    #[test]
    fn test_average_color() {
        assert_eq!(average_color(&png([200, 100, 50])).unwrap(), Rgb(200, 100, 50));
        assert!(average_color(b"not an image").is_err());
    }

    #[tokio::test]
    async fn test_hit_skips_fetch() {
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            body: Some(png([10, 20, 30])),
        });
        let cache = AmbientColorCache::new(4, source.clone());
        assert_eq!(cache.color_for("a").await, Rgb(10, 20, 30));
        assert_eq!(cache.color_for("a").await, Rgb(10, 20, 30));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_neutral_and_cached() {
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            body: None,
        });
        let cache = AmbientColorCache::new(4, source.clone());
        assert_eq!(cache.color_for("broken").await, NEUTRAL);
        assert_eq!(cache.get("broken"), Some(NEUTRAL));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            body: Some(png([0, 0, 0])),
        });
        let cache = AmbientColorCache::new(2, source);
        for url in ["a", "b", "c"] {
            cache.color_for(url).await;
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
    }
}
