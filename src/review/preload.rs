//! Bounded image preloading.
//!
//! A concept is ready once its primary image is loaded. Variations are
//! fetched on spawned tasks and never hold up readiness.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

pub const DEFAULT_CAPACITY: u64 = 512;

#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
    #[error("Image request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Image request returned status {0}")]
    Status(u16),
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<(), PreloadError>;
}

/// Fetches images over HTTP, resolving site-relative URLs against a base.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpImageFetcher {
    pub fn new(base_url: &str) -> Result<Self, PreloadError> {
        let base_url =
            Url::parse(base_url).map_err(|e| PreloadError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<(), PreloadError> {
        let url = self
            .base_url
            .join(url)
            .map_err(|e| PreloadError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PreloadError::Status(response.status().as_u16()));
        }
        response.bytes().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Preloader {
    loaded: Cache<String, ()>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl Preloader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_capacity(fetcher, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(fetcher: Arc<dyn ImageFetcher>, capacity: u64) -> Self {
        Self {
            loaded: Cache::new(capacity),
            fetcher,
        }
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.loaded.contains_key(url)
    }

    pub async fn loaded_count(&self) -> u64 {
        self.loaded.run_pending_tasks().await;
        self.loaded.entry_count()
    }

    pub async fn preload(&self, url: &str) -> Result<(), PreloadError> {
        if self.is_loaded(url) {
            return Ok(());
        }
        self.fetcher.fetch(url).await?;
        self.loaded.insert(url.to_string(), ()).await;
        Ok(())
    }

    /// Fire-and-forget preload; failures are only logged.
    pub fn preload_in_background(&self, url: &str) -> JoinHandle<()> {
        let preloader = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            if let Err(e) = preloader.preload(&url).await {
                tracing::warn!("Failed to preload {}: {}", url, e);
            }
        })
    }

    /// Waits for `primary`, then starts every variation concurrently. The
    /// returned set lets callers wait for the variations if they care to.
    pub async fn preload_concept(
        &self,
        primary: &str,
        variations: &[String],
    ) -> Result<JoinSet<()>, PreloadError> {
        self.preload(primary).await?;

        let mut pending = JoinSet::new();
        for url in variations {
            let preloader = self.clone();
            let url = url.clone();
            pending.spawn(async move {
                if let Err(e) = preloader.preload(&url).await {
                    tracing::warn!("Failed to preload variation {}: {}", url, e);
                }
            });
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_preload_fetches_once() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("/images/a/1.png"))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let preloader = Preloader::new(Arc::new(fetcher));
        preloader.preload("/images/a/1.png").await.unwrap();
        preloader.preload("/images/a/1.png").await.unwrap();
        assert!(preloader.is_loaded("/images/a/1.png"));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Box::pin(async { Err(PreloadError::Status(404)) }));

        let preloader = Preloader::new(Arc::new(fetcher));
        assert!(preloader.preload("/missing.png").await.is_err());
        assert!(preloader.preload("/missing.png").await.is_err());
        assert!(!preloader.is_loaded("/missing.png"));
    }

    #[tokio::test]
    async fn test_concept_ready_despite_failing_variation() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("/bad.png"))
            .returning(|_| Box::pin(async { Err(PreloadError::Status(500)) }));
        fetcher
            .expect_fetch()
            .returning(|_| Box::pin(async { Ok(()) }));

        let preloader = Preloader::new(Arc::new(fetcher));
        let variations = vec!["/good.png".to_string(), "/bad.png".to_string()];

        let mut pending = preloader
            .preload_concept("/main.png", &variations)
            .await
            .unwrap();
        assert!(preloader.is_loaded("/main.png"));

        while pending.join_next().await.is_some() {}
        assert!(preloader.is_loaded("/good.png"));
        assert!(!preloader.is_loaded("/bad.png"));
    }

    #[tokio::test]
    async fn test_primary_failure_skips_variations() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("/main.png"))
            .times(1)
            .returning(|_| Box::pin(async { Err(PreloadError::Status(404)) }));

        let preloader = Preloader::new(Arc::new(fetcher));
        let result = preloader
            .preload_concept("/main.png", &["/v.png".to_string()])
            .await;
        assert!(matches!(result, Err(PreloadError::Status(404))));
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Box::pin(async { Ok(()) }));

        let preloader = Preloader::with_capacity(Arc::new(fetcher), 2);
        for i in 0..10 {
            preloader.preload(&format!("/img/{}.png", i)).await.unwrap();
        }
        assert!(preloader.loaded_count().await <= 2);
    }
}
