//! Image asset loading.
//!
//! An [`AssetLoader`] fetches image bytes through an [`AssetSource`],
//! decodes them off the async runtime and caches the result by source
//! string. [`AssetLoader::load_all`] loads every distinct source
//! concurrently and reports a per-source outcome, leaving the failure
//! policy to the caller.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::cache::{AssetCache, AssetCacheConfig, CacheStats};
use crate::error::{RenderError, RenderResult};
use crate::image::{data_uri_bytes, decode_image, DecodedImage};

/// Default per-asset timeout.
pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(30);

/// Where image bytes come from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the raw bytes for `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>>;
}

/// Resolves `data:` URIs, `http(s)://` URLs and local file paths.
#[derive(Debug, Clone, Default)]
pub struct DefaultAssetSource {
    client: reqwest::Client,
    base_dir: Option<PathBuf>,
}

impl DefaultAssetSource {
    /// Create a source resolving relative paths against the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative file paths against `dir`.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    async fn fetch_http(&self, url: &str) -> RenderResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(format!("HTTP request failed: {e}")))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("HTTP body read failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_file(&self, path: &str) -> RenderResult<Vec<u8>> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        let resolved = match &self.base_dir {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        };
        Ok(tokio::fs::read(&resolved).await?)
    }
}

#[async_trait]
impl AssetSource for DefaultAssetSource {
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>> {
        if src.starts_with("data:") {
            data_uri_bytes(src)
        } else if src.starts_with("http://") || src.starts_with("https://") {
            self.fetch_http(src).await
        } else {
            self.fetch_file(src).await
        }
    }
}

/// Configuration for an [`AssetLoader`].
#[derive(Debug, Clone)]
pub struct AssetLoaderConfig {
    /// Time allowed to fetch and decode one asset.
    pub timeout: Duration,
    /// Cache limits.
    pub cache: AssetCacheConfig,
}

impl Default for AssetLoaderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ASSET_TIMEOUT,
            cache: AssetCacheConfig::default(),
        }
    }
}

/// Outcome of loading one source.
pub type AssetOutcome = Result<Arc<DecodedImage>, String>;

/// Fetches, decodes and caches image assets.
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    timeout: Duration,
    cache: Arc<Mutex<AssetCache>>,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(DefaultAssetSource::new(), AssetLoaderConfig::default())
    }
}

impl AssetLoader {
    /// Create a loader over `source`.
    #[must_use]
    pub fn new(source: impl AssetSource + 'static, config: AssetLoaderConfig) -> Self {
        Self {
            source: Arc::new(source),
            timeout: config.timeout,
            cache: Arc::new(Mutex::new(AssetCache::with_config(config.cache))),
        }
    }

    /// Load and decode one source, using the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if fetching or decoding fails or
    /// takes longer than the configured timeout.
    pub async fn load(&self, src: &str) -> RenderResult<Arc<DecodedImage>> {
        let cached = self.lock_cache().get(src);
        if let Some(hit) = cached {
            tracing::trace!("Asset cache hit for {}", truncate(src));
            return Ok(hit);
        }

        let image = tokio::time::timeout(self.timeout, self.fetch_and_decode(src))
            .await
            .map_err(|_| {
                RenderError::Resource(format!("timed out after {:?}", self.timeout))
            })??;

        let image = Arc::new(image);
        self.lock_cache()
            .insert(src.to_string(), Arc::clone(&image));
        tracing::debug!(
            "Loaded {} ({}x{})",
            truncate(src),
            image.width,
            image.height
        );
        Ok(image)
    }

    /// Load every distinct source concurrently.
    ///
    /// All loads are awaited before returning; the map holds one outcome
    /// per distinct source.
    pub async fn load_all<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<String, AssetOutcome> {
        let mut unique: Vec<&str> = Vec::new();
        for src in sources {
            if !unique.contains(&src) {
                unique.push(src);
            }
        }

        let loads = unique.iter().map(|src| async move {
            let outcome = self.load(src).await.map_err(|e| e.to_string());
            ((*src).to_string(), outcome)
        });
        join_all(loads).await.into_iter().collect()
    }

    /// Cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats().clone()
    }

    async fn fetch_and_decode(&self, src: &str) -> RenderResult<DecodedImage> {
        let bytes = self.source.fetch(src).await?;
        tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| RenderError::Resource(format!("decode task failed: {e}")))?
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, AssetCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shorten long sources such as data URIs for logging.
fn truncate(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((idx, _)) => &src[..idx],
        None => src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AssetSource for CountingSource {
        async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if src == "missing" {
                return Err(RenderError::Resource("not found".to_string()));
            }
            data_uri_bytes(&format!("data:image/png;base64,{RED_PIXEL_PNG}"))
        }
    }

    /// Serves GIF bytes whatever the source name says.
    struct MislabelledSource;

    #[async_trait]
    impl AssetSource for MislabelledSource {
        async fn fetch(&self, _src: &str) -> RenderResult<Vec<u8>> {
            let mut gif = std::io::Cursor::new(Vec::new());
            image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]))
                .write_to(&mut gif, image::ImageFormat::Gif)
                .map_err(|e| RenderError::Resource(e.to_string()))?;
            Ok(gif.into_inner())
        }
    }

    struct SlowSource;

    #[async_trait]
    impl AssetSource for SlowSource {
        async fn fetch(&self, _src: &str) -> RenderResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_data_uri_through_default_source() {
        let loader = AssetLoader::default();
        let src = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let image = loader.load(&src).await.expect("loads");
        assert_eq!((image.width, image.height), (1, 1));
    }

    #[tokio::test]
    async fn test_format_follows_bytes_not_name() {
        let loader = AssetLoader::new(MislabelledSource, AssetLoaderConfig::default());
        let image = loader.load("photo.png").await.expect("loads");
        assert_eq!((image.width, image.height), (2, 2));
        assert!(image.png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[tokio::test]
    async fn test_load_all_dedupes_and_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = AssetLoader::new(
            CountingSource {
                calls: Arc::clone(&calls),
            },
            AssetLoaderConfig::default(),
        );

        let outcomes = loader.load_all(["a", "b", "a", "missing"]).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes["a"].is_ok());
        assert!(outcomes["missing"].is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        loader.load("a").await.expect("cached");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(loader.cache_stats().hits >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let loader = AssetLoader::new(
            SlowSource,
            AssetLoaderConfig {
                timeout: Duration::from_secs(1),
                ..AssetLoaderConfig::default()
            },
        );
        let err = loader.load("slow.png").await.expect_err("times out");
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let loader = AssetLoader::default();
        let err = loader
            .load("/definitely/not/here.png")
            .await
            .expect_err("missing");
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn test_truncate_long_sources() {
        let long = "x".repeat(200);
        assert_eq!(truncate(&long).len(), 64);
        assert_eq!(truncate("short"), "short");
    }
}
