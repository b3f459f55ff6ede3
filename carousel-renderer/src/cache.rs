//! Cache of decoded image assets, keyed by source.
//!
//! Avoids fetching and decoding the same image twice across exports.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::image::DecodedImage;

/// Entry in the asset cache.
#[derive(Debug)]
struct CacheEntry {
    image: Arc<DecodedImage>,
    last_accessed: Instant,
    size_bytes: usize,
}

/// Configuration for the asset cache.
#[derive(Debug, Clone)]
pub struct AssetCacheConfig {
    /// Maximum total size of cached PNG data in bytes.
    pub max_size_bytes: usize,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 128 * 1024 * 1024, // 128 MB
            max_entries: 256,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

/// LRU cache of decoded images.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, CacheEntry>,
    config: AssetCacheConfig,
    current_size: usize,
    stats: CacheStats,
}

impl AssetCache {
    /// Create a cache with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AssetCacheConfig::default())
    }

    /// Create a cache with custom limits.
    #[must_use]
    pub fn with_config(config: AssetCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up an image by source.
    pub fn get(&mut self, src: &str) -> Option<Arc<DecodedImage>> {
        if let Some(entry) = self.entries.get_mut(src) {
            entry.last_accessed = Instant::now();
            self.stats.hits += 1;
            Some(Arc::clone(&entry.image))
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Insert an image, evicting least recently used entries to stay
    /// within limits. An entry larger than the whole budget is still kept.
    pub fn insert(&mut self, src: String, image: Arc<DecodedImage>) {
        let size_bytes = image.png.len();

        if let Some(old) = self.entries.remove(&src) {
            self.current_size -= old.size_bytes;
        }

        while !self.entries.is_empty()
            && (self.current_size + size_bytes > self.config.max_size_bytes
                || self.entries.len() >= self.config.max_entries)
        {
            self.evict_lru();
        }

        self.current_size += size_bytes;
        self.entries.insert(
            src,
            CacheEntry {
                image,
                last_accessed: Instant::now(),
                size_bytes,
            },
        );
    }

    /// Check if a source is cached.
    #[must_use]
    pub fn contains(&self, src: &str) -> bool {
        self.entries.contains_key(src)
    }

    /// Clear all cached images.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Get the current number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the current cache size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(src, _)| src.clone());

        if let Some(src) = oldest {
            if let Some(entry) = self.entries.remove(&src) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
                tracing::trace!("Evicted cached image {src}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(bytes: usize) -> Arc<DecodedImage> {
        Arc::new(DecodedImage {
            width: 1,
            height: 1,
            png: vec![0; bytes],
        })
    }

    #[test]
    fn test_cache_insert_and_get() {
        let mut cache = AssetCache::new();
        cache.insert("a.png".to_string(), image(10));
        assert!(cache.contains("a.png"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_bytes(), 10);
        assert!(cache.get("a.png").is_some());
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = AssetCache::new();
        cache.insert("a".to_string(), image(4));

        let _ = cache.get("a");
        let _ = cache.get("b");
        let _ = cache.get("a");

        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_cache_eviction_by_count() {
        let mut cache = AssetCache::with_config(AssetCacheConfig {
            max_size_bytes: 1024,
            max_entries: 2,
        });
        cache.insert("a".to_string(), image(4));
        cache.insert("b".to_string(), image(4));
        cache.insert("c".to_string(), image(4));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_cache_eviction_by_size_keeps_oversized_entry() {
        let mut cache = AssetCache::with_config(AssetCacheConfig {
            max_size_bytes: 100,
            max_entries: 10,
        });
        cache.insert("small".to_string(), image(50));
        cache.insert("big".to_string(), image(500));

        assert!(cache.contains("big"));
        assert!(!cache.contains("small"));
        assert_eq!(cache.size_bytes(), 500);
    }

    #[test]
    fn test_reinsert_replaces_size() {
        let mut cache = AssetCache::new();
        cache.insert("a".to_string(), image(10));
        cache.insert("a".to_string(), image(30));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_bytes(), 30);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.size_bytes(), 0);
    }
}
