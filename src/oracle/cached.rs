use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::oracle::ScoringOracle;

type FeatureKey = [u64; FEATURE_COUNT];

/// Memoizes oracle scores keyed by the bit-exact feature vector.
///
/// Only successful scores are stored. When the table reaches `capacity` it
/// is cleared wholesale.
pub struct CachedOracle {
    inner: Arc<dyn ScoringOracle>,
    entries: Mutex<HashMap<FeatureKey, f64>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    name: String,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CachedOracle {
    pub fn new(inner: Arc<dyn ScoringOracle>, capacity: usize) -> Self {
        let name = format!("cached:{}", inner.name());
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            name,
        }
    }

    pub fn stats(&self) -> OracleCacheStats {
        let entries = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        OracleCacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: &FeatureKey) -> Option<f64> {
        self.entries.lock().ok()?.get(key).copied()
    }

    fn store(&self, key: FeatureKey, score: f64) {
        // A poisoned table just stops caching
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                tracing::debug!("Oracle cache full ({} entries), clearing", entries.len());
                entries.clear();
            }
            entries.insert(key, score);
        }
    }
}

#[async_trait]
impl ScoringOracle for CachedOracle {
    async fn score(&self, features: &FeatureVector) -> Result<f64> {
        let key = features.cache_key();

        if let Some(score) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(score);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let score = self.inner.score(features).await?;
        if self.capacity > 0 {
            self.store(key, score);
        }
        Ok(score)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, Listing};
    use crate::error::DealEngineError;
    use crate::features::FeatureBuilder;
    use std::sync::atomic::AtomicUsize;

    struct CountingOracle {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScoringOracle for CountingOracle {
        async fn score(&self, features: &FeatureVector) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if features.price() > 1000.0 {
                return Err(DealEngineError::Oracle("too expensive".to_string()));
            }
            Ok(-features.price())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn features(price: f64) -> FeatureVector {
        FeatureBuilder::default().build(&Listing::new("P", "Shop", price), Category::Laptop)
    }

    #[tokio::test]
    async fn test_repeated_vector_hits_cache() {
        let inner = Arc::new(CountingOracle { calls: AtomicUsize::new(0) });
        let cached = CachedOracle::new(inner.clone(), 16);

        assert_eq!(cached.score(&features(10.0)).await.unwrap(), -10.0);
        assert_eq!(cached.score(&features(10.0)).await.unwrap(), -10.0);
        assert_eq!(cached.score(&features(20.0)).await.unwrap(), -20.0);

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        let stats = cached.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 2);
        assert_eq!(cached.name(), "cached:counting");
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let inner = Arc::new(CountingOracle { calls: AtomicUsize::new(0) });
        let cached = CachedOracle::new(inner.clone(), 16);

        assert!(cached.score(&features(5000.0)).await.is_err());
        assert!(cached.score(&features(5000.0)).await.is_err());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_full_table_is_cleared() {
        let inner = Arc::new(CountingOracle { calls: AtomicUsize::new(0) });
        let cached = CachedOracle::new(inner, 2);

        for price in [1.0, 2.0, 3.0] {
            cached.score(&features(price)).await.unwrap();
        }

        assert_eq!(cached.stats().entries, 1);
    }
}
