use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{DealEngineError, Result};
use crate::features::FeatureVector;
use crate::oracle::ScoringOracle;

/// Synchronous scoring function (e.g. an in-process model)
pub trait ScoreFn: Send + Sync + 'static {
    fn score(&self, features: &FeatureVector) -> Result<f64>;
}

impl<F> ScoreFn for F
where
    F: Fn(&FeatureVector) -> Result<f64> + Send + Sync + 'static,
{
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        self(features)
    }
}

/// Runs a [`ScoreFn`] on the blocking pool so a slow call can be timed out
/// without stalling the runtime.
pub struct BlockingOracle {
    inner: Arc<dyn ScoreFn>,
    name: String,
}

impl BlockingOracle {
    pub fn new(name: impl Into<String>, score_fn: impl ScoreFn) -> Self {
        Self {
            inner: Arc::new(score_fn),
            name: name.into(),
        }
    }
}

#[async_trait]
impl ScoringOracle for BlockingOracle {
    async fn score(&self, features: &FeatureVector) -> Result<f64> {
        let inner = Arc::clone(&self.inner);
        let features = *features;

        tokio::task::spawn_blocking(move || inner.score(&features))
            .await
            .map_err(|e| DealEngineError::Oracle(format!("Scoring task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, Listing};
    use crate::features::FeatureBuilder;

    fn features(price: f64) -> FeatureVector {
        FeatureBuilder::default().build(&Listing::new("P", "Shop", price), Category::Phone)
    }

    #[tokio::test]
    async fn test_closure_oracle() {
        let oracle = BlockingOracle::new("inverse-price", |f: &FeatureVector| -> Result<f64> {
            Ok(1.0 / (1.0 + f.price()))
        });

        assert_eq!(oracle.name(), "inverse-price");
        assert_eq!(oracle.score(&features(0.0)).await.unwrap(), 1.0);
        assert_eq!(oracle.score(&features(1.0)).await.unwrap(), 0.5);
    }

    #[tokio::test]
    async fn test_panicking_function_is_oracle_error() {
        let oracle = BlockingOracle::new("broken", |_: &FeatureVector| -> Result<f64> {
            panic!("model blew up")
        });

        let result = oracle.score(&features(10.0)).await;
        assert!(matches!(result, Err(DealEngineError::Oracle(_))));
    }
}
