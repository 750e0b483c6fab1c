pub mod blocking;
pub mod cached;
pub mod http;
pub mod weighted;

use async_trait::async_trait;
use crate::error::Result;
use crate::features::FeatureVector;

pub use blocking::{BlockingOracle, ScoreFn};
pub use cached::CachedOracle;
pub use http::HttpOracle;
pub use weighted::{ScoringWeights, WeightedSumOracle};

/// Pre-trained deal-quality scorer, treated as a black box.
///
/// Implementations must be deterministic for identical vectors and should not
/// decrease the score when only the price goes down. An `Err` excludes the
/// listing from ranking; it never fails the request.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Score one feature vector (higher is a better deal)
    async fn score(&self, features: &FeatureVector) -> Result<f64>;

    /// Get oracle name for logging
    fn name(&self) -> &str;
}
