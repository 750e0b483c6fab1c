use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DealEngineError, Result};
use crate::features::FeatureVector;
use crate::oracle::ScoringOracle;

/// Weights of the in-process scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub price: f64,
    pub rating: f64,
    pub delivery: f64,
    pub spec: f64,
    pub trust: f64,
    /// Popularity: weight of the saturating `ln(1 + rating_count)` term
    pub rating_count: f64,
    /// Price at which the price term drops to one half; sized for INR
    /// catalog prices (tens of thousands)
    pub price_scale: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 0.4,
            rating: 0.3,
            delivery: 0.3,
            spec: 0.1,
            trust: 0.1,
            rating_count: 0.05,
            price_scale: 100_000.0,
        }
    }
}

impl ScoringWeights {
    /// Negative weights would break price monotonicity
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("price", self.price),
            ("rating", self.rating),
            ("delivery", self.delivery),
            ("spec", self.spec),
            ("trust", self.trust),
            ("rating_count", self.rating_count),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(DealEngineError::Config(format!(
                    "weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if !self.price_scale.is_finite() || self.price_scale <= 0.0 {
            return Err(DealEngineError::Config(format!(
                "price_scale must be positive, got {}",
                self.price_scale
            )));
        }
        Ok(())
    }
}

/// Weighted-sum scorer (fallback when no remote model is available).
///
/// Every term is non-negative and only the price term depends on price, so a
/// cheaper listing never scores lower. RAM, warranty and replaceability are
/// seen through `spec_score`; their raw features are for remote models.
pub struct WeightedSumOracle {
    weights: ScoringWeights,
}

impl WeightedSumOracle {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score_sync(&self, features: &FeatureVector) -> Result<f64> {
        if !features.is_valid() {
            return Err(DealEngineError::Oracle("non-finite feature value".to_string()));
        }

        let w = &self.weights;
        let price_term = 1.0 / (1.0 + features.price().max(0.0) / w.price_scale);
        let rating_term = features.seller_rating() / 5.0;
        let delivery_term = 1.0 / (1.0 + features.delivery_days().max(0.0));
        let spec_term = features.spec_score() / 100.0;
        let trust_term = features.trust_score() / 100.0;
        let log_count = features.log_rating_count().max(0.0);
        let popularity_term = log_count / (1.0 + log_count);

        Ok(w.price * price_term
            + w.rating * rating_term
            + w.delivery * delivery_term
            + w.spec * spec_term
            + w.trust * trust_term
            + w.rating_count * popularity_term)
    }
}

impl Default for WeightedSumOracle {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

#[async_trait]
impl ScoringOracle for WeightedSumOracle {
    async fn score(&self, features: &FeatureVector) -> Result<f64> {
        self.score_sync(features)
    }

    fn name(&self) -> &str {
        "weighted"
    }
}
