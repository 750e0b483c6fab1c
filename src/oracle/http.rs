use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DealEngineError, Result};
use crate::features::{FeatureVector, FEATURE_NAMES};
use crate::oracle::ScoringOracle;

/// HTTP client for a remote inference service hosting the trained model
pub struct HttpOracle {
    client: Client,
    base_url: String,
    model: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    feature_names: &'a [&'static str],
    features: &'a [f64],
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
}

impl HttpOracle {
    /// Create new remote oracle (performs a health check)
    pub async fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DealEngineError::HttpRequest)?;

        // Health check
        let health_url = format!("{}/health", base_url);
        let response = client
            .get(&health_url)
            .send()
            .await
            .map_err(|e| DealEngineError::Oracle(format!("Health check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DealEngineError::Oracle(format!(
                "Health check failed: HTTP {}",
                response.status()
            )));
        }

        let name = format!("http:{}", model);
        Ok(Self {
            client,
            base_url,
            model,
            name,
        })
    }

    fn score_url(&self) -> String {
        format!(
            "{}/v1/models/{}/score",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }
}

#[async_trait]
impl ScoringOracle for HttpOracle {
    async fn score(&self, features: &FeatureVector) -> Result<f64> {
        let request = ScoreRequest {
            feature_names: &FEATURE_NAMES,
            features: features.as_slice(),
        };

        let response = self
            .client
            .post(self.score_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| DealEngineError::Oracle(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DealEngineError::Oracle(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let score_response: ScoreResponse = response
            .json()
            .await
            .map_err(|e| DealEngineError::Oracle(format!("Invalid JSON: {}", e)))?;

        if !score_response.score.is_finite() {
            return Err(DealEngineError::Oracle(format!(
                "Non-finite score {}",
                score_response.score
            )));
        }

        Ok(score_response.score)
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

    #[tokio::test]
    async fn test_unreachable_service_fails_health_check() {
        // Port 9 (discard) is not expected to run an HTTP server
        let result = HttpOracle::new("http://127.0.0.1:9", "xgb", Duration::from_millis(200)).await;
        assert!(matches!(result, Err(DealEngineError::Oracle(_))));
    }

    #[tokio::test]
    #[ignore] // Requires an inference service running
    async fn test_http_oracle() {
        let oracle = HttpOracle::new("http://127.0.0.1:8000", "xgb ranking", Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(oracle.score_url(), "http://127.0.0.1:8000/v1/models/xgb%20ranking/score");

        let listing = Listing::new("Galaxy S23", "Amazon", 799.0).with_rating(4.4);
        let features = FeatureBuilder::default().build(&listing, Category::Phone);
        let score = oracle.score(&features).await.unwrap();
        assert!(score.is_finite());
    }
}
