use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler;
use crate::catalog::{CatalogStats, CatalogStore};
use crate::comparison::{self, Currency};
use crate::config::{EngineConfig, OracleKind};
use crate::core::{Category, DealResponse, DealResultType, Listing, ScoredListing};
use crate::error::{DealEngineError, Result};
use crate::features::FeatureBuilder;
use crate::oracle::{CachedOracle, HttpOracle, ScoringOracle, WeightedSumOracle};
use crate::ranking;
use crate::resolver::{Resolution, TextResolver};

/// Main deal search orchestrator.
///
/// Holds only immutable state; every request builds its own scored list,
/// ranking and comparisons.
pub struct DealEngine {
    catalog: Arc<CatalogStore>,
    resolver: TextResolver,
    features: FeatureBuilder,
    oracle: Arc<dyn ScoringOracle>,
    options: EngineOptions,
}

/// Deal search request
#[derive(Debug, Clone)]
pub struct DealQuery {
    pub query: String,
    /// Shortlist size; `None` uses the engine's `default_top_n`
    pub top_n: Option<usize>,
    /// Base currency → target currency rate
    pub fx_rate: f64,
}

impl DealQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_n: None,
            fx_rate: 1.0,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_fx_rate(mut self, fx_rate: f64) -> Self {
        self.fx_rate = fx_rate;
        self
    }
}

/// Per-engine tuning
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Bound on a single oracle call
    pub oracle_timeout: Duration,
    pub currency: Currency,
    pub default_top_n: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_millis(250),
            currency: Currency::default(),
            default_top_n: 3,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            oracle_timeout: config.oracle_timeout(),
            currency: config.currency.clone(),
            default_top_n: config.default_top_n,
        }
    }
}

/// Build the configured oracle; an unreachable remote oracle falls back to
/// the weighted scorer.
pub async fn build_oracle(config: &EngineConfig) -> Arc<dyn ScoringOracle> {
    let weighted = || -> Arc<dyn ScoringOracle> { Arc::new(WeightedSumOracle::new(config.weights)) };

    let oracle: Arc<dyn ScoringOracle> = match (config.oracle.kind, config.oracle.url.as_deref()) {
        (OracleKind::Http, Some(url)) => {
            match HttpOracle::new(url, config.oracle.model.clone(), config.oracle_timeout()).await {
                Ok(http) => {
                    tracing::info!("✅ Remote scoring oracle initialized ({})", url);
                    Arc::new(http)
                }
                Err(e) => {
                    tracing::warn!("⚠️ Remote oracle unavailable, using weighted scoring: {}", e);
                    weighted()
                }
            }
        }
        _ => weighted(),
    };

    if config.oracle.cache_capacity > 0 {
        Arc::new(CachedOracle::new(oracle, config.oracle.cache_capacity))
    } else {
        oracle
    }
}

impl DealEngine {
    /// Create engine from config: loads the catalog (fatal on failure) and
    /// builds the scoring oracle.
    pub async fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(CatalogStore::open(&config.catalog.path)?);
        let oracle = build_oracle(config).await;

        Ok(Self::new(catalog, oracle)
            .with_resolver(TextResolver::from_config(&config.resolver))
            .with_feature_builder(FeatureBuilder::new(config.imputation))
            .with_options(EngineOptions::from_config(config)))
    }

    /// Create engine with default resolver rules, imputation and options
    pub fn new(catalog: Arc<CatalogStore>, oracle: Arc<dyn ScoringOracle>) -> Self {
        Self {
            catalog,
            resolver: TextResolver::default(),
            features: FeatureBuilder::default(),
            oracle,
            options: EngineOptions::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: TextResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_feature_builder(mut self, features: FeatureBuilder) -> Self {
        self.features = features;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Resolve a query without scoring anything
    pub fn resolve(&self, query: &str) -> Resolution {
        self.resolver.resolve(query, &self.catalog)
    }

    /// Get catalog statistics
    pub fn catalog_stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    /// Search for the best deals matching a free-text query.
    ///
    /// Only a malformed request (bad `fx_rate`) is an error; no match, no
    /// candidates and oracle failures all produce a well-formed response.
    pub async fn search(&self, query: DealQuery) -> Result<DealResponse> {
        let start = Instant::now();
        comparison::validate_fx_rate(query.fx_rate)?;

        let top_n = query.top_n.unwrap_or(self.options.default_top_n);

        let resolution = self.resolve(&query.query);
        match &resolution.product {
            Some(product) => tracing::debug!(
                "Resolved '{}' → {} [{}]",
                query.query,
                product.name,
                resolution.category
            ),
            None => tracing::debug!("Resolved '{}' → {}", query.query, resolution.category),
        }

        let mut response = DealResponse {
            query: query.query.clone(),
            category: resolution.category,
            product: resolution.product.clone(),
            reference: resolution.reference.clone(),
            deals: Vec::new(),
            result_type: DealResultType::NoMatch,
            candidates: 0,
            dropped: 0,
            oracle: self.oracle.name().to_string(),
            currency: self.options.currency.code.clone(),
            latency_ms: 0.0,
        };

        if resolution.category.is_none() {
            response.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(response);
        }

        // A named product narrows the candidates to its own offers
        let candidates: Vec<&Listing> = match &resolution.product {
            Some(product) => self.catalog.listings_for_product(product),
            None => self.catalog.listings_for(resolution.category).iter().collect(),
        };
        response.candidates = candidates.len();

        if candidates.is_empty() {
            response.result_type = DealResultType::EmptyCandidateSet;
            response.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(response);
        }

        // Barrier: ranking waits for every per-listing score
        let scored = self.score_all(&candidates, resolution.category).await;
        response.dropped = scored.iter().filter(|s| !s.is_rankable()).count();

        let ranked = ranking::rank(scored, top_n);
        let comparisons = ranked
            .iter()
            .map(|s| {
                comparison::compare(
                    resolution.reference.as_ref(),
                    &s.listing,
                    query.fx_rate,
                    &self.options.currency,
                )
            })
            .collect();
        response.deals = assembler::assemble(ranked, comparisons, query.fx_rate, &self.options.currency);

        response.result_type = if response.dropped == response.candidates {
            DealResultType::AllDropped
        } else {
            DealResultType::Ranked
        };
        response.latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!("{}", response.display());
        Ok(response)
    }

    /// Score every listing concurrently; failures become excluded entries
    async fn score_all(&self, listings: &[&Listing], category: Category) -> Vec<ScoredListing> {
        let tasks = listings.iter().copied().map(|listing| async move {
            match self.score_one(listing, category).await {
                Ok(score) => ScoredListing::new(listing.clone(), score),
                Err(e) => {
                    if e.is_per_listing() {
                        tracing::warn!("⚠️ Dropping '{}': {}", listing.display_name(), e);
                    } else {
                        tracing::error!("❌ Dropping '{}': {}", listing.display_name(), e);
                    }
                    ScoredListing::excluded(listing.clone())
                }
            }
        });

        join_all(tasks).await
    }

    async fn score_one(&self, listing: &Listing, category: Category) -> Result<f64> {
        let features = self.features.build(listing, category);
        let timeout = self.options.oracle_timeout;

        let score = tokio::time::timeout(timeout, self.oracle.score(&features))
            .await
            .map_err(|_| DealEngineError::OracleTimeout(timeout))??;

        if !score.is_finite() {
            return Err(DealEngineError::Oracle(format!("non-finite score {}", score)));
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogData;
    use crate::core::ReferenceProduct;

    fn catalog() -> Arc<CatalogStore> {
        let data = CatalogData {
            listings: vec![
                (Category::Phone, Listing::new("Pixel 8", "Amazon", 699.0).with_rating(4.4)),
                (Category::Phone, Listing::new("Galaxy S23", "Flipkart", 749.0).with_rating(4.5)),
            ],
            references: vec![
                (Category::Phone, ReferenceProduct::new("Galaxy S23", "Samsung Store", 799.0)),
                (Category::Laptop, ReferenceProduct::new("XPS 13", "Dell", 1199.0)),
            ],
            ..Default::default()
        };
        Arc::new(CatalogStore::from_data(data, "test").unwrap())
    }

    fn engine() -> DealEngine {
        DealEngine::new(catalog(), Arc::new(WeightedSumOracle::default()))
    }

    #[tokio::test]
    async fn test_ranked_search() {
        let response = engine().search(DealQuery::new("phone deals")).await.unwrap();

        assert_eq!(response.result_type, DealResultType::Ranked);
        assert_eq!(response.category, Category::Phone);
        assert_eq!(response.candidates, 2);
        assert_eq!(response.dropped, 0);
        assert_eq!(response.deals.len(), 2);
        assert_eq!(response.oracle, "weighted");
        assert!(response.deals.iter().all(|d| d.comparison.is_some()));
    }

    #[tokio::test]
    async fn test_empty_candidate_set_keeps_reference() {
        let response = engine().search(DealQuery::new("a laptop for work")).await.unwrap();

        assert_eq!(response.result_type, DealResultType::EmptyCandidateSet);
        assert!(response.deals.is_empty());
        assert_eq!(response.reference.unwrap().name, "XPS 13");
    }

    #[tokio::test]
    async fn test_invalid_fx_rate_rejected() {
        let result = engine()
            .search(DealQuery::new("phone").with_fx_rate(f64::NAN))
            .await;
        assert!(matches!(result, Err(DealEngineError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_top_n_zero() {
        let response = engine()
            .search(DealQuery::new("phone").with_top_n(0))
            .await
            .unwrap();
        assert!(response.deals.is_empty());
        assert_eq!(response.result_type, DealResultType::Ranked);
    }

    #[tokio::test]
    async fn test_default_top_n_from_options() {
        let options = EngineOptions {
            default_top_n: 1,
            ..Default::default()
        };
        let engine = engine().with_options(options);

        let response = engine.search(DealQuery::new("phone")).await.unwrap();
        assert_eq!(response.deals.len(), 1);

        let response = engine.search(DealQuery::new("phone").with_top_n(2)).await.unwrap();
        assert_eq!(response.deals.len(), 2);
    }

    #[tokio::test]
    async fn test_named_product_narrows_candidates() {
        let response = engine().search(DealQuery::new("Pixel 8")).await.unwrap();

        assert_eq!(response.category, Category::Phone);
        assert_eq!(response.product.as_ref().unwrap().name, "Pixel 8");
        assert_eq!(response.candidates, 1);
        assert_eq!(response.deals.len(), 1);
        assert_eq!(response.deals[0].product_name, "Pixel 8");
        assert_eq!(response.reference.unwrap().name, "Galaxy S23");
    }

    #[tokio::test]
    async fn test_from_config_missing_catalog_is_fatal() {
        let mut config = EngineConfig::default();
        config.catalog.path = "/nonexistent/catalog.json".into();

        let result = DealEngine::from_config(&config).await;
        assert!(matches!(result, Err(DealEngineError::CatalogUnavailable(_))));
    }
}
