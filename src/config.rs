//! Engine configuration.
//!
//! Loaded from YAML with every section optional, then overridden from the
//! environment:
//!
//! ```yaml
//! catalog:
//!   path: data/catalog.json
//! oracle:
//!   kind: http            # or "weighted"
//!   url: http://127.0.0.1:8000
//!   model: xgb-ranking
//!   timeout_ms: 250
//!   cache_capacity: 4096
//! weights: { price: 0.4, rating: 0.3, delivery: 0.3, spec: 0.1, trust: 0.1, rating_count: 0.05, price_scale: 100000 }
//! imputation: { delivery_days: 3, trust_score: 50, rating_count: 0, ram_gb: 0, warranty_months: 0 }
//! resolver:
//!   fuzzy_threshold: 0.92
//!   product_threshold: 0.85
//!   rules:
//!     - { keyword: headphone, category: headphones }
//!     - { keyword: phone, category: phone }
//! currency: { code: INR, minor_units: 2 }
//! default_top_n: 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::comparison::Currency;
use crate::error::{DealEngineError, Result};
use crate::features::ImputationPolicy;
use crate::oracle::ScoringWeights;
use crate::resolver::ResolverConfig;

/// Which scoring oracle to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// In-process weighted sum
    Weighted,
    /// Remote inference service (falls back to weighted if unreachable)
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/catalog.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub kind: OracleKind,
    pub url: Option<String>,
    pub model: String,
    /// Per-listing scoring bound
    pub timeout_ms: u64,
    /// Memoized scores; 0 disables the cache
    pub cache_capacity: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::Weighted,
            url: None,
            model: "default".to_string(),
            timeout_ms: 250,
            cache_capacity: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub catalog: CatalogConfig,
    pub oracle: OracleConfig,
    pub weights: ScoringWeights,
    pub imputation: ImputationPolicy,
    pub resolver: ResolverConfig,
    pub currency: Currency,
    pub default_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            oracle: OracleConfig::default(),
            weights: ScoringWeights::default(),
            imputation: ImputationPolicy::default(),
            resolver: ResolverConfig::default(),
            currency: Currency::default(),
            default_top_n: 3,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DealEngineError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `CATALOG_PATH`, `ORACLE_URL`, `ORACLE_TIMEOUT_MS`, `DEFAULT_TOP_N`
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup("CATALOG_PATH") {
            self.catalog.path = PathBuf::from(path);
        }

        if let Some(url) = lookup("ORACLE_URL") {
            self.oracle.kind = OracleKind::Http;
            self.oracle.url = Some(url);
        }

        if let Some(raw) = lookup("ORACLE_TIMEOUT_MS") {
            self.oracle.timeout_ms = raw
                .parse()
                .map_err(|_| DealEngineError::Config(format!("ORACLE_TIMEOUT_MS is not a number: {}", raw)))?;
        }

        if let Some(raw) = lookup("DEFAULT_TOP_N") {
            self.default_top_n = raw
                .parse()
                .map_err(|_| DealEngineError::Config(format!("DEFAULT_TOP_N is not a number: {}", raw)))?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if self.oracle.timeout_ms == 0 {
            return Err(DealEngineError::Config("oracle.timeout_ms must be positive".to_string()));
        }

        if self.oracle.kind == OracleKind::Http && self.oracle.url.is_none() {
            return Err(DealEngineError::Config("oracle.kind is http but oracle.url is missing".to_string()));
        }

        if self.currency.minor_units > 6 {
            return Err(DealEngineError::Config(format!(
                "currency.minor_units must be at most 6, got {}",
                self.currency.minor_units
            )));
        }

        let thresholds = [
            ("fuzzy_threshold", self.resolver.fuzzy_threshold),
            ("product_threshold", self.resolver.product_threshold),
        ];
        for (name, threshold) in thresholds {
            if let Some(threshold) = threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(DealEngineError::Config(format!(
                        "resolver.{} must be within [0, 1], got {}",
                        name, threshold
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle.timeout_ms)
    }
}

impl std::fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "catalog={}, oracle={:?}, timeout={}ms, top_n={}, currency={}",
            self.catalog.path.display(),
            self.oracle.kind,
            self.oracle.timeout_ms,
            self.default_top_n,
            self.currency.code
        )
    }
}
