//! # Deal Ranking Engine
//!
//! Turns a free-text product request into a ranked shortlist of seller offers:
//! - Text resolution to a product category and reference product
//! - Immutable catalog (JSON or SQLite) loaded once at startup
//! - Pluggable scoring oracle (weighted sum, remote model, blocking function)
//! - Deterministic ranking with a total tie-break order
//! - Price comparison against the reference in a target currency
//! - Multiple interfaces: Rust library, HTTP API, CLI
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dealrank_engine::{DealEngine, DealQuery, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = DealEngine::from_config(&EngineConfig::default()).await?;
//!
//!     let response = engine.search(DealQuery::new("best phone deals").with_top_n(3)).await?;
//!
//!     for deal in &response.deals {
//!         println!("{}. {} @ {} - {}", deal.rank, deal.product_name, deal.platform, deal.converted_price);
//!     }
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod catalog;
pub mod comparison;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod features;
pub mod oracle;
pub mod ranking;
pub mod resolver;

// Re-export primary types
pub use catalog::{CatalogStats, CatalogStore};
pub use config::EngineConfig;
pub use crate::core::{
    Category, ComparisonResult, DealResponse, DealResultType, Listing, PriceDirection, ProductInfo,
    ProductSpecs, RankedDeal, ReferenceProduct, ScoredListing,
};
pub use engine::{DealEngine, DealQuery, EngineOptions};
pub use error::{DealEngineError, Result};
pub use oracle::ScoringOracle;
pub use resolver::{Resolution, TextResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
