use serde::{Deserialize, Serialize};
use crate::core::{Category, Listing, ProductInfo, ProductSpecs, ReferenceProduct};

/// A listing annotated with its oracle score and final position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredListing {
    pub listing: Listing,

    /// Oracle output; `-inf` marks a listing excluded from ranking
    pub predicted_score: f64,

    /// 1-based position assigned by the ranker (0 until ranked)
    pub rank: usize,
}

impl ScoredListing {
    pub fn new(listing: Listing, predicted_score: f64) -> Self {
        Self {
            listing,
            predicted_score,
            rank: 0,
        }
    }

    /// Placeholder for a listing whose scoring failed or timed out
    pub fn excluded(listing: Listing) -> Self {
        Self::new(listing, f64::NEG_INFINITY)
    }

    pub fn is_rankable(&self) -> bool {
        self.predicted_score.is_finite()
    }
}

/// Sign of a price delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Higher,
    Lower,
    Equal,
}

/// Price comparison of one listing against the reference product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub reference: ReferenceProduct,
    pub listing: Listing,

    /// Listing price in the target currency, rounded to its minor unit
    pub converted_listing_price: f64,

    /// Reference price in the target currency, rounded to its minor unit
    pub converted_reference_price: f64,

    /// `converted_listing_price - converted_reference_price`
    pub price_delta: f64,

    pub price_delta_direction: PriceDirection,
}

/// One row of the shortlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedDeal {
    pub rank: usize,
    pub product_name: String,
    pub platform: String,
    pub price: f64,
    pub converted_price: f64,
    pub seller_rating: f64,
    pub spec_score: f64,
    pub predicted_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "ProductSpecs::is_empty")]
    pub specs: ProductSpecs,
    pub comparison: Option<ComparisonResult>,
}

/// Outcome classification of a deal search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealResultType {
    /// At least one listing ranked
    Ranked,
    /// Query matched no category
    NoMatch,
    /// Category resolved but the catalog has no listings for it
    EmptyCandidateSet,
    /// Candidates existed but every one failed scoring
    AllDropped,
}

/// Engine response consumed by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealResponse {
    pub query: String,

    pub category: Category,

    /// Set when the query named a catalog product; `deals` then only holds
    /// that product's offers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,

    /// Present whenever the category has a reference, even with no deals
    pub reference: Option<ReferenceProduct>,

    /// Shortlist in rank order
    #[serde(default)]
    pub deals: Vec<RankedDeal>,

    pub result_type: DealResultType,

    /// Listings retrieved for the category
    pub candidates: usize,

    /// Listings excluded because scoring failed or timed out
    pub dropped: usize,

    /// Oracle used for scoring
    pub oracle: String,

    /// Target currency code of `converted_*` fields
    pub currency: String,

    /// Search latency in milliseconds
    pub latency_ms: f64,
}

impl DealResponse {
    /// Best deal, if any
    pub fn top(&self) -> Option<&RankedDeal> {
        self.deals.first()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        match self.top() {
            Some(best) => format!(
                "{} → {} deals [{}] best: {} @ {} ({:.3}) via {}",
                self.query,
                self.deals.len(),
                self.category,
                best.product_name,
                best.platform,
                best.predicted_score,
                self.oracle
            ),
            None => format!("{} → no deals [{}] {:?}", self.query, self.category, self.result_type),
        }
    }
}
