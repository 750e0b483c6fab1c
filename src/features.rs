//! Feature Builder: turns a listing into the numeric vector the scoring
//! oracle consumes.
//!
//! Layout is fixed (see [`FEATURE_NAMES`]); remote oracles receive the names
//! alongside the values so a model can check it was trained on the same order.
//!
//! ## Imputation
//! Missing optional fields are replaced by the fixed sentinels of
//! [`ImputationPolicy`], never by batch statistics, so a listing's vector does
//! not depend on which other listings are in the request. The matching
//! `*_imputed` flag is set to `1.0` so the oracle can tell a real value from a
//! sentinel. Spec attributes (RAM, warranty) have no flag; their sentinel is
//! `0`, which no real product reports.

use serde::{Deserialize, Serialize};

use crate::core::{Category, Listing};

pub const FEATURE_COUNT: usize = 14;

pub const PRICE: usize = 0;
pub const SELLER_RATING: usize = 1;
pub const SPEC_SCORE: usize = 2;
pub const DELIVERY_DAYS: usize = 3;
pub const TRUST_SCORE: usize = 4;
pub const LOG_RATING_COUNT: usize = 5;
pub const RAM_GB: usize = 6;
pub const WARRANTY_MONTHS: usize = 7;
pub const IS_REPLACEABLE: usize = 8;
pub const DELIVERY_IMPUTED: usize = 9;
pub const TRUST_IMPUTED: usize = 10;
pub const CATEGORY_PHONE: usize = 11;
pub const CATEGORY_LAPTOP: usize = 12;
pub const CATEGORY_HEADPHONES: usize = 13;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "price",
    "seller_rating",
    "spec_score",
    "delivery_days",
    "trust_score",
    "log_rating_count",
    "ram_gb",
    "warranty_months",
    "is_replaceable",
    "delivery_imputed",
    "trust_imputed",
    "category_phone",
    "category_laptop",
    "category_headphones",
];

/// Numeric encoding of one listing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn price(&self) -> f64 {
        self.0[PRICE]
    }

    pub fn seller_rating(&self) -> f64 {
        self.0[SELLER_RATING]
    }

    pub fn spec_score(&self) -> f64 {
        self.0[SPEC_SCORE]
    }

    pub fn delivery_days(&self) -> f64 {
        self.0[DELIVERY_DAYS]
    }

    pub fn trust_score(&self) -> f64 {
        self.0[TRUST_SCORE]
    }

    pub fn log_rating_count(&self) -> f64 {
        self.0[LOG_RATING_COUNT]
    }

    pub fn ram_gb(&self) -> f64 {
        self.0[RAM_GB]
    }

    pub fn warranty_months(&self) -> f64 {
        self.0[WARRANTY_MONTHS]
    }

    /// All components finite
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Bit-exact key, usable for memoizing oracle results
    pub fn cache_key(&self) -> [u64; FEATURE_COUNT] {
        self.0.map(f64::to_bits)
    }
}

/// Fixed sentinels used for missing optional listing fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationPolicy {
    pub delivery_days: f64,
    pub trust_score: f64,
    pub rating_count: f64,
    pub ram_gb: f64,
    pub warranty_months: f64,
}

impl Default for ImputationPolicy {
    fn default() -> Self {
        Self {
            delivery_days: 3.0,
            trust_score: 50.0,
            rating_count: 0.0,
            ram_gb: 0.0,
            warranty_months: 0.0,
        }
    }
}

/// Builds feature vectors; a pure function of (listing, category, policy)
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    imputation: ImputationPolicy,
}

impl FeatureBuilder {
    pub fn new(imputation: ImputationPolicy) -> Self {
        Self { imputation }
    }

    pub fn imputation(&self) -> &ImputationPolicy {
        &self.imputation
    }

    pub fn build(&self, listing: &Listing, category: Category) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];

        values[PRICE] = listing.price;
        values[SELLER_RATING] = listing.seller_rating;
        values[SPEC_SCORE] = listing.spec_score;

        match listing.delivery_days {
            Some(days) => values[DELIVERY_DAYS] = days as f64,
            None => {
                values[DELIVERY_DAYS] = self.imputation.delivery_days;
                values[DELIVERY_IMPUTED] = 1.0;
            }
        }

        match listing.trust_score {
            Some(trust) => values[TRUST_SCORE] = trust,
            None => {
                values[TRUST_SCORE] = self.imputation.trust_score;
                values[TRUST_IMPUTED] = 1.0;
            }
        }

        let rating_count = listing
            .rating_count
            .map(|c| c as f64)
            .unwrap_or(self.imputation.rating_count);
        values[LOG_RATING_COUNT] = rating_count.max(0.0).ln_1p();

        let specs = &listing.specs;
        values[RAM_GB] = specs.ram_gb.unwrap_or(self.imputation.ram_gb);
        values[WARRANTY_MONTHS] = specs.warranty_months.unwrap_or(self.imputation.warranty_months);
        values[IS_REPLACEABLE] = if specs.is_replaceable.unwrap_or(false) { 1.0 } else { 0.0 };

        match category {
            Category::Phone => values[CATEGORY_PHONE] = 1.0,
            Category::Laptop => values[CATEGORY_LAPTOP] = 1.0,
            Category::Headphones => values[CATEGORY_HEADPHONES] = 1.0,
            Category::None => {}
        }

        FeatureVector(values)
    }
}
