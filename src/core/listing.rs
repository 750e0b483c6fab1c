use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product category a query can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Phone,
    Laptop,
    Headphones,
    /// No category matched (valid "no comparison context" state)
    None,
}

impl Category {
    /// Categories that can carry listings and a reference product
    pub const SUPPORTED: [Category; 3] = [Category::Phone, Category::Laptop, Category::Headphones];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Phone => "phone",
            Category::Laptop => "laptop",
            Category::Headphones => "headphones",
            Category::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Category::None)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phone" | "phones" | "smartphone" | "smartphones" | "mobile" => Ok(Category::Phone),
            "laptop" | "laptops" | "notebook" => Ok(Category::Laptop),
            "headphone" | "headphones" | "earphones" => Ok(Category::Headphones),
            "none" => Ok(Category::None),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

/// Clamp into `[lo, hi]`; NaN collapses to `lo`
fn clamp_range(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

fn check_price(name: &str, price: f64) -> Result<f64, String> {
    if !price.is_finite() || price < 0.0 {
        return Err(format!("'{}' has invalid price {}", name, price));
    }
    // -0.0 normalizes to 0.0 so ordering by total_cmp stays intuitive
    Ok(price + 0.0)
}

/// Hardware attributes of a product variant, keyed as in the storefront
/// catalog (`RAM_GB`, `Storage_GB`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSpecs {
    #[serde(rename = "RAM_GB", alias = "ram_gb", default, skip_serializing_if = "Option::is_none")]
    pub ram_gb: Option<f64>,

    #[serde(rename = "Storage_GB", alias = "storage_gb", default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<f64>,

    #[serde(rename = "Color", alias = "color", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_months: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_replaceable: Option<bool>,
}

/// RAM, storage and warranty at which each spec component saturates
const FULL_RAM_GB: f64 = 16.0;
const FULL_STORAGE_GB: f64 = 512.0;
const FULL_WARRANTY_MONTHS: f64 = 24.0;

impl ProductSpecs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Spec quality on the 0-100 scale, for variants that carry attributes
    /// but no explicit `spec_score`.
    ///
    /// RAM and storage contribute up to 35 points each, warranty up to 20
    /// (all linear up to 16 GB / 512 GB / 24 months), a replaceable battery
    /// or part 10. An unknown attribute contributes nothing. `None` when no
    /// scored attribute is present.
    pub fn derived_score(&self) -> Option<f64> {
        if self.ram_gb.is_none()
            && self.storage_gb.is_none()
            && self.warranty_months.is_none()
            && self.is_replaceable.is_none()
        {
            return None;
        }

        let ratio = |value: Option<f64>, full: f64| clamp_range(value.unwrap_or(0.0) / full, 0.0, 1.0);
        let replaceable = if self.is_replaceable.unwrap_or(false) { 10.0 } else { 0.0 };

        Some(
            35.0 * ratio(self.ram_gb, FULL_RAM_GB)
                + 35.0 * ratio(self.storage_gb, FULL_STORAGE_GB)
                + 20.0 * ratio(self.warranty_months, FULL_WARRANTY_MONTHS)
                + replaceable,
        )
    }

    /// Negative or non-finite quantities become unknown
    pub fn normalized(mut self) -> Self {
        let keep = |v: Option<f64>| v.filter(|x| x.is_finite() && *x >= 0.0);
        self.ram_gb = keep(self.ram_gb);
        self.storage_gb = keep(self.storage_gb);
        self.warranty_months = keep(self.warranty_months);
        self
    }
}

/// A catalog product that groups offers (variants × sellers)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductInfo {
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductInfo {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            brand: None,
            description: None,
            image_url: None,
        }
    }
}

/// A seller's offer for a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Unique within one category (and therefore within one response)
    pub product_name: String,

    /// Catalog product the offer belongs to, without variant or seller
    /// suffixes; defaults to `product_name`
    #[serde(default)]
    pub base_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Seller / marketplace name
    #[serde(default)]
    pub platform: String,

    /// Price in the catalog's base currency
    pub price: f64,

    /// Seller rating (0.0 - 5.0)
    #[serde(default)]
    pub seller_rating: f64,

    /// Normalized specification quality (0.0 - 100.0)
    #[serde(default)]
    pub spec_score: f64,

    #[serde(default)]
    pub delivery_days: Option<u32>,

    /// Seller trust (0.0 - 100.0)
    #[serde(default)]
    pub trust_score: Option<f64>,

    /// Number of ratings behind `seller_rating`
    #[serde(default)]
    pub rating_count: Option<u32>,

    #[serde(default, skip_serializing_if = "ProductSpecs::is_empty")]
    pub specs: ProductSpecs,
}

impl Listing {
    pub fn new(product_name: impl Into<String>, platform: impl Into<String>, price: f64) -> Self {
        let product_name = product_name.into();
        Self {
            base_name: product_name.clone(),
            product_name,
            brand: None,
            platform: platform.into(),
            price,
            seller_rating: 0.0,
            spec_score: 0.0,
            delivery_days: None,
            trust_score: None,
            rating_count: None,
            specs: ProductSpecs::default(),
        }
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn with_specs(mut self, specs: ProductSpecs) -> Self {
        self.specs = specs;
        self
    }

    pub fn with_rating(mut self, seller_rating: f64) -> Self {
        self.seller_rating = seller_rating;
        self
    }

    pub fn with_spec_score(mut self, spec_score: f64) -> Self {
        self.spec_score = spec_score;
        self
    }

    pub fn with_delivery_days(mut self, days: u32) -> Self {
        self.delivery_days = Some(days);
        self
    }

    pub fn with_trust_score(mut self, trust_score: f64) -> Self {
        self.trust_score = Some(trust_score);
        self
    }

    pub fn with_rating_count(mut self, count: u32) -> Self {
        self.rating_count = Some(count);
        self
    }

    /// Ingestion check: rejects negative or non-finite prices, clamps
    /// ratings and scores into their declared ranges.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.price = check_price(&self.product_name, self.price)?;
        if self.base_name.trim().is_empty() {
            self.base_name = self.product_name.clone();
        }
        self.specs = self.specs.normalized();
        self.seller_rating = clamp_range(self.seller_rating, 0.0, 5.0);
        self.spec_score = clamp_range(self.spec_score, 0.0, 100.0);
        self.trust_score = self.trust_score.map(|t| clamp_range(t, 0.0, 100.0));
        Ok(self)
    }

    /// Get display name (for logging/UI)
    pub fn display_name(&self) -> String {
        if self.platform.is_empty() {
            self.product_name.clone()
        } else {
            format!("{} @ {}", self.product_name, self.platform)
        }
    }
}

/// Canonical "default" product a category's listings are compared against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub spec_score: f64,
    /// Alternative product names, in display order
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ReferenceProduct {
    pub fn new(name: impl Into<String>, platform: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            platform: platform.into(),
            specs: Vec::new(),
            rating: 0.0,
            spec_score: 0.0,
            suggestions: Vec::new(),
        }
    }

    pub fn normalized(mut self) -> Result<Self, String> {
        self.price = check_price(&self.name, self.price)?;
        self.rating = clamp_range(self.rating, 0.0, 5.0);
        self.spec_score = clamp_range(self.spec_score, 0.0, 100.0);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!("Phones".parse::<Category>().unwrap(), Category::Phone);
        assert_eq!("laptop".parse::<Category>().unwrap(), Category::Laptop);
        assert_eq!(" headphones ".parse::<Category>().unwrap(), Category::Headphones);
        assert!("toaster".parse::<Category>().is_err());
    }

    #[test]
    fn test_listing_clamped_at_ingestion() {
        let listing = Listing::new("Pixel 8", "Shop", 499.0)
            .with_rating(7.5)
            .with_spec_score(-3.0)
            .with_trust_score(140.0)
            .normalized()
            .unwrap();

        assert_eq!(listing.seller_rating, 5.0);
        assert_eq!(listing.spec_score, 0.0);
        assert_eq!(listing.trust_score, Some(100.0));
    }

    #[test]
    fn test_nan_rating_collapses_to_floor() {
        let listing = Listing::new("Pixel 8", "Shop", 499.0)
            .with_rating(f64::NAN)
            .normalized()
            .unwrap();
        assert_eq!(listing.seller_rating, 0.0);
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(Listing::new("Broken", "Shop", -1.0).normalized().is_err());
        assert!(Listing::new("Broken", "Shop", f64::INFINITY).normalized().is_err());
        assert!(ReferenceProduct::new("Ref", "Shop", f64::NAN).normalized().is_err());
    }

    #[test]
    fn test_serialization_defaults() {
        let listing: Listing =
            serde_json::from_str(r#"{"product_name": "X", "price": 10}"#).unwrap();
        assert_eq!(listing.platform, "");
        assert_eq!(listing.delivery_days, None);
        assert_eq!(listing.trust_score, None);
        assert!(listing.specs.is_empty());

        let listing = listing.normalized().unwrap();
        assert_eq!(listing.base_name, "X");
    }

    #[test]
    fn test_derived_spec_score() {
        let top: ProductSpecs = serde_json::from_str(
            r#"{"RAM_GB": 16, "Storage_GB": 512, "warranty_months": 24, "is_replaceable": true}"#,
        )
        .unwrap();
        assert_eq!(top.derived_score(), Some(100.0));

        let mid = ProductSpecs {
            ram_gb: Some(8.0),
            storage_gb: Some(128.0),
            warranty_months: Some(12.0),
            is_replaceable: Some(false),
            color: Some("Obsidian".to_string()),
        };
        assert_eq!(mid.derived_score(), Some(36.25));

        // Saturates instead of exceeding the scale
        let huge = ProductSpecs { ram_gb: Some(64.0), ..Default::default() };
        assert_eq!(huge.derived_score(), Some(35.0));

        let color_only = ProductSpecs { color: Some("Hazel".to_string()), ..Default::default() };
        assert_eq!(color_only.derived_score(), None);
    }

    #[test]
    fn test_invalid_spec_quantities_dropped() {
        let specs = ProductSpecs {
            ram_gb: Some(-8.0),
            storage_gb: Some(f64::NAN),
            warranty_months: Some(12.0),
            ..Default::default()
        }
        .normalized();

        assert_eq!(specs.ram_gb, None);
        assert_eq!(specs.storage_gb, None);
        assert_eq!(specs.warranty_months, Some(12.0));
    }
}
