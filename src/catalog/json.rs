use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::{CatalogData, CatalogSource};
use crate::core::{Category, Listing, ProductInfo, ProductSpecs, ReferenceProduct};
use crate::error::{DealEngineError, Result};

/// JSON catalog file.
///
/// Accepts the nested storefront layout (`products` → `variants` → `offers`),
/// a flat `listings` array, or both, plus a `references` array. A variant
/// without `spec_score` gets [`ProductSpecs::derived_score`] of its
/// `specifications`:
///
/// ```json
/// {
///   "references": [{ "category": "phone", "name": "Galaxy S23", "price": 74999 }],
///   "products": [{
///     "product_name": "Pixel 8", "brand": "Google", "category": "phone",
///     "variants": [{ "variant_id": "8-128",
///       "specifications": { "RAM_GB": 8, "Storage_GB": 128, "warranty_months": 12 },
///       "offers": [{ "seller_name": "Amazon", "price": 58499, "rating": 4.4,
///                    "rating_count": 1520, "delivery_in_days": 2,
///                    "is_trusted_seller": true }] }]
///   }],
///   "listings": [{ "category": "laptop", "product_name": "XPS 13",
///                  "platform": "Dell", "price": 99999 }]
/// }
/// ```
pub struct JsonCatalog {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<RawProduct>,
    #[serde(default)]
    listings: Vec<RawListing>,
    #[serde(default)]
    references: Vec<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    product_name: String,
    category: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    base_image_url: Option<String>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    #[serde(default)]
    variant_id: Option<String>,
    #[serde(default)]
    spec_score: Option<f64>,
    #[serde(default)]
    specifications: ProductSpecs,
    #[serde(default)]
    offers: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
struct RawOffer {
    #[serde(default)]
    seller_name: Option<String>,
    price: f64,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    rating_count: Option<u32>,
    #[serde(default)]
    delivery_in_days: Option<u32>,
    #[serde(default)]
    is_trusted_seller: Option<bool>,
    #[serde(default)]
    trust_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawListing {
    category: String,
    product_name: String,
    #[serde(default)]
    platform: String,
    price: f64,
    #[serde(default)]
    seller_rating: f64,
    #[serde(default)]
    spec_score: Option<f64>,
    #[serde(default)]
    delivery_days: Option<u32>,
    #[serde(default)]
    trust_score: Option<f64>,
    #[serde(default)]
    rating_count: Option<u32>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    specifications: ProductSpecs,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    category: String,
    name: String,
    price: f64,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    specs: Vec<String>,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    spec_score: f64,
    #[serde(default)]
    suggestions: Vec<String>,
}

fn parse_category(raw: &str, owner: &str) -> Result<Category> {
    raw.parse::<Category>()
        .map_err(|e| DealEngineError::CatalogUnavailable(format!("'{}': {}", owner, e)))
}

/// Explicit score wins; otherwise derived from the spec attributes
fn spec_score_of(explicit: Option<f64>, specs: &ProductSpecs) -> f64 {
    explicit.or_else(|| specs.derived_score()).unwrap_or(0.0)
}

impl RawOffer {
    fn into_listing(self, product: &RawProduct, product_name: String, variant: &RawVariant) -> Listing {
        // Explicit trust score wins; otherwise derive it from the trusted flag
        let trust_score = self
            .trust_score
            .or_else(|| self.is_trusted_seller.map(|trusted| if trusted { 100.0 } else { 0.0 }));

        Listing {
            product_name,
            base_name: product.product_name.clone(),
            brand: product.brand.clone(),
            platform: self.seller_name.unwrap_or_else(|| "Unknown Seller".to_string()),
            price: self.price,
            seller_rating: self.rating.unwrap_or(0.0),
            spec_score: spec_score_of(variant.spec_score, &variant.specifications),
            delivery_days: self.delivery_in_days,
            trust_score,
            rating_count: self.rating_count,
            specs: variant.specifications.clone(),
        }
    }
}

impl JsonCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse catalog JSON text
    pub fn parse_str(json: &str) -> Result<CatalogData> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut data = CatalogData::default();

        for mut product in file.products {
            let category = parse_category(&product.category, &product.product_name)?;
            let multi_variant = product.variants.len() > 1;

            for mut variant in std::mem::take(&mut product.variants) {
                let name = match (&variant.variant_id, multi_variant) {
                    (Some(id), true) => format!("{} ({})", product.product_name, id),
                    _ => product.product_name.clone(),
                };

                for offer in std::mem::take(&mut variant.offers) {
                    let listing = offer.into_listing(&product, name.clone(), &variant);
                    data.listings.push((category, listing));
                }
            }

            data.products.push(ProductInfo {
                name: product.product_name,
                category,
                brand: product.brand,
                description: product.description,
                image_url: product.base_image_url,
            });
        }

        for raw in file.listings {
            let category = parse_category(&raw.category, &raw.product_name)?;
            data.listings.push((
                category,
                Listing {
                    spec_score: spec_score_of(raw.spec_score, &raw.specifications),
                    base_name: raw.product_name.clone(),
                    product_name: raw.product_name,
                    brand: raw.brand,
                    platform: raw.platform,
                    price: raw.price,
                    seller_rating: raw.seller_rating,
                    delivery_days: raw.delivery_days,
                    trust_score: raw.trust_score,
                    rating_count: raw.rating_count,
                    specs: raw.specifications,
                },
            ));
        }

        for raw in file.references {
            let category = parse_category(&raw.category, &raw.name)?;
            data.references.push((
                category,
                ReferenceProduct {
                    name: raw.name,
                    price: raw.price,
                    platform: raw.platform,
                    specs: raw.specs,
                    rating: raw.rating,
                    spec_score: raw.spec_score,
                    suggestions: raw.suggestions,
                },
            ));
        }

        Ok(data)
    }
}

impl CatalogSource for JsonCatalog {
    fn load(&self) -> Result<CatalogData> {
        let content = std::fs::read_to_string(&self.path)?;
        Self::parse_str(&content)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use std::io::Write;

    const NESTED: &str = r#"{
        "references": [
            { "category": "phone", "name": "Galaxy S23", "price": 74999, "platform": "Samsung Store",
              "specs": ["8GB RAM", "128GB"], "rating": 4.5, "spec_score": 85,
              "suggestions": ["Pixel 8", "iPhone 15"] }
        ],
        "products": [
            { "product_name": "Pixel 8", "brand": "Google", "category": "phone",
              "description": "Tensor G3 flagship", "base_image_url": "https://img.example/pixel8.png",
              "variants": [
                { "variant_id": "8-128", "spec_score": 82, "specifications": { "RAM_GB": 8 },
                  "offers": [
                    { "seller_name": "Amazon", "price": 58499, "rating": 4.4, "rating_count": 1520,
                      "delivery_in_days": 2, "is_trusted_seller": true },
                    { "seller_name": "Flipkart", "price": 57999, "rating": 4.2,
                      "is_trusted_seller": false }
                  ] },
                { "variant_id": "8-256", "spec_score": 86,
                  "offers": [ { "price": 64999, "trust_score": 75 } ] }
              ] }
        ],
        "listings": [
            { "category": "laptops", "product_name": "XPS 13", "platform": "Dell", "price": 99999,
              "seller_rating": 4.6, "spec_score": 90 }
        ]
    }"#;

    #[test]
    fn test_nested_offers_flattened() {
        let data = JsonCatalog::parse_str(NESTED).unwrap();
        assert_eq!(data.listings.len(), 4);
        assert_eq!(data.references.len(), 1);

        let (category, first) = &data.listings[0];
        assert_eq!(*category, Category::Phone);
        assert_eq!(first.product_name, "Pixel 8 (8-128)");
        assert_eq!(first.platform, "Amazon");
        assert_eq!(first.spec_score, 82.0);
        assert_eq!(first.delivery_days, Some(2));
        assert_eq!(first.rating_count, Some(1520));
        assert_eq!(first.trust_score, Some(100.0));

        let (_, untrusted) = &data.listings[1];
        assert_eq!(untrusted.trust_score, Some(0.0));
        assert_eq!(untrusted.delivery_days, None);

        let (_, anonymous) = &data.listings[2];
        assert_eq!(anonymous.platform, "Unknown Seller");
        assert_eq!(anonymous.trust_score, Some(75.0));

        let (category, flat) = &data.listings[3];
        assert_eq!(*category, Category::Laptop);
        assert_eq!(flat.product_name, "XPS 13");
        assert_eq!(flat.base_name, "XPS 13");

        assert_eq!(first.base_name, "Pixel 8");
        assert_eq!(first.brand.as_deref(), Some("Google"));
        assert_eq!(first.specs.ram_gb, Some(8.0));

        assert_eq!(data.products.len(), 1);
        assert_eq!(data.products[0].name, "Pixel 8");
        assert_eq!(data.products[0].description.as_deref(), Some("Tensor G3 flagship"));
        assert_eq!(data.products[0].image_url.as_deref(), Some("https://img.example/pixel8.png"));
    }

    #[test]
    fn test_spec_score_derived_from_specifications() {
        // Storefront export shape: attributes only, no precomputed score
        let json = r#"{
            "products": [
                { "product_name": "ThinkPad X1", "brand": "Lenovo", "category": "laptop",
                  "variants": [
                    { "variant_id": "16-512",
                      "specifications": { "RAM_GB": 16, "Storage_GB": 512, "Color": "Black",
                                          "warranty_months": 24, "is_replaceable": true },
                      "offers": [ { "seller_name": "Lenovo Store", "price": 154990, "rating": 4.5 } ] },
                    { "variant_id": "8-256",
                      "specifications": { "RAM_GB": 8, "Storage_GB": 256, "warranty_months": 12 },
                      "offers": [ { "seller_name": "Amazon", "price": 119990, "rating": 4.3 } ] }
                  ] }
            ],
            "listings": [
                { "category": "laptop", "product_name": "Yoga Slim 7", "price": 89990,
                  "specifications": { "RAM_GB": 16, "warranty_months": 12 } },
                { "category": "laptop", "product_name": "Bare", "price": 49990 }
            ]
        }"#;
        let data = JsonCatalog::parse_str(json).unwrap();

        let (_, top) = &data.listings[0];
        assert_eq!(top.spec_score, 100.0);
        assert_eq!(top.specs.is_replaceable, Some(true));
        assert_eq!(top.specs.color.as_deref(), Some("Black"));

        let (_, base) = &data.listings[1];
        // 35 * 0.5 + 35 * 0.5 + 20 * 0.5
        assert_eq!(base.spec_score, 45.0);
        assert_eq!(base.specs.storage_gb, Some(256.0));

        let (_, flat) = &data.listings[2];
        assert_eq!(flat.spec_score, 45.0);

        let (_, bare) = &data.listings[3];
        assert_eq!(bare.spec_score, 0.0);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let json = r#"{ "listings": [ { "category": "toaster", "product_name": "T", "price": 10 } ] }"#;
        assert!(matches!(
            JsonCatalog::parse_str(json),
            Err(DealEngineError::CatalogUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(JsonCatalog::parse_str("{ not json").is_err());
        assert!(JsonCatalog::parse_str(r#"{ "listings": [ { "category": "phone" } ] }"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(NESTED.as_bytes()).unwrap();

        let store = CatalogStore::open(file.path()).unwrap();
        assert_eq!(store.listings_for(Category::Phone).len(), 3);
        assert_eq!(store.reference_for(Category::Phone).unwrap().suggestions.len(), 2);
        assert!(store.stats().source.starts_with("json:"));
    }
}
