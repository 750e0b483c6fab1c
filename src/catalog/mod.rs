pub mod json;
pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::core::{Category, Listing, ProductInfo, ReferenceProduct};
use crate::error::{DealEngineError, Result};

pub use json::JsonCatalog;
pub use sqlite::SqliteCatalog;

/// Backing data a catalog is loaded from (JSON file, SQLite database, ...)
pub trait CatalogSource {
    /// Read every record; any failure aborts the load
    fn load(&self) -> Result<CatalogData>;

    /// Human-readable origin, for logging and stats
    fn describe(&self) -> String;
}

/// Raw records as read from a source, before validation
#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub listings: Vec<(Category, Listing)>,
    pub references: Vec<(Category, ReferenceProduct)>,
    /// Declared products; listings whose `base_name` has no entry get one
    /// implicitly at load
    pub products: Vec<ProductInfo>,
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub total_listings: usize,
    pub listings_per_category: BTreeMap<Category, usize>,
    pub references: usize,
    pub products: usize,
}

/// Immutable listing and reference-product store.
///
/// Built once at startup and shared read-only (`Arc`) between requests.
/// Within a category every `product_name` is unique, and every listing's
/// `base_name` names an entry of the product index.
#[derive(Debug)]
pub struct CatalogStore {
    listings: HashMap<Category, Vec<Listing>>,
    references: HashMap<Category, ReferenceProduct>,
    /// Load order: declared products first, then implicit ones
    products: Vec<ProductInfo>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl CatalogStore {
    /// Catalog with no listings and no references
    pub fn empty() -> Self {
        Self {
            listings: HashMap::new(),
            references: HashMap::new(),
            products: Vec::new(),
            source: "empty".to_string(),
            loaded_at: Utc::now(),
        }
    }

    /// Load from a file path, picking the loader by extension
    /// (`.db`, `.sqlite`, `.sqlite3` → SQLite, anything else → JSON)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_sqlite = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("db" | "sqlite" | "sqlite3")
        );

        if is_sqlite {
            Self::load(&SqliteCatalog::new(path))
        } else {
            Self::load(&JsonCatalog::new(path))
        }
    }

    /// Load from any source; every failure becomes `CatalogUnavailable`
    pub fn load(source: &dyn CatalogSource) -> Result<Self> {
        let description = source.describe();

        let data = source.load().map_err(|e| match e {
            DealEngineError::CatalogUnavailable(msg) => DealEngineError::CatalogUnavailable(msg),
            other => DealEngineError::CatalogUnavailable(format!("{}: {}", description, other)),
        })?;

        let store = Self::from_data(data, description)?;
        tracing::info!(
            "✅ Loaded catalog from {}: {} listings, {} products, {} references",
            store.source,
            store.total_listings(),
            store.products.len(),
            store.references.len()
        );
        Ok(store)
    }

    /// Validate raw records and build the store
    pub fn from_data(data: CatalogData, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let unavailable = |msg: String| DealEngineError::CatalogUnavailable(format!("{}: {}", source, msg));

        let mut products: Vec<ProductInfo> = Vec::new();
        let mut known: HashSet<(Category, String)> = HashSet::new();
        for product in data.products {
            if product.category.is_none() {
                return Err(unavailable(format!("product '{}' has no category", product.name)));
            }
            if product.name.trim().is_empty() {
                return Err(unavailable("product with an empty name".to_string()));
            }
            if !known.insert((product.category, product.name.clone())) {
                return Err(unavailable(format!(
                    "duplicate product '{}' in {}",
                    product.name, product.category
                )));
            }
            products.push(product);
        }

        let mut listings: HashMap<Category, Vec<Listing>> = HashMap::new();
        for (category, listing) in data.listings {
            if category.is_none() {
                return Err(unavailable(format!(
                    "listing '{}' has no category",
                    listing.product_name
                )));
            }
            let listing = listing.normalized().map_err(unavailable)?;
            if known.insert((category, listing.base_name.clone())) {
                let mut product = ProductInfo::new(listing.base_name.clone(), category);
                product.brand = listing.brand.clone();
                products.push(product);
            }
            listings.entry(category).or_default().push(listing);
        }

        let mut references = HashMap::new();
        for (category, reference) in data.references {
            if category.is_none() {
                return Err(unavailable(format!(
                    "reference '{}' has no category",
                    reference.name
                )));
            }
            let reference = reference.normalized().map_err(unavailable)?;
            if references.insert(category, reference).is_some() {
                return Err(unavailable(format!("duplicate reference product for {}", category)));
            }
        }

        for (category, items) in listings.iter_mut() {
            let renamed = disambiguate_names(items);
            if renamed > 0 {
                tracing::debug!("Renamed {} duplicate product names in {}", renamed, category);
            }
        }

        Ok(Self {
            listings,
            references,
            products,
            source,
            loaded_at: Utc::now(),
        })
    }

    /// Candidate listings for a category (possibly empty)
    pub fn listings_for(&self, category: Category) -> &[Listing] {
        self.listings.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Offers of one catalog product, in load order
    pub fn listings_for_product(&self, product: &ProductInfo) -> Vec<&Listing> {
        self.listings_for(product.category)
            .iter()
            .filter(|listing| listing.base_name == product.name)
            .collect()
    }

    /// Product index, in load order
    pub fn products(&self) -> &[ProductInfo] {
        &self.products
    }

    /// Reference product of a category, if one is defined
    pub fn reference_for(&self, category: Category) -> Option<&ReferenceProduct> {
        self.references.get(&category)
    }

    pub fn total_listings(&self) -> usize {
        self.listings.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            total_listings: self.total_listings(),
            listings_per_category: self
                .listings
                .iter()
                .map(|(category, items)| (*category, items.len()))
                .collect(),
            references: self.references.len(),
            products: self.products.len(),
        }
    }
}

/// Makes product names unique: duplicates get their platform appended, and
/// anything still colliding gets a `#n` suffix. Returns the rename count.
fn disambiguate_names(listings: &mut [Listing]) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for listing in listings.iter() {
        *counts.entry(listing.product_name.clone()).or_default() += 1;
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut renamed = 0;

    for listing in listings.iter_mut() {
        let duplicated = counts.get(&listing.product_name).copied().unwrap_or(0) > 1;
        let base = if duplicated && !listing.platform.is_empty() {
            format!("{} ({})", listing.product_name, listing.platform)
        } else {
            listing.product_name.clone()
        };

        let mut name = base.clone();
        let mut n = 2;
        while used.contains(&name) {
            name = format!("{} #{}", base, n);
            n += 1;
        }

        if name != listing.product_name {
            listing.product_name = name.clone();
            renamed += 1;
        }
        used.insert(name);
    }

    renamed
}
