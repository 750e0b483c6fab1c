//! Text Resolver: free-text query → category (+ reference product).
//!
//! Three passes, first hit wins:
//!
//! 1. Keyword rules. The first rule whose keyword occurs in the lower-cased
//!    query wins, so priority is the table order, not the position of the
//!    keyword in the text.
//! 2. Product names. A query naming a catalog product ("Google Pixel 8",
//!    "macbook air") resolves to that product and its category. A name
//!    contained in the query (or the query contained in a name) beats a
//!    plain Jaro-Winkler match; among those the closest length wins, then
//!    the higher similarity, then catalog order.
//! 3. Typos. Every query token is compared against the keywords (rule order)
//!    with Jaro-Winkler similarity to absorb typos such as "laptp".

use rapidfuzz::distance::jaro_winkler;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogStore;
use crate::core::{Category, ProductInfo, ReferenceProduct};

/// Keyword → category rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: Category,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, category: Category) -> Self {
        Self {
            keyword: keyword.into().to_lowercase(),
            category,
        }
    }
}

/// Default rule table. "headphone" precedes "phone" because the latter is
/// a substring of the former.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("headphone", Category::Headphones),
        KeywordRule::new("earphone", Category::Headphones),
        KeywordRule::new("earbud", Category::Headphones),
        KeywordRule::new("phone", Category::Phone),
        KeywordRule::new("smartphone", Category::Phone),
        KeywordRule::new("mobile", Category::Phone),
        KeywordRule::new("laptop", Category::Laptop),
        KeywordRule::new("notebook", Category::Laptop),
    ]
}

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.92;
pub const DEFAULT_PRODUCT_THRESHOLD: f64 = 0.85;

/// Shortest query (alphanumeric chars) that may match as part of a longer
/// product name
const MIN_PARTIAL_QUERY: usize = 4;

/// Resolver settings (part of the engine config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub rules: Vec<KeywordRule>,
    /// Minimum Jaro-Winkler similarity for the typo pass; `None` disables it
    pub fuzzy_threshold: Option<f64>,
    /// Minimum whole-query Jaro-Winkler similarity to a product name;
    /// `None` disables product-name resolution
    pub product_threshold: Option<f64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            fuzzy_threshold: Some(DEFAULT_FUZZY_THRESHOLD),
            product_threshold: Some(DEFAULT_PRODUCT_THRESHOLD),
        }
    }
}

/// Output of [`TextResolver::resolve`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub category: Category,
    pub reference: Option<ReferenceProduct>,
    /// Catalog product the query named, if resolved by product name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,
}

impl Resolution {
    pub fn no_match() -> Self {
        Self {
            category: Category::None,
            reference: None,
            product: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextResolver {
    rules: Vec<KeywordRule>,
    fuzzy_threshold: Option<f64>,
    product_threshold: Option<f64>,
}

impl TextResolver {
    pub fn new(rules: Vec<KeywordRule>, fuzzy_threshold: Option<f64>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| KeywordRule::new(r.keyword, r.category))
            .filter(|r| !r.keyword.is_empty() && !r.category.is_none())
            .collect();
        Self {
            rules,
            fuzzy_threshold,
            product_threshold: Some(DEFAULT_PRODUCT_THRESHOLD),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.rules.clone(), config.fuzzy_threshold).with_product_threshold(config.product_threshold)
    }

    pub fn with_product_threshold(mut self, threshold: Option<f64>) -> Self {
        self.product_threshold = threshold;
        self
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Category from the keyword and typo passes only (no catalog);
    /// `Category::None` when nothing matches
    pub fn classify(&self, query: &str) -> Category {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Category::None;
        }

        self.match_keyword(&query_lower)
            .unwrap_or_else(|| self.match_fuzzy(&query_lower))
    }

    fn match_keyword(&self, query_lower: &str) -> Option<Category> {
        self.rules
            .iter()
            .find(|r| query_lower.contains(&r.keyword))
            .map(|r| r.category)
    }

    fn match_fuzzy(&self, query_lower: &str) -> Category {
        let Some(threshold) = self.fuzzy_threshold else {
            return Category::None;
        };

        let tokens: Vec<&str> = query_lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 3)
            .collect();

        for rule in &self.rules {
            let hit = tokens.iter().any(|token| {
                jaro_winkler::normalized_similarity(token.chars(), rule.keyword.chars()) >= threshold
            });
            if hit {
                tracing::debug!("Fuzzy keyword match '{}' → {}", rule.keyword, rule.category);
                return rule.category;
            }
        }

        Category::None
    }

    /// Best catalog product for the query, if any clears the threshold
    pub fn match_product<'a>(&self, query: &str, catalog: &'a CatalogStore) -> Option<&'a ProductInfo> {
        let threshold = self.product_threshold?;
        let query_lower = query.trim().to_lowercase();
        let partial_ok = query_lower.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_PARTIAL_QUERY;

        // (contained, coverage, similarity), compared lexicographically
        let mut best: Option<((bool, f64, f64), &ProductInfo)> = None;
        for product in catalog.products() {
            let name = product.name.to_lowercase();
            let contained = query_lower.contains(&name) || (partial_ok && name.contains(&query_lower));
            let similarity = jaro_winkler::normalized_similarity(query_lower.chars(), name.chars());
            if !contained && similarity < threshold {
                continue;
            }

            // Share of the longer string covered by the shorter one, so
            // "pixel 8" prefers "Pixel 8" over "Pixel 8 Pro"
            let coverage = if contained {
                let (a, b) = (query_lower.chars().count(), name.chars().count());
                a.min(b) as f64 / a.max(b) as f64
            } else {
                0.0
            };

            let key = (contained, coverage, similarity);
            if best.map_or(true, |(best_key, _)| key > best_key) {
                best = Some((key, product));
            }
        }

        best.map(|((_, _, similarity), product)| {
            tracing::debug!("Product match '{}' → {} ({:.3})", query, product.name, similarity);
            product
        })
    }

    /// Category plus the catalog's reference product for it
    pub fn resolve(&self, query: &str, catalog: &CatalogStore) -> Resolution {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Resolution::no_match();
        }

        let (category, product) = match self.match_keyword(&query_lower) {
            Some(category) => (category, None),
            None => match self.match_product(&query_lower, catalog) {
                Some(product) => (product.category, Some(product.clone())),
                None => (self.match_fuzzy(&query_lower), None),
            },
        };
        if category.is_none() {
            return Resolution::no_match();
        }

        Resolution {
            category,
            reference: catalog.reference_for(category).cloned(),
            product,
        }
    }
}

impl Default for TextResolver {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}
