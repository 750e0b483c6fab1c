use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::catalog::{CatalogData, CatalogSource};
use crate::core::{Category, Listing, ProductInfo, ProductSpecs, ReferenceProduct};
use crate::error::{DealEngineError, Result};

/// Read-only SQLite catalog.
///
/// Schema:
/// ```sql
/// CREATE TABLE listings (
///     category TEXT NOT NULL,
///     product_name TEXT NOT NULL,
///     base_name TEXT,          -- defaults to product_name
///     brand TEXT,
///     platform TEXT NOT NULL DEFAULT '',
///     price REAL NOT NULL,
///     seller_rating REAL NOT NULL DEFAULT 0,
///     spec_score REAL,         -- NULL: derived from specifications
///     delivery_days INTEGER,
///     trust_score REAL,
///     rating_count INTEGER,
///     specifications TEXT      -- JSON object (RAM_GB, Storage_GB, ...)
/// );
/// CREATE TABLE products (
///     category TEXT NOT NULL,
///     name TEXT NOT NULL,
///     brand TEXT,
///     description TEXT,
///     image_url TEXT,
///     PRIMARY KEY (category, name)
/// );
/// CREATE TABLE reference_products (
///     category TEXT PRIMARY KEY,
///     name TEXT NOT NULL,
///     price REAL NOT NULL,
///     platform TEXT NOT NULL DEFAULT '',
///     specs TEXT,          -- JSON array of strings
///     rating REAL NOT NULL DEFAULT 0,
///     spec_score REAL NOT NULL DEFAULT 0,
///     suggestions TEXT     -- JSON array of strings
/// );
/// ```
pub struct SqliteCatalog {
    path: PathBuf,
}

pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS listings (
        category TEXT NOT NULL,
        product_name TEXT NOT NULL,
        base_name TEXT,
        brand TEXT,
        platform TEXT NOT NULL DEFAULT '',
        price REAL NOT NULL,
        seller_rating REAL NOT NULL DEFAULT 0,
        spec_score REAL,
        delivery_days INTEGER,
        trust_score REAL,
        rating_count INTEGER,
        specifications TEXT
    );
    CREATE TABLE IF NOT EXISTS products (
        category TEXT NOT NULL,
        name TEXT NOT NULL,
        brand TEXT,
        description TEXT,
        image_url TEXT,
        PRIMARY KEY (category, name)
    );
    CREATE TABLE IF NOT EXISTS reference_products (
        category TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        platform TEXT NOT NULL DEFAULT '',
        specs TEXT,
        rating REAL NOT NULL DEFAULT 0,
        spec_score REAL NOT NULL DEFAULT 0,
        suggestions TEXT
    );
";

fn parse_category(raw: &str) -> Result<Category> {
    raw.parse::<Category>().map_err(DealEngineError::CatalogUnavailable)
}

fn parse_specs(json: Option<String>) -> Result<ProductSpecs> {
    match json {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
        _ => Ok(ProductSpecs::default()),
    }
}

fn parse_string_list(json: Option<String>) -> Result<Vec<String>> {
    match json {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
        _ => Ok(Vec::new()),
    }
}

impl SqliteCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create the catalog tables (for seeding tools and tests)
    pub fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Read both tables from an open connection
    pub fn load_from_connection(conn: &Connection) -> Result<CatalogData> {
        let mut data = CatalogData::default();

        let mut stmt = conn.prepare(
            "SELECT category, product_name, base_name, brand, platform, price, seller_rating,
                    spec_score, delivery_days, trust_score, rating_count, specifications
             FROM listings
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            let base_name: Option<String> = row.get(2)?;
            let spec_score: Option<f64> = row.get(7)?;
            let specifications: Option<String> = row.get(11)?;
            let listing = Listing {
                product_name: row.get(1)?,
                base_name: base_name.unwrap_or_default(),
                brand: row.get(3)?,
                platform: row.get(4)?,
                price: row.get(5)?,
                seller_rating: row.get(6)?,
                spec_score: 0.0,
                delivery_days: row.get(8)?,
                trust_score: row.get(9)?,
                rating_count: row.get(10)?,
                specs: ProductSpecs::default(),
            };
            Ok((category, listing, spec_score, specifications))
        })?;
        for row in rows {
            let (category, mut listing, spec_score, specifications) = row?;
            listing.specs = parse_specs(specifications)?;
            listing.spec_score = spec_score
                .or_else(|| listing.specs.derived_score())
                .unwrap_or(0.0);
            data.listings.push((parse_category(&category)?, listing));
        }

        let mut stmt = conn.prepare(
            "SELECT category, name, brand, description, image_url
             FROM products
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            let product = ProductInfo {
                name: row.get(1)?,
                category: Category::None,
                brand: row.get(2)?,
                description: row.get(3)?,
                image_url: row.get(4)?,
            };
            Ok((category, product))
        })?;
        for row in rows {
            let (category, mut product) = row?;
            product.category = parse_category(&category)?;
            data.products.push(product);
        }

        let mut stmt = conn.prepare(
            "SELECT category, name, price, platform, specs, rating, spec_score, suggestions
             FROM reference_products
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            let specs: Option<String> = row.get(4)?;
            let suggestions: Option<String> = row.get(7)?;
            let reference = ReferenceProduct {
                name: row.get(1)?,
                price: row.get(2)?,
                platform: row.get(3)?,
                specs: Vec::new(),
                rating: row.get(5)?,
                spec_score: row.get(6)?,
                suggestions: Vec::new(),
            };
            Ok((category, reference, specs, suggestions))
        })?;
        for row in rows {
            let (category, mut reference, specs, suggestions) = row?;
            reference.specs = parse_string_list(specs)?;
            reference.suggestions = parse_string_list(suggestions)?;
            data.references.push((parse_category(&category)?, reference));
        }

        Ok(data)
    }
}

impl CatalogSource for SqliteCatalog {
    fn load(&self) -> Result<CatalogData> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::load_from_connection(&conn)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use rusqlite::params;

    fn seeded(conn: &Connection) {
        SqliteCatalog::create_schema(conn).unwrap();
        conn.execute(
            "INSERT INTO listings (category, product_name, platform, price, seller_rating, spec_score, delivery_days)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params!["phone", "Pixel 8", "Amazon", 58499.0, 4.4, 82.0, 2],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO listings (category, product_name, platform, price, trust_score, rating_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params!["headphones", "WH-1000XM5", "Croma", 29990.0, 80.0, 431],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO listings (category, product_name, base_name, brand, platform, price, specifications)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                "laptop",
                "ThinkPad X1 (16-512)",
                "ThinkPad X1",
                "Lenovo",
                "Lenovo Store",
                154990.0,
                r#"{"RAM_GB": 16, "Storage_GB": 512, "warranty_months": 24, "is_replaceable": true}"#
            ],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO products (category, name, brand, description) VALUES (?1, ?2, ?3, ?4)",
            params!["laptop", "ThinkPad X1", "Lenovo", "Business ultrabook"],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO reference_products (category, name, price, platform, specs, suggestions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params!["phone", "Galaxy S23", 74999.0, "Samsung Store", r#"["8GB RAM"]"#, r#"["Pixel 8"]"#],
        )
        .unwrap();
    }

    #[test]
    fn test_load_from_connection() {
        let conn = Connection::open_in_memory().unwrap();
        seeded(&conn);

        let data = SqliteCatalog::load_from_connection(&conn).unwrap();
        assert_eq!(data.listings.len(), 3);

        let (category, pixel) = &data.listings[0];
        assert_eq!(*category, Category::Phone);
        assert_eq!(pixel.delivery_days, Some(2));
        assert_eq!(pixel.trust_score, None);

        let (category, sony) = &data.listings[1];
        assert_eq!(*category, Category::Headphones);
        assert_eq!(sony.seller_rating, 0.0);
        assert_eq!(sony.rating_count, Some(431));

        let (category, thinkpad) = &data.listings[2];
        assert_eq!(*category, Category::Laptop);
        assert_eq!(thinkpad.base_name, "ThinkPad X1");
        assert_eq!(thinkpad.brand.as_deref(), Some("Lenovo"));
        assert_eq!(thinkpad.spec_score, 100.0);
        assert_eq!(thinkpad.specs.ram_gb, Some(16.0));

        assert_eq!(data.products.len(), 1);
        assert_eq!(data.products[0].category, Category::Laptop);
        assert_eq!(data.products[0].description.as_deref(), Some("Business ultrabook"));

        let (_, reference) = &data.references[0];
        assert_eq!(reference.specs, vec!["8GB RAM".to_string()]);
        assert_eq!(reference.suggestions, vec!["Pixel 8".to_string()]);
    }

    #[test]
    fn test_open_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let conn = Connection::open(&path).unwrap();
            seeded(&conn);
        }

        let store = CatalogStore::open(&path).unwrap();
        assert_eq!(store.listings_for(Category::Phone).len(), 1);
        assert_eq!(store.reference_for(Category::Phone).unwrap().name, "Galaxy S23");
        assert!(store.stats().source.starts_with("sqlite:"));
    }

    #[test]
    fn test_missing_tables_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path).unwrap();

        let err = CatalogStore::open(&path).unwrap_err();
        assert!(matches!(err, DealEngineError::CatalogUnavailable(_)));
    }
}
