//! Product catalog for Vitrin.
//!
//! The catalog is loaded once at startup from a CSV file and stays read-only
//! for the lifetime of the process.

mod loader;

pub use loader::decode_specifications;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decoded specification map of a product, in source order.
pub type Specifications = serde_json::Map<String, serde_json::Value>;

/// A single product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product name, used for retrieval.
    pub name: String,
    /// Price in toman.
    pub price: i64,
    /// Store selling the product.
    pub store: String,
    /// Decoded specifications. Empty when the raw value was missing or malformed.
    pub specifications: Specifications,
    /// The specification cell exactly as it appeared in the catalog file.
    pub raw_specifications: Option<String>,
}

impl ProductRecord {
    /// Create a record, decoding the raw specification string.
    pub fn new(
        name: impl Into<String>,
        price: i64,
        store: impl Into<String>,
        raw_specifications: Option<String>,
    ) -> Self {
        let specifications = decode_specifications(raw_specifications.as_deref());
        Self {
            name: name.into(),
            price,
            store: store.into(),
            specifications,
            raw_specifications,
        }
    }
}

/// Ordered, read-only collection of products.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ProductRecord>,
}

impl Catalog {
    /// Load the catalog from a CSV file.
    ///
    /// A missing file is a configuration error: the service cannot start without it.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        loader::load_csv(path)
    }

    /// Build a catalog from records already in memory.
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    /// All records, in catalog order.
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decodes_specifications() {
        let record = ProductRecord::new(
            "Galaxy A54",
            12_000_000,
            "TechShop",
            Some(r#"{"RAM": "8GB", "Storage": 128}"#.to_string()),
        );
        assert_eq!(record.specifications.len(), 2);
        assert_eq!(record.specifications["RAM"], "8GB");
        assert_eq!(record.specifications["Storage"], 128);
    }

    #[test]
    fn test_record_with_malformed_specifications() {
        let record = ProductRecord::new("Galaxy A54", 0, "TechShop", Some("{RAM: 8GB".to_string()));
        assert!(record.specifications.is_empty());
        assert_eq!(record.raw_specifications.as_deref(), Some("{RAM: 8GB"));
    }
}
