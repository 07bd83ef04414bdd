//! CSV catalog loading.

use super::{Catalog, ProductRecord, Specifications};
use crate::error::{Result, VitrinError};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Required header column holding the product name.
const NAME_COLUMN: &str = "ProductName";

/// One row of the catalog file. Every cell is optional so that a sparse row
/// still loads with defaults.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "ProductName", default)]
    name: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "StoreName", default)]
    store: Option<String>,
    #[serde(rename = "Specifications", default)]
    specifications: Option<String>,
}

/// Read the catalog CSV at `path`.
#[instrument]
pub(super) fn load_csv(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(VitrinError::Config(format!(
            "Catalog file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == NAME_COLUMN) {
        return Err(VitrinError::Catalog(format!(
            "{} is missing the required '{}' column",
            path.display(),
            NAME_COLUMN
        )));
    }

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CatalogRow>().enumerate() {
        match row {
            Ok(row) => records.push(row.into_record()),
            Err(e) => warn!("Skipping catalog row {}: {}", line + 2, e),
        }
    }

    info!("Loaded {} products from {}", records.len(), path.display());
    Ok(Catalog::from_records(records))
}

impl CatalogRow {
    fn into_record(self) -> ProductRecord {
        let name = self.name.unwrap_or_default();
        let price = parse_price(self.price.as_deref(), &name);
        ProductRecord::new(
            name,
            price,
            self.store.unwrap_or_default(),
            self.specifications,
        )
    }
}

/// Parse a price cell. Floats are truncated, anything else falls back to 0.
fn parse_price(raw: Option<&str>, product: &str) -> i64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0;
    };
    let cleaned = raw.replace(',', "");

    if let Ok(price) = cleaned.parse::<i64>() {
        return price;
    }
    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() => price as i64,
        _ => {
            warn!("Unparseable price '{}' for '{}', using 0", raw, product);
            0
        }
    }
}

/// Decode a JSON-encoded specification cell into a map.
///
/// Never fails: a missing, empty or malformed value, or one that is not a
/// JSON object, yields an empty map.
pub fn decode_specifications(raw: Option<&str>) -> Specifications {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Specifications::new();
    };

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            debug!("Discarding non-object specifications: {}", other);
            Specifications::new()
        }
        Err(e) => {
            debug!("Discarding malformed specifications {:?}: {}", raw, e);
            Specifications::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_catalog() {
        let file = write_catalog(
            "ProductName,Price,StoreName,Specifications\n\
             Galaxy A54,12000000,TechShop,\"{\"\"RAM\"\": \"\"8GB\"\"}\"\n\
             iPhone 13,35000000,AppleCenter,\n",
        );

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = &catalog.records()[0];
        assert_eq!(first.name, "Galaxy A54");
        assert_eq!(first.price, 12_000_000);
        assert_eq!(first.store, "TechShop");
        assert_eq!(first.specifications["RAM"], "8GB");

        let second = &catalog.records()[1];
        assert_eq!(second.name, "iPhone 13");
        assert!(second.specifications.is_empty());
    }

    #[test]
    fn test_load_defaults_missing_fields() {
        let file = write_catalog("ProductName,StoreName\nXiaomi Note 12,Digikala\n");

        let catalog = Catalog::load(file.path()).unwrap();
        let record = &catalog.records()[0];
        assert_eq!(record.price, 0);
        assert!(record.specifications.is_empty());
        assert!(record.raw_specifications.is_none());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Catalog::load(Path::new("/nonexistent/products.csv")).unwrap_err();
        assert!(matches!(err, VitrinError::Config(_)));
    }

    #[test]
    fn test_load_requires_name_column() {
        let file = write_catalog("Title,Price\nGalaxy,100\n");
        let err = Catalog::load(file.path()).unwrap_err();
        assert!(matches!(err, VitrinError::Catalog(_)));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some("12000000"), "x"), 12_000_000);
        assert_eq!(parse_price(Some("12000000.0"), "x"), 12_000_000);
        assert_eq!(parse_price(Some("12,000,000"), "x"), 12_000_000);
        assert_eq!(parse_price(Some(" "), "x"), 0);
        assert_eq!(parse_price(Some("call us"), "x"), 0);
        assert_eq!(parse_price(None, "x"), 0);
    }

    #[test]
    fn test_decode_specifications_is_total() {
        assert!(decode_specifications(None).is_empty());
        assert!(decode_specifications(Some("")).is_empty());
        assert!(decode_specifications(Some("not json")).is_empty());
        assert!(decode_specifications(Some("[1, 2]")).is_empty());
        assert!(decode_specifications(Some("\"8GB\"")).is_empty());

        let specs = decode_specifications(Some(r#"{"Screen": "6.4 inch", "RAM": "8GB"}"#));
        let keys: Vec<_> = specs.keys().cloned().collect();
        assert_eq!(keys, vec!["Screen", "RAM"]);
    }
}
