//! Product catalog access.
//!
//! The cubage aggregator only needs `lookup(code)`. The in-memory catalog is
//! built once at startup from a JSON array of product records and is never
//! mutated afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::Vec3;

/// Errors raised while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Catalog is not a valid JSON array of product records: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a product is routed into packaging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Irregular or small parts, re-packed into surrogate accessory boxes.
    Accessory,
    /// Ships in its own box; never re-packed.
    IndividualBox,
    #[default]
    Standard,
}

impl ProductKind {
    /// Interprets a catalog label; unknown labels are `Standard`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "accessory" | "accessories" => ProductKind::Accessory,
            "individual_box" | "individual" | "boxed" => ProductKind::IndividualBox,
            _ => ProductKind::Standard,
        }
    }
}

/// Immutable catalog product. Lengths in meters, volume in m³, weight in kg.
#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub code: String,
    pub name: String,
    pub dims: Vec3,
    pub volume: f64,
    pub weight: f64,
    pub kind: ProductKind,
}

impl Product {
    /// Creates a product with a normalized code.
    ///
    /// Negative or non-finite numbers become 0.0. Without an explicit
    /// volume, the volume is derived from the dimensions.
    pub fn new(
        code: &str,
        name: impl Into<String>,
        dims: Vec3,
        volume: Option<f64>,
        weight: f64,
        kind: ProductKind,
    ) -> Self {
        let dims = Vec3::new(non_negative(dims.x), non_negative(dims.y), non_negative(dims.z));
        let volume = volume.map(non_negative).unwrap_or_else(|| dims.volume());
        Self {
            code: normalize_code(code),
            name: name.into(),
            dims,
            volume,
            weight: non_negative(weight),
            kind,
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Canonical form of a product code: trimmed, trailing literal ".0" removed.
///
/// Spreadsheet exports turn numeric codes into floats, so `"12345.0"` and
/// `"12345"` must resolve to the same product.
///
/// ```
/// use cubage_service::catalog::normalize_code;
///
/// assert_eq!(normalize_code(" 12345.0 "), "12345");
/// assert_eq!(normalize_code("AB-7"), "AB-7");
/// ```
pub fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
}

/// Converts a JSON code value (string or number) to its normalized form.
pub fn code_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_code(s),
        Value::Number(n) => normalize_code(&n.to_string()),
        Value::Null => String::new(),
        other => normalize_code(&other.to_string()),
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("number pattern is valid")
    })
}

/// Reads a numeric catalog field leniently.
///
/// Numbers pass through. Strings lose their spaces, use `,` as decimal
/// separator and yield their first numeric token. Everything else is 0.0.
pub fn lenient_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned = s.trim().replace(' ', "").replace(',', ".");
            number_pattern()
                .find(&cleaned)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Read access to the product catalog.
pub trait CatalogAccessor {
    /// Resolves a product by code; the code is normalized before lookup.
    fn lookup(&self, code: &str) -> Option<&Product>;

    /// Number of products in the catalog.
    fn product_count(&self) -> usize;
}

/// One record of a catalog file. Field aliases follow the spreadsheet
/// export headers the catalog is usually generated from.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(default, alias = "Codigo", alias = "Código")]
    code: Value,
    #[serde(default, alias = "Nome")]
    name: Value,
    #[serde(default, alias = "Comprimento")]
    length: Value,
    #[serde(default, alias = "Largura")]
    width: Value,
    #[serde(default, alias = "Altura")]
    height: Value,
    #[serde(default, alias = "m3_total", alias = "M3", alias = "m3")]
    volume: Value,
    #[serde(default, alias = "Peso", alias = "peso")]
    weight: Value,
    #[serde(default, alias = "Tipo")]
    kind: Value,
}

impl ProductRecord {
    fn into_product(self) -> Product {
        let name = match self.name {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let volume = match self.volume {
            Value::Null => None,
            ref supplied => Some(lenient_f64(supplied)),
        };
        let kind = match &self.kind {
            Value::String(s) => ProductKind::from_label(s),
            _ => ProductKind::Standard,
        };
        Product::new(
            &code_from_value(&self.code),
            name,
            Vec3::new(
                lenient_f64(&self.length),
                lenient_f64(&self.width),
                lenient_f64(&self.height),
            ),
            volume,
            lenient_f64(&self.weight),
            kind,
        )
    }
}

/// Catalog held in memory, keyed by normalized code.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    products: HashMap<String, Product>,
}

impl InMemoryCatalog {
    /// Builds a catalog; the first product wins on duplicate codes and
    /// products with an empty code are skipped.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut map: HashMap<String, Product> = HashMap::new();
        for product in products {
            if product.code.is_empty() {
                tracing::warn!(name = %product.name, "⚠️ Skipping catalog record without code");
                continue;
            }
            if map.contains_key(&product.code) {
                tracing::warn!(code = %product.code, "⚠️ Duplicate catalog code, keeping first record");
                continue;
            }
            map.insert(product.code.clone(), product);
        }
        Self { products: map }
    }

    /// Parses a JSON array of product records.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<ProductRecord> = serde_json::from_str(raw)?;
        Ok(Self::from_products(
            records.into_iter().map(ProductRecord::into_product),
        ))
    }

    /// Loads a catalog file. A missing file yields an empty catalog.
    pub fn load_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "⚠️ Catalog file not found, starting with an empty catalog"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let catalog = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.product_count(),
            "📚 Catalog loaded"
        );
        Ok(catalog)
    }
}

impl CatalogAccessor for InMemoryCatalog {
    fn lookup(&self, code: &str) -> Option<&Product> {
        self.products.get(&normalize_code(code))
    }

    fn product_count(&self) -> usize {
        self.products.len()
    }
}
