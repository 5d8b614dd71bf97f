//! Cubage aggregation.
//!
//! Resolves request lines against the catalog and folds them into a manifest
//! with total volume, total weight, boxable volume and the packaging
//! requirement. Unknown codes are dropped from the totals and reported in
//! `skipped`.

use serde_json::Value;

use crate::catalog::{CatalogAccessor, Product, ProductKind, normalize_code};
use crate::model::{PackableItem, ValidationError};
use crate::packaging::{PackagingConfig, PackagingRequirement, calculate_requirement};
use crate::types::Vec3;

/// One requested catalog code with its quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestLine {
    pub code: String,
    pub quantity: u32,
}

impl RequestLine {
    /// Creates a line; a zero quantity is raised to 1.
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity: quantity.max(1),
        }
    }

    /// Creates a line from loosely typed JSON values.
    pub fn from_values(code: &Value, quantity: Option<&Value>) -> Self {
        Self::new(crate::catalog::code_from_value(code), coerce_quantity(quantity))
    }
}

/// Reads a quantity leniently.
///
/// Integers pass through, floats are truncated toward zero and numeric
/// strings are parsed. Anything else, or a value below 1, becomes 1.
///
/// ```
/// use cubage_service::cubage::coerce_quantity;
/// use serde_json::json;
///
/// assert_eq!(coerce_quantity(Some(&json!(3))), 3);
/// assert_eq!(coerce_quantity(Some(&json!("2.9"))), 2);
/// assert_eq!(coerce_quantity(Some(&json!(-4))), 1);
/// assert_eq!(coerce_quantity(None), 1);
/// ```
pub fn coerce_quantity(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(q) if q.is_finite() && q >= 1.0 => q.trunc().min(u32::MAX as f64) as u32,
        _ => 1,
    }
}

/// A resolved request line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineResult {
    pub product: Product,
    pub quantity: u32,
    pub line_volume: f64,
    pub line_weight: f64,
    /// Dimensions used for packing; the surrogate box for accessories.
    pub effective_dims: Vec3,
}

impl LineResult {
    fn resolve(product: &Product, quantity: u32, config: &PackagingConfig) -> Self {
        let effective_dims = match product.kind {
            ProductKind::Accessory => config.accessory_box,
            ProductKind::IndividualBox | ProductKind::Standard => product.dims,
        };
        Self {
            product: product.clone(),
            quantity,
            line_volume: product.volume * f64::from(quantity),
            line_weight: product.weight * f64::from(quantity),
            effective_dims,
        }
    }

    /// Whether this line counts toward the boxable volume.
    pub fn is_boxable(&self) -> bool {
        self.product.kind != ProductKind::IndividualBox
    }
}

/// Result of one cubage request. Built per request, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct CubageManifest {
    pub lines: Vec<LineResult>,
    pub total_volume: f64,
    pub total_weight: f64,
    pub boxable_volume: f64,
    pub packaging: PackagingRequirement,
    /// Normalized codes that did not resolve, in input order.
    pub skipped: Vec<String>,
}

impl CubageManifest {
    pub fn found_lines(&self) -> usize {
        self.lines.len()
    }

    /// Expands every line into individual placement items.
    ///
    /// Labels are the product code, suffixed with `#n` (1-based) when the
    /// quantity is above one. Fails if a product has no usable dimensions.
    pub fn packable_items(&self) -> Result<Vec<PackableItem>, ValidationError> {
        let mut items = Vec::new();
        for line in &self.lines {
            for n in 1..=line.quantity {
                let label = if line.quantity > 1 {
                    format!("{}#{}", line.product.code, n)
                } else {
                    line.product.code.clone()
                };
                items.push(PackableItem::new(
                    label,
                    line.effective_dims,
                    line.product.weight,
                )?);
            }
        }
        Ok(items)
    }
}

#[derive(Default)]
struct Totals {
    volume: f64,
    weight: f64,
    boxable: f64,
}

/// Aggregates request lines into a manifest.
pub fn aggregate<C>(lines: &[RequestLine], catalog: &C, config: &PackagingConfig) -> CubageManifest
where
    C: CatalogAccessor + ?Sized,
{
    let mut resolved = Vec::with_capacity(lines.len());
    let mut skipped = Vec::new();

    for line in lines {
        let code = normalize_code(&line.code);
        match catalog.lookup(&code) {
            Some(product) => {
                resolved.push(LineResult::resolve(product, line.quantity.max(1), config))
            }
            None => skipped.push(code),
        }
    }

    let totals = resolved.iter().fold(Totals::default(), |acc, line| Totals {
        volume: acc.volume + line.line_volume,
        weight: acc.weight + line.line_weight,
        boxable: acc.boxable + if line.is_boxable() { line.line_volume } else { 0.0 },
    });

    let packaging = calculate_requirement(totals.boxable, config);

    tracing::debug!(
        kept = resolved.len(),
        skipped = skipped.len(),
        total_volume = totals.volume,
        boxable_volume = totals.boxable,
        units = packaging.count,
        "Cubage aggregated"
    );

    CubageManifest {
        lines: resolved,
        total_volume: totals.volume,
        total_weight: totals.weight,
        boxable_volume: totals.boxable,
        packaging,
        skipped,
    }
}
