//! Data models for the placement engine.
//!
//! - `PackableItem`: a labeled box with extents and weight
//! - `Container`: the single transport container of one placement call
//! - `PlacedItem`: an item with its chosen orientation and position
//!
//! Construction goes through validating constructors so the engine only
//! ever sees structurally sound input.

use thiserror::Error;

use crate::types::{BoundingBox, Dimensional, Vec3};

/// Structural validation error for items and containers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid label: {0}")]
    InvalidLabel(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive and finite, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_weight_value(value: f64, name: &str) -> Result<(), ValidationError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be non-negative and finite, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_dims(dims: Vec3, prefix: &str) -> Result<(), ValidationError> {
    validate_dimension(dims.x, &format!("{prefix}length"))?;
    validate_dimension(dims.y, &format!("{prefix}width"))?;
    validate_dimension(dims.z, &format!("{prefix}height"))?;
    Ok(())
}

/// A labeled box handed to the placement engine.
///
/// Independent of catalog products; the cubage manifest can produce these
/// from its lines, but callers may build them directly.
#[derive(Clone, Debug, PartialEq)]
pub struct PackableItem {
    pub label: String,
    pub dims: Vec3,
    pub weight: f64,
}

impl PackableItem {
    /// Creates a new item with validation.
    ///
    /// # Examples
    /// ```
    /// use cubage_service::model::PackableItem;
    /// use cubage_service::types::Vec3;
    ///
    /// assert!(PackableItem::new("A", Vec3::new(1.0, 0.5, 0.5), 12.0).is_ok());
    /// assert!(PackableItem::new("B", Vec3::new(-1.0, 0.5, 0.5), 12.0).is_err());
    /// ```
    pub fn new(label: impl Into<String>, dims: Vec3, weight: f64) -> Result<Self, ValidationError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::InvalidLabel(
                "Item label must not be empty".to_string(),
            ));
        }
        validate_dims(dims, &format!("Item '{}' ", label))?;
        validate_weight_value(weight, &format!("Item '{}' weight", label))?;
        Ok(Self {
            label,
            dims,
            weight,
        })
    }
}

impl Dimensional for PackableItem {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// The transport container of a placement call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
    pub dims: Vec3,
    pub max_weight: f64,
}

impl Container {
    /// Creates a new container after validating extents and capacity.
    pub fn new(dims: Vec3, max_weight: f64) -> Result<Self, ValidationError> {
        validate_dims(dims, "Container ")?;
        validate_weight_value(max_weight, "Container weight capacity")?;
        Ok(Self { dims, max_weight })
    }

    /// Center of the floor (XY plane).
    #[inline]
    pub fn center_xy(&self) -> (f64, f64) {
        (self.dims.x / 2.0, self.dims.y / 2.0)
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// An item with its position and the extents of the chosen orientation.
///
/// `position` is the corner closest to the container origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedItem {
    pub item: PackableItem,
    pub position: Vec3,
    pub extents: Vec3,
}

impl PlacedItem {
    /// Calculates the bounding box of the placed item.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position, self.extents)
    }

    /// Far corner of the placed item.
    #[inline]
    pub fn far_corner(&self) -> Vec3 {
        self.position + self.extents
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        self.extents
    }
}
