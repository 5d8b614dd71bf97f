//! Common types and traits for 3D geometry.
//!
//! All lengths are meters, all weights kilograms.

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::overlap_1d;

/// Global numerical tolerance for floating-point comparisons in meters.
pub const EPSILON_GENERAL: f64 = 1e-9;

/// Represents a 3D vector or point in space.
///
/// Used for positions, extents and calculations inside a container.
///
/// # Examples
/// ```
/// use cubage_service::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let extents = Vec3::new(0.5, 0.5, 0.5);
/// assert_eq!(position + extents, Vec3::new(1.5, 2.5, 3.5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (length axis)
    /// * `y` - Y component (width axis)
    /// * `z` - Z component (height axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (container origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Product of all components. Useful for extent vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `outer` - The outer extents (e.g. container dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance
            && self.y <= outer.y + tolerance
            && self.z <= outer.z + tolerance
    }

    /// Component-wise equality within a tolerance.
    #[inline]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

/// Trait for objects with 3D extents.
pub trait Dimensional {
    /// Returns the extents of the object.
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + extents)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and extents.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks whether the open interiors of two boxes intersect.
    ///
    /// Boxes that only touch on a face, edge or corner do not intersect.
    /// `tolerance` absorbs rounding noise on touching faces.
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        !(self.max.x <= other.min.x + tolerance
            || other.max.x <= self.min.x + tolerance
            || self.max.y <= other.min.y + tolerance
            || other.max.y <= self.min.y + tolerance
            || self.max.z <= other.min.z + tolerance
            || other.max.z <= self.min.z + tolerance)
    }

    /// Volume of the intersection of both boxes, 0.0 when disjoint.
    #[inline]
    pub fn intersection_volume(&self, other: &Self) -> f64 {
        overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x)
            * overlap_1d(self.min.y, self.max.y, other.min.y, other.max.y)
            * overlap_1d(self.min.z, self.max.z, other.min.z, other.max.z)
    }

    /// Checks if a point lies in the half-open region `[min, max)` of the box.
    ///
    /// Any box whose near corner sits on such a point overlaps this one.
    #[inline]
    pub fn blocks_anchor(&self, point: &Vec3, tolerance: f64) -> bool {
        point.x >= self.min.x - tolerance
            && point.x < self.max.x - tolerance
            && point.y >= self.min.y - tolerance
            && point.y < self.max.y - tolerance
            && point.z >= self.min.z - tolerance
            && point.z < self.max.z - tolerance
    }

    /// Checks if the box lies within `[0, bounds]` on every axis.
    #[inline]
    pub fn lies_within(&self, bounds: &Vec3, tolerance: f64) -> bool {
        self.min.x >= -tolerance
            && self.min.y >= -tolerance
            && self.min.z >= -tolerance
            && self.max.fits_within(bounds, tolerance)
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Center of mass calculation helper.
///
/// Accumulates weighted positions in the XY plane.
#[derive(Clone, Debug, Default)]
pub struct CenterOfMassCalculator {
    weighted_x: f64,
    weighted_y: f64,
    total_weight: f64,
}

impl CenterOfMassCalculator {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a weighted point.
    pub fn add_point(&mut self, x: f64, y: f64, weight: f64) {
        self.weighted_x += x * weight;
        self.weighted_y += y * weight;
        self.total_weight += weight;
    }

    /// Calculates the center of mass.
    ///
    /// # Returns
    /// `Some((x, y))` for a valid center of mass, `None` if no weight is present
    pub fn compute(&self) -> Option<(f64, f64)> {
        if self.total_weight <= 0.0 {
            None
        } else {
            Some((
                self.weighted_x / self.total_weight,
                self.weighted_y / self.total_weight,
            ))
        }
    }

    /// Distance of the center of mass to a reference point, `None` without weight.
    pub fn distance_to(&self, reference: (f64, f64)) -> Option<f64> {
        self.compute().map(|(cx, cy)| {
            let dx = cx - reference.0;
            let dy = cy - reference.1;
            (dx * dx + dy * dy).sqrt()
        })
    }
}
