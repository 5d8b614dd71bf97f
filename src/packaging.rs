//! Packaging requirement for the boxable share of a shipment.
//!
//! Two policies exist:
//! - `UnitCount` (default): how many identical surrogate boxes hold the
//!   boxable volume, by ceiling division
//! - `SmallestFit`: the smallest box of a fixed catalog whose capacity
//!   covers the boxable volume

use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use crate::types::Vec3;

/// Surrogate box used for accessories and as the standard packaging unit.
pub const ACCESSORY_BOX_DIMS: Vec3 = Vec3::new(0.36, 0.36, 0.64);

/// Absorbs float noise when the boxable volume is an exact multiple of the unit.
const UNIT_RATIO_TOLERANCE: f64 = 1e-9;

/// A predefined packaging box for the smallest-fit policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StandardBox {
    pub name: &'static str,
    /// Capacity in m³.
    pub capacity: f64,
}

/// Box catalog, ordered by capacity.
pub const STANDARD_BOXES: [StandardBox; 6] = [
    StandardBox { name: "Box 12TP", capacity: 0.11 },
    StandardBox { name: "Box 15TP", capacity: 0.12 },
    StandardBox { name: "Box 19TP", capacity: 0.21 },
    StandardBox { name: "Box 22TP", capacity: 0.33 },
    StandardBox { name: "Box 26TP", capacity: 0.50 },
    StandardBox { name: "Box 30TP", capacity: 0.67 },
];

/// Policy for turning boxable volume into packaging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PackagingPolicy {
    #[default]
    UnitCount,
    SmallestFit,
}

impl PackagingPolicy {
    pub fn code(&self) -> &'static str {
        match self {
            PackagingPolicy::UnitCount => "unit_count",
            PackagingPolicy::SmallestFit => "smallest_fit",
        }
    }
}

impl FromStr for PackagingPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "unit_count" | "units" | "ceil" => Ok(PackagingPolicy::UnitCount),
            "smallest_fit" | "smallest" => Ok(PackagingPolicy::SmallestFit),
            other => Err(format!(
                "unknown packaging policy '{}', expected unit_count or smallest_fit",
                other
            )),
        }
    }
}

/// Configuration of the packaging calculator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackagingConfig {
    pub policy: PackagingPolicy,
    /// Surrogate box shape for accessories; its volume is the packaging unit.
    pub accessory_box: Vec3,
}

impl PackagingConfig {
    /// Volume of one packaging unit.
    pub fn unit_box_volume(&self) -> f64 {
        self.accessory_box.volume()
    }
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            policy: PackagingPolicy::default(),
            accessory_box: ACCESSORY_BOX_DIMS,
        }
    }
}

/// Packaging needed for the boxable volume.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackagingRequirement {
    pub policy: PackagingPolicy,
    pub count: u64,
    pub unit_volume: f64,
    pub total_packaging_volume: f64,
    /// Chosen catalog box, smallest-fit policy only.
    pub box_name: Option<String>,
}

/// Number of units of `unit_volume` needed for `boxable_volume`.
///
/// Zero for an empty (or negative) volume, otherwise at least one.
///
/// ```
/// use cubage_service::packaging::required_units;
///
/// assert_eq!(required_units(0.0, 0.5), 0);
/// assert_eq!(required_units(1.2, 0.5), 3);
/// ```
pub fn required_units(boxable_volume: f64, unit_volume: f64) -> u64 {
    if boxable_volume <= 0.0 || unit_volume <= 0.0 {
        return 0;
    }
    let ratio = boxable_volume / unit_volume;
    (ratio - UNIT_RATIO_TOLERANCE).ceil().max(1.0) as u64
}

/// Computes the packaging requirement for the configured policy.
pub fn calculate_requirement(boxable_volume: f64, config: &PackagingConfig) -> PackagingRequirement {
    match config.policy {
        PackagingPolicy::UnitCount => unit_requirement(
            PackagingPolicy::UnitCount,
            boxable_volume,
            config.unit_box_volume(),
            None,
        ),
        PackagingPolicy::SmallestFit => smallest_fit_requirement(boxable_volume),
    }
}

fn unit_requirement(
    policy: PackagingPolicy,
    boxable_volume: f64,
    unit_volume: f64,
    box_name: Option<String>,
) -> PackagingRequirement {
    let count = required_units(boxable_volume, unit_volume);
    PackagingRequirement {
        policy,
        count,
        unit_volume,
        total_packaging_volume: count as f64 * unit_volume,
        box_name,
    }
}

fn smallest_fit_requirement(boxable_volume: f64) -> PackagingRequirement {
    let fitting = STANDARD_BOXES
        .iter()
        .find(|b| b.capacity >= boxable_volume)
        .unwrap_or(&STANDARD_BOXES[STANDARD_BOXES.len() - 1]);

    // Larger than the largest box: several of the largest
    let box_name = (boxable_volume > 0.0).then(|| fitting.name.to_string());
    unit_requirement(
        PackagingPolicy::SmallestFit,
        boxable_volume,
        fitting.capacity,
        box_name,
    )
}
