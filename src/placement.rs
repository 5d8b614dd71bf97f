//! Anchor-point placement of labeled boxes inside a single container.
//!
//! The engine is a deterministic greedy heuristic:
//! - items are processed once, largest volume first (stable for ties)
//! - each item is tried at every candidate anchor point, lowest z first,
//!   then y, then x, in each of its distinct orientations
//! - the first combination that stays inside the container, overlaps no
//!   placed item and keeps the load within the weight capacity is committed
//! - a committed item spawns new anchors on its +x, +y and +z faces
//!
//! Items that cannot be placed are reported, never raised. There is exactly
//! one container per call; nothing overflows into a second one.

use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{anchor_blocked, collides_with_any, distinct_orientations, fits_in_container};
use crate::model::{Container, PackableItem, PlacedItem};
use crate::types::{CenterOfMassCalculator, Dimensional, EPSILON_GENERAL, Vec3};

/// Configuration for the placement algorithm.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementConfig {
    /// Length tolerance in meters for bounds and overlap comparisons,
    /// capped at [`PlacementConfig::MAX_EPSILON`]
    pub epsilon: f64,
    /// Whether items may be turned into any of their six axis orientations
    pub allow_item_rotation: bool,
    /// Prefer anchors that keep the center of mass near the floor center
    pub distribute: bool,
}

impl PlacementConfig {
    pub const DEFAULT_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_ALLOW_ITEM_ROTATION: bool = true;
    pub const DEFAULT_DISTRIBUTE: bool = false;
    /// Upper bound of the length tolerance; larger values would let items
    /// poke out of the container or into each other.
    pub const MAX_EPSILON: f64 = 1e-6;

    /// Tolerance actually applied by the engine.
    pub fn tolerance(&self) -> f64 {
        if self.epsilon.is_finite() && self.epsilon >= 0.0 {
            self.epsilon.min(Self::MAX_EPSILON)
        } else {
            Self::DEFAULT_EPSILON
        }
    }

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PlacementConfigBuilder {
        PlacementConfigBuilder::default()
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            allow_item_rotation: Self::DEFAULT_ALLOW_ITEM_ROTATION,
            distribute: Self::DEFAULT_DISTRIBUTE,
        }
    }
}

/// Builder for [`PlacementConfig`].
#[derive(Clone, Debug, Default)]
pub struct PlacementConfigBuilder {
    config: PlacementConfig,
}

impl PlacementConfigBuilder {
    /// Sets the numerical tolerance.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Enables or disables item rotation.
    pub fn allow_item_rotation(mut self, allow: bool) -> Self {
        self.config.allow_item_rotation = allow;
        self
    }

    /// Enables or disables distribute mode.
    pub fn distribute(mut self, distribute: bool) -> Self {
        self.config.distribute = distribute;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PlacementConfig {
        self.config
    }
}

/// Result of a placement call.
#[derive(Clone, Debug)]
pub struct PlacementResult {
    pub container: Container,
    /// Placed items in placement order.
    pub placed: Vec<PlacedItem>,
    /// Items that could not be placed, in original input order.
    pub unplaced: Vec<UnplacedItem>,
}

impl PlacementResult {
    /// Indicates whether every item was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Total weight of all placed items.
    pub fn total_weight(&self) -> f64 {
        self.placed.iter().map(|p| p.item.weight).sum()
    }

    /// Share of the container volume occupied by placed items, in percent.
    pub fn utilization_percent(&self) -> f64 {
        let total = self.container.volume();
        if total <= 0.0 {
            return 0.0;
        }
        let used: f64 = self.placed.iter().map(|p| p.volume()).sum();
        (used / total) * 100.0
    }

    /// Labels of all unplaced items, in original input order.
    pub fn unfitted_labels(&self) -> Vec<String> {
        self.unplaced.iter().map(|u| u.item.label.clone()).collect()
    }
}

/// An item that could not be placed.
#[derive(Clone, Debug)]
pub struct UnplacedItem {
    pub item: PackableItem,
    pub reason: UnplacedReason,
    /// Position of the item in the caller's input list.
    pub input_index: usize,
}

/// Reasons why an item could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    /// The item alone exceeds the container weight capacity.
    TooHeavyForContainer,
    /// No orientation of the item fits the empty container.
    DimensionsExceedContainer,
    /// The items placed before it used up the weight capacity.
    WeightCapacityExhausted,
    /// No free anchor accepts the item in any orientation.
    NoFreeSpace,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::TooHeavyForContainer => "too_heavy_for_container",
            UnplacedReason::DimensionsExceedContainer => "dimensions_exceed_container",
            UnplacedReason::WeightCapacityExhausted => "weight_capacity_exhausted",
            UnplacedReason::NoFreeSpace => "no_free_space",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::TooHeavyForContainer => {
                write!(f, "Item exceeds the container weight capacity on its own")
            }
            UnplacedReason::DimensionsExceedContainer => {
                write!(f, "Item does not fit the container in any orientation")
            }
            UnplacedReason::WeightCapacityExhausted => {
                write!(f, "Remaining weight capacity is too small for the item")
            }
            UnplacedReason::NoFreeSpace => {
                write!(f, "No free position inside the container fits the item")
            }
        }
    }
}

/// Events emitted while placing, for live visualization.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PlacementEvent {
    /// The container is opened; always the first event.
    ContainerOpened {
        dims: Vec3,
        max_weight: f64,
        item_count: usize,
    },
    /// An item was placed.
    ItemPlaced {
        label: String,
        position: Vec3,
        extents: Vec3,
        weight: f64,
        total_weight: f64,
    },
    /// An item could not be placed.
    ItemRejected {
        label: String,
        weight: f64,
        dims: Vec3,
        reason_code: String,
        reason_text: String,
    },
    /// Placement finished; always the last event.
    Finished { fitted: usize, unfitted: usize },
}

/// Places items into the container with the default configuration.
///
/// # Examples
/// ```
/// use cubage_service::model::{Container, PackableItem};
/// use cubage_service::placement::place_items;
/// use cubage_service::types::Vec3;
///
/// let container = Container::new(Vec3::new(2.0, 1.0, 1.0), 100.0).unwrap();
/// let items = vec![PackableItem::new("A", Vec3::new(1.0, 1.0, 1.0), 10.0).unwrap()];
/// let result = place_items(items, container);
/// assert!(result.is_complete());
/// assert_eq!(result.placed[0].position, Vec3::zero());
/// ```
pub fn place_items(items: Vec<PackableItem>, container: Container) -> PlacementResult {
    place_items_with_config(items, container, PlacementConfig::default())
}

/// Placement with a custom configuration.
pub fn place_items_with_config(
    items: Vec<PackableItem>,
    container: Container,
    config: PlacementConfig,
) -> PlacementResult {
    place_items_with_progress(items, container, config, |_| {})
}

/// Placement with a progress callback invoked for every step (suitable for SSE).
pub fn place_items_with_progress(
    items: Vec<PackableItem>,
    container: Container,
    config: PlacementConfig,
    mut on_event: impl FnMut(&PlacementEvent),
) -> PlacementResult {
    on_event(&PlacementEvent::ContainerOpened {
        dims: container.dims,
        max_weight: container.max_weight,
        item_count: items.len(),
    });

    // Bigger first; sort_by is stable so equal volumes keep input order
    let mut queue: Vec<(usize, PackableItem)> = items.into_iter().enumerate().collect();
    queue.sort_by(|(_, a), (_, b)| b.volume().partial_cmp(&a.volume()).unwrap_or(Ordering::Equal));

    let mut load = LoadState::new(&container, &config);
    let mut unplaced: Vec<UnplacedItem> = Vec::new();

    for (input_index, item) in queue {
        match load.try_place(&item) {
            Ok(candidate) => {
                load.commit(item, candidate);
                if let Some(placed) = load.placed.last() {
                    on_event(&PlacementEvent::ItemPlaced {
                        label: placed.item.label.clone(),
                        position: placed.position,
                        extents: placed.extents,
                        weight: placed.item.weight,
                        total_weight: load.total_weight,
                    });
                }
            }
            Err(reason) => {
                on_event(&PlacementEvent::ItemRejected {
                    label: item.label.clone(),
                    weight: item.weight,
                    dims: item.dims,
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
                unplaced.push(UnplacedItem {
                    item,
                    reason,
                    input_index,
                });
            }
        }
    }

    unplaced.sort_by_key(|u| u.input_index);

    let placed = load.placed;
    on_event(&PlacementEvent::Finished {
        fitted: placed.len(),
        unfitted: unplaced.len(),
    });
    tracing::debug!(
        fitted = placed.len(),
        unfitted = unplaced.len(),
        distribute = config.distribute,
        "placement finished"
    );

    PlacementResult {
        container,
        placed,
        unplaced,
    }
}

/// A feasible position for the next item.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    anchor_index: usize,
    position: Vec3,
    extents: Vec3,
}

/// Mutable state of one placement call.
struct LoadState<'a> {
    container: &'a Container,
    config: &'a PlacementConfig,
    placed: Vec<PlacedItem>,
    /// Candidate anchors, kept sorted by (z, y, x).
    anchors: Vec<Vec3>,
    total_weight: f64,
    eps: f64,
}

impl<'a> LoadState<'a> {
    fn new(container: &'a Container, config: &'a PlacementConfig) -> Self {
        Self {
            container,
            config,
            placed: Vec::new(),
            anchors: vec![Vec3::zero()],
            total_weight: 0.0,
            eps: config.tolerance(),
        }
    }

    /// Finds a position for the item or explains why there is none.
    fn try_place(&self, item: &PackableItem) -> Result<Candidate, UnplacedReason> {
        let eps = self.eps;

        // Weight is compared exactly; the tolerance is a length
        if item.weight > self.container.max_weight {
            return Err(UnplacedReason::TooHeavyForContainer);
        }

        let orientations: Vec<Vec3> =
            distinct_orientations(item.dims, self.config.allow_item_rotation, eps)
                .into_iter()
                .filter(|extents| extents.fits_within(&self.container.dims, eps))
                .collect();
        if orientations.is_empty() {
            return Err(UnplacedReason::DimensionsExceedContainer);
        }

        if self.total_weight + item.weight > self.container.max_weight {
            return Err(UnplacedReason::WeightCapacityExhausted);
        }

        let found = if self.config.distribute {
            self.most_balanced_fit(item, &orientations)
        } else {
            self.first_fit(&orientations)
        };
        found.ok_or(UnplacedReason::NoFreeSpace)
    }

    fn is_free(&self, position: Vec3, extents: Vec3) -> bool {
        let eps = self.eps;
        fits_in_container(position, extents, self.container.dims, eps)
            && !collides_with_any(position, extents, &self.placed, eps)
    }

    /// First anchor (in z, y, x order) and orientation that accepts the item.
    fn first_fit(&self, orientations: &[Vec3]) -> Option<Candidate> {
        self.anchors
            .iter()
            .enumerate()
            .find_map(|(anchor_index, &anchor)| {
                orientations
                    .iter()
                    .find(|&&extents| self.is_free(anchor, extents))
                    .map(|&extents| Candidate {
                        anchor_index,
                        position: anchor,
                        extents,
                    })
            })
    }

    /// Lowest feasible layer first, then the position whose resulting center of
    /// mass lies closest to the floor center, then y and x.
    fn most_balanced_fit(&self, item: &PackableItem, orientations: &[Vec3]) -> Option<Candidate> {
        let mut best: Option<(Candidate, PlacementScore)> = None;

        for (anchor_index, &anchor) in self.anchors.iter().enumerate() {
            for &extents in orientations {
                if !self.is_free(anchor, extents) {
                    continue;
                }
                let candidate = Candidate {
                    anchor_index,
                    position: anchor,
                    extents,
                };
                let score = PlacementScore {
                    z: anchor.z,
                    balance: self.balance_after(item, &candidate),
                    y: anchor.y,
                    x: anchor.x,
                };
                let better = match &best {
                    None => true,
                    Some((_, current)) => is_better_score(&score, current, self.eps),
                };
                if better {
                    best = Some((candidate, score));
                }
            }
        }

        best.map(|(candidate, _)| candidate)
    }

    /// Distance of the load's center of mass from the floor center after
    /// adding the candidate. Weightless loads are balanced by volume instead.
    fn balance_after(&self, item: &PackableItem, candidate: &Candidate) -> f64 {
        let reference = self.container.center_xy();
        let candidate_center = (
            candidate.position.x + candidate.extents.x / 2.0,
            candidate.position.y + candidate.extents.y / 2.0,
        );

        let mut by_weight = CenterOfMassCalculator::new();
        let mut by_volume = CenterOfMassCalculator::new();
        by_weight.add_point(candidate_center.0, candidate_center.1, item.weight);
        by_volume.add_point(candidate_center.0, candidate_center.1, candidate.extents.volume());
        for p in &self.placed {
            let center = p.bounding_box().center();
            by_weight.add_point(center.x, center.y, p.item.weight);
            by_volume.add_point(center.x, center.y, p.extents.volume());
        }

        by_weight
            .distance_to(reference)
            .or_else(|| by_volume.distance_to(reference))
            .unwrap_or(0.0)
    }

    /// Records the placement and refreshes the anchor set.
    fn commit(&mut self, item: PackableItem, candidate: Candidate) {
        self.anchors.remove(candidate.anchor_index);
        self.total_weight += item.weight;
        let placed = PlacedItem {
            item,
            position: candidate.position,
            extents: candidate.extents,
        };
        let (position, far) = (placed.position, placed.far_corner());
        let footprint = placed.bounding_box();
        self.placed.push(placed);

        let eps = self.eps;
        self.anchors
            .retain(|anchor| !footprint.blocks_anchor(anchor, eps));

        for anchor in [
            Vec3::new(far.x, position.y, position.z),
            Vec3::new(position.x, far.y, position.z),
            Vec3::new(position.x, position.y, far.z),
        ] {
            self.add_anchor(anchor);
        }
    }

    fn add_anchor(&mut self, anchor: Vec3) {
        let eps = self.eps;
        let dims = self.container.dims;
        if anchor.x >= dims.x - eps || anchor.y >= dims.y - eps || anchor.z >= dims.z - eps {
            return;
        }
        if anchor_blocked(&anchor, &self.placed, eps) {
            return;
        }
        if self.anchors.iter().any(|a| a.approx_eq(&anchor, eps)) {
            return;
        }
        let index = self
            .anchors
            .partition_point(|a| compare_anchors(a, &anchor) == Ordering::Less);
        self.anchors.insert(index, anchor);
    }
}

/// Anchor order: lowest z, then y, then x.
fn compare_anchors(a: &Vec3, b: &Vec3) -> Ordering {
    a.z.total_cmp(&b.z)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.x.total_cmp(&b.x))
}

/// Rating of a position in distribute mode. Lower values are better.
#[derive(Clone, Copy, Debug)]
struct PlacementScore {
    z: f64,
    balance: f64,
    y: f64,
    x: f64,
}

/// Priority: z (low) > balance (low) > y (low) > x (low)
fn is_better_score(new: &PlacementScore, current: &PlacementScore, eps: f64) -> bool {
    for (a, b) in [
        (new.z, current.z),
        (new.balance, current.balance),
        (new.y, current.y),
        (new.x, current.x),
    ] {
        match compare_with_epsilon(a, b, eps) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    false
}

fn compare_with_epsilon(a: f64, b: f64, eps: f64) -> Ordering {
    if (a - b).abs() <= eps {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::total_overlap_volume;

    fn container(dims: (f64, f64, f64), max_weight: f64) -> Container {
        Container::new(Vec3::from(dims), max_weight).unwrap()
    }

    fn item(label: &str, dims: (f64, f64, f64), weight: f64) -> PackableItem {
        PackableItem::new(label, Vec3::from(dims), weight).unwrap()
    }

    fn assert_valid_load(result: &PlacementResult, input_len: usize) {
        let eps = 1e-9;
        assert_eq!(result.placed_count() + result.unplaced_count(), input_len);
        for p in &result.placed {
            assert!(
                p.bounding_box().lies_within(&result.container.dims, eps),
                "item {} leaves the container",
                p.item.label
            );
        }
        assert!(total_overlap_volume(&result.placed) <= eps);
        assert!(result.total_weight() <= result.container.max_weight);
    }

    #[test]
    fn single_item_snaps_to_origin() {
        let result = place_items(vec![item("A", (1.0, 1.0, 1.0), 10.0)], container((2.0, 2.0, 2.0), 100.0));
        assert!(result.is_complete());
        assert_eq!(result.placed[0].position, Vec3::zero());
        assert_eq!(result.placed[0].extents, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn item_larger_than_container_is_unfitted() {
        let result = place_items(
            vec![item("huge", (3.0, 3.0, 3.0), 1.0)],
            container((2.0, 2.0, 2.0), 100.0),
        );
        assert!(result.placed.is_empty());
        assert_eq!(result.unfitted_labels(), vec!["huge".to_string()]);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::DimensionsExceedContainer);
    }

    #[test]
    fn weight_capacity_rejects_later_item() {
        let items = vec![
            item("small", (1.0, 1.0, 0.5), 6.0),
            item("big", (1.0, 1.0, 1.0), 6.0),
        ];
        let result = place_items(items, container((2.0, 1.0, 1.0), 10.0));

        assert_valid_load(&result, 2);
        assert_eq!(result.placed.len(), 1);
        assert_eq!(result.placed[0].item.label, "big");
        assert_eq!(result.unfitted_labels(), vec!["small".to_string()]);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::WeightCapacityExhausted);
    }

    #[test]
    fn item_heavier_than_capacity_is_reported() {
        let result = place_items(vec![item("lead", (0.5, 0.5, 0.5), 50.0)], container((1.0, 1.0, 1.0), 10.0));
        assert_eq!(result.unplaced[0].reason, UnplacedReason::TooHeavyForContainer);
        assert_eq!(result.unplaced[0].reason.code(), "too_heavy_for_container");
    }

    #[test]
    fn large_tolerance_never_admits_oversize_or_overweight_items() {
        let config = PlacementConfig::builder().epsilon(0.05).build();
        let items = vec![
            item("long", (1.04, 1.0, 1.0), 1.0),
            item("heavy", (1.0, 1.0, 1.0), 10.04),
        ];
        let result = place_items_with_config(items, container((1.0, 1.0, 1.0), 10.0), config);

        assert!(result.placed.is_empty());
        assert_eq!(result.unplaced[0].reason, UnplacedReason::DimensionsExceedContainer);
        assert_eq!(result.unplaced[1].reason, UnplacedReason::TooHeavyForContainer);

        let pair = vec![item("a", (1.0, 1.0, 1.0), 5.0), item("b", (1.0, 1.0, 1.0), 5.02)];
        let result = place_items_with_config(pair, container((2.0, 1.0, 1.0), 10.0), config);
        assert_valid_load(&result, 2);
        assert_eq!(result.placed.len(), 1);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::WeightCapacityExhausted);
        for p in &result.placed {
            assert!(p.bounding_box().lies_within(&result.container.dims, 0.0));
        }
    }

    #[test]
    fn tolerance_is_capped() {
        let wide = PlacementConfig::builder().epsilon(0.05).build();
        assert_eq!(wide.tolerance(), PlacementConfig::MAX_EPSILON);

        let broken = PlacementConfig::builder().epsilon(f64::NAN).build();
        assert_eq!(broken.tolerance(), PlacementConfig::DEFAULT_EPSILON);
        assert_eq!(PlacementConfig::default().tolerance(), 1e-9);
    }

    #[test]
    fn rotates_items_to_fit() {
        let rotated = place_items(vec![item("plank", (1.0, 3.0, 1.0), 1.0)], container((3.0, 1.0, 1.0), 10.0));
        assert!(rotated.is_complete());
        assert_eq!(rotated.placed[0].extents, Vec3::new(3.0, 1.0, 1.0));

        let fixed = place_items_with_config(
            vec![item("plank", (1.0, 3.0, 1.0), 1.0)],
            container((3.0, 1.0, 1.0), 10.0),
            PlacementConfig::builder().allow_item_rotation(false).build(),
        );
        assert!(fixed.placed.is_empty());
        assert_eq!(fixed.unplaced[0].reason, UnplacedReason::DimensionsExceedContainer);
    }

    #[test]
    fn fills_container_with_cubes_and_reports_overflow() {
        let items: Vec<PackableItem> = (0..9)
            .map(|i| item(&format!("cube-{i}"), (1.0, 1.0, 1.0), 1.0))
            .collect();
        let result = place_items(items, container((2.0, 2.0, 2.0), 100.0));

        assert_valid_load(&result, 9);
        assert_eq!(result.placed_count(), 8);
        assert_eq!(result.unfitted_labels(), vec!["cube-8".to_string()]);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::NoFreeSpace);
        assert!((result.utilization_percent() - 100.0).abs() < 1e-9);

        // Floor is filled before the second layer
        for p in &result.placed[..4] {
            assert_eq!(p.position.z, 0.0);
        }
        for p in &result.placed[4..] {
            assert_eq!(p.position.z, 1.0);
        }
    }

    #[test]
    fn equal_volumes_keep_input_order() {
        let items = vec![item("first", (1.0, 1.0, 1.0), 1.0), item("second", (1.0, 1.0, 1.0), 1.0)];
        let result = place_items(items, container((2.0, 1.0, 1.0), 10.0));
        assert_eq!(result.placed[0].item.label, "first");
        assert_eq!(result.placed[0].position, Vec3::zero());
        assert_eq!(result.placed[1].item.label, "second");
        assert_eq!(result.placed[1].position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn unfitted_items_keep_input_order() {
        let items = vec![
            item("big", (2.0, 2.0, 2.0), 1.0),
            item("fits", (0.5, 0.5, 0.5), 1.0),
            item("bigger", (3.0, 3.0, 3.0), 1.0),
        ];
        let result = place_items(items, container((1.0, 1.0, 1.0), 10.0));
        assert_eq!(result.unfitted_labels(), vec!["big".to_string(), "bigger".to_string()]);
        assert_eq!(result.unplaced[0].input_index, 0);
        assert_eq!(result.unplaced[1].input_index, 2);
    }

    #[test]
    fn fully_unplaceable_set_returns_everything_unfitted() {
        let items = vec![item("a", (5.0, 5.0, 5.0), 1.0), item("b", (6.0, 1.0, 1.0), 1.0)];
        let result = place_items(items, container((1.0, 1.0, 1.0), 10.0));
        assert!(result.placed.is_empty());
        assert_eq!(result.unplaced_count(), 2);
    }

    #[test]
    fn placement_is_deterministic() {
        let items: Vec<PackableItem> = (0..25)
            .map(|i| {
                let f = i as f64;
                item(
                    &format!("item-{i}"),
                    (0.2 + (f * 0.37) % 0.6, 0.3 + (f * 0.53) % 0.5, 0.25 + (f * 0.29) % 0.4),
                    1.0 + (f * 7.0) % 13.0,
                )
            })
            .collect();
        let first = place_items(items.clone(), container((2.0, 1.5, 1.2), 150.0));
        let second = place_items(items.clone(), container((2.0, 1.5, 1.2), 150.0));

        assert_valid_load(&first, items.len());
        assert_eq!(first.placed, second.placed);
        assert_eq!(first.unfitted_labels(), second.unfitted_labels());
    }

    #[test]
    fn mixed_load_respects_all_invariants_in_distribute_mode() {
        let items: Vec<PackableItem> = (0..40)
            .map(|i| {
                let f = i as f64;
                item(
                    &format!("box-{i}"),
                    (0.15 + (f * 0.41) % 0.7, 0.2 + (f * 0.17) % 0.6, 0.1 + (f * 0.23) % 0.5),
                    (f * 3.0) % 11.0,
                )
            })
            .collect();
        let config = PlacementConfig::builder().distribute(true).build();
        let result = place_items_with_config(items.clone(), container((2.4, 1.8, 1.5), 120.0), config);
        assert_valid_load(&result, items.len());
    }

    #[test]
    fn distribute_prefers_balanced_anchor() {
        let items = vec![item("a", (1.0, 1.0, 1.0), 5.0), item("b", (1.0, 1.0, 1.0), 5.0)];

        let greedy = place_items(items.clone(), container((2.0, 3.0, 1.0), 100.0));
        assert_eq!(greedy.placed[1].position, Vec3::new(1.0, 0.0, 0.0));

        let balanced = place_items_with_config(
            items,
            container((2.0, 3.0, 1.0), 100.0),
            PlacementConfig::builder().distribute(true).build(),
        );
        assert_eq!(balanced.placed[0].position, Vec3::zero());
        assert_eq!(balanced.placed[1].position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn progress_events_frame_the_run() {
        let items = vec![item("ok", (1.0, 1.0, 1.0), 1.0), item("too-big", (2.0, 2.0, 2.0), 1.0)];
        let mut events = Vec::new();
        let result = place_items_with_progress(
            items,
            container((1.0, 1.0, 1.0), 10.0),
            PlacementConfig::default(),
            |evt| events.push(evt.clone()),
        );

        assert_eq!(result.placed_count(), 1);
        assert!(matches!(events.first(), Some(PlacementEvent::ContainerOpened { item_count: 2, .. })));
        assert!(matches!(
            events.last(),
            Some(PlacementEvent::Finished { fitted: 1, unfitted: 1 })
        ));
        let rejected = events
            .iter()
            .filter(|e| matches!(e, PlacementEvent::ItemRejected { .. }))
            .count();
        assert_eq!(rejected, 1);

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["type"], "ContainerOpened");
    }
}
