//! Geometrische Hilfsfunktionen für Kollisionsprüfung und Orientierungen.
//!
//! Alle Prüfungen arbeiten auf achsenparallelen Boxen; Positionen sind die
//! Ecke, die dem Container-Ursprung am nächsten liegt.

use crate::model::PlacedItem;
use crate::types::{BoundingBox, Vec3};

/// Prüft, ob eine Box an `position` mit `extents` ein platziertes Objekt überschneidet.
///
/// Zwei Boxen überschneiden sich NICHT, wenn sie in mindestens einer Achse
/// getrennt sind; berührende Flächen gelten als getrennt.
///
/// # Parameter
/// * `position` - Ecke der Box am Ursprung
/// * `extents` - Ausdehnung der Box in der gewählten Orientierung
/// * `placed` - Bereits platzierte Objekte
/// * `tolerance` - Numerische Toleranz für berührende Flächen
pub fn collides_with_any(
    position: Vec3,
    extents: Vec3,
    placed: &[PlacedItem],
    tolerance: f64,
) -> bool {
    let candidate = BoundingBox::from_position_and_dims(position, extents);
    placed
        .iter()
        .any(|p| candidate.intersects(&p.bounding_box(), tolerance))
}

/// Prüft, ob eine Box an `position` mit `extents` vollständig im Container liegt.
pub fn fits_in_container(position: Vec3, extents: Vec3, container: Vec3, tolerance: f64) -> bool {
    BoundingBox::from_position_and_dims(position, extents).lies_within(&container, tolerance)
}

/// Prüft, ob jede Box mit Ecke auf `point` zwangsläufig ein platziertes Objekt überschneidet.
pub fn anchor_blocked(point: &Vec3, placed: &[PlacedItem], tolerance: f64) -> bool {
    placed
        .iter()
        .any(|p| p.bounding_box().blocks_anchor(point, tolerance))
}

/// Berechnet die Überlappung zweier Intervalle in einer Dimension.
///
/// # Rückgabewert
/// Länge der Überlappung, mindestens 0.0
///
/// # Beispiele
/// ```
/// use cubage_service::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Die sechs Achsenpermutationen einer Box, Identität zuerst.
const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [1, 0, 2],
    [0, 2, 1],
    [2, 0, 1],
    [1, 2, 0],
    [2, 1, 0],
];

/// Liefert die unterschiedlichen achsenparallelen Orientierungen einer Box.
///
/// Permutationen mit identischen Ausdehnungen werden zusammengefasst: ein
/// Würfel ergibt eine Orientierung, eine Box mit zwei gleichen Kanten drei.
/// Ohne Rotation (`allow_rotation == false`) wird nur die Ausgangslage geliefert.
pub fn distinct_orientations(dims: Vec3, allow_rotation: bool, tolerance: f64) -> Vec<Vec3> {
    if !allow_rotation {
        return vec![dims];
    }

    let axes = [dims.x, dims.y, dims.z];
    let mut orientations: Vec<Vec3> = Vec::with_capacity(PERMUTATIONS.len());
    for [a, b, c] in PERMUTATIONS {
        let candidate = Vec3::new(axes[a], axes[b], axes[c]);
        if !orientations
            .iter()
            .any(|existing| existing.approx_eq(&candidate, tolerance))
        {
            orientations.push(candidate);
        }
    }
    orientations
}

/// Summe der paarweisen Schnittvolumina, 0.0 für eine gültige Beladung.
pub fn total_overlap_volume(placed: &[PlacedItem]) -> f64 {
    let mut total = 0.0;
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            total += a.bounding_box().intersection_volume(&b.bounding_box());
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackableItem;
    use crate::types::EPSILON_GENERAL;

    fn placed(label: &str, position: Vec3, extents: Vec3) -> PlacedItem {
        PlacedItem {
            item: PackableItem::new(label, extents, 1.0).unwrap(),
            position,
            extents,
        }
    }

    #[test]
    fn collision_detects_overlap_but_not_contact() {
        let a = placed("a", Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
        let b = placed("b", Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let c = placed("c", Vec3::new(0.9, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));

        let unit = Vec3::new(1.0, 1.0, 1.0);
        assert!(!collides_with_any(b.position, unit, &[a.clone()], EPSILON_GENERAL));
        assert!(collides_with_any(c.position, unit, &[a.clone()], EPSILON_GENERAL));
        assert!(collides_with_any(
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.2, 0.2, 0.2),
            &[a.clone(), b.clone()],
            EPSILON_GENERAL
        ));
        assert!((total_overlap_volume(&[a, b, c]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fits_in_container_checks_far_corner() {
        let container = Vec3::new(2.0, 2.0, 2.0);
        assert!(fits_in_container(
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            container,
            EPSILON_GENERAL
        ));
        assert!(!fits_in_container(
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            container,
            EPSILON_GENERAL
        ));
    }

    #[test]
    fn anchor_blocked_on_near_faces_only() {
        let items = [placed("a", Vec3::zero(), Vec3::new(1.0, 1.0, 1.0))];
        assert!(anchor_blocked(&Vec3::new(0.5, 0.5, 0.5), &items, EPSILON_GENERAL));
        assert!(anchor_blocked(&Vec3::zero(), &items, EPSILON_GENERAL));
        assert!(!anchor_blocked(&Vec3::new(1.0, 0.0, 0.0), &items, EPSILON_GENERAL));
        assert!(!anchor_blocked(&Vec3::new(0.0, 0.0, 1.0), &items, EPSILON_GENERAL));
    }

    #[test]
    fn orientations_collapse_equal_extents() {
        let distinct = distinct_orientations(Vec3::new(1.0, 2.0, 3.0), true, EPSILON_GENERAL);
        assert_eq!(distinct.len(), 6);
        assert_eq!(distinct[0], Vec3::new(1.0, 2.0, 3.0));

        let two_equal = distinct_orientations(Vec3::new(0.36, 0.36, 0.64), true, EPSILON_GENERAL);
        assert_eq!(two_equal.len(), 3);

        let cube = distinct_orientations(Vec3::new(1.0, 1.0, 1.0), true, EPSILON_GENERAL);
        assert_eq!(cube, vec![Vec3::new(1.0, 1.0, 1.0)]);
    }

    #[test]
    fn orientations_fixed_without_rotation() {
        let fixed = distinct_orientations(Vec3::new(1.0, 2.0, 3.0), false, EPSILON_GENERAL);
        assert_eq!(fixed, vec![Vec3::new(1.0, 2.0, 3.0)]);
    }
}
