//! Referential-integrity cleaning of the coordinate and way registries.
//!
//! Raw extracts routinely contain points no highway uses and highways that
//! reference points clipped away at the extract boundary. Both are repaired
//! here by deletion; nothing is reported as an error.

use std::collections::HashSet;

use log::debug;

use crate::{CoordinateRegistry, NodeId, WayId, WayRegistry};

/// Counters describing what a cleaning pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CleanReport {
    /// Points present before cleaning.
    pub coords_before: usize,
    /// Ways present before cleaning.
    pub ways_before: usize,
    /// Ways removed because they lack the classification tag.
    pub unclassified_ways: usize,
    /// Distinct point identifiers referenced by classified ways.
    pub referenced_coords: usize,
    /// Referenced identifiers with no point in the registry.
    pub invalid_coords: usize,
    /// Referenced identifiers backed by a point.
    pub valid_coords: usize,
    /// Points referenced by no classified way.
    pub unused_coords: usize,
    /// Ways removed for a dangling reference or fewer than two references.
    pub incomplete_ways: usize,
    /// Points whose only referencing ways were removed as incomplete.
    pub orphaned_coords: usize,
    /// Points remaining after cleaning.
    pub coords_after: usize,
    /// Ways remaining after cleaning.
    pub ways_after: usize,
}

impl CleanReport {
    /// Whether the pass removed anything.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.coords_before == self.coords_after && self.ways_before == self.ways_after
    }
}

/// Remove unreferenced points and incomplete ways in place.
///
/// A way is incomplete when it references a point absent from `coords` or
/// holds one reference or none. Ways without a classification tag should
/// never reach the registry; any that do are dropped as well. Points are then
/// kept only if a surviving way references them, so a second pass over the
/// output removes nothing.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waysplit_core::{CoordinateRegistry, NodeId, Tags, WayId, WayRegistry, clean};
///
/// let mut coords: CoordinateRegistry = [(1, 0.0), (2, 1.0), (9, 5.0)]
///     .into_iter()
///     .map(|(id, x)| (NodeId::new(id), Coord { x, y: 0.0 }))
///     .collect();
/// let mut ways = WayRegistry::new();
/// let highway = Tags::from_pairs([("highway", "residential")]);
/// ways.insert_tagged(WayId::new(1), highway.clone(), vec![NodeId::new(1), NodeId::new(2)]);
/// ways.insert_tagged(WayId::new(2), highway, vec![NodeId::new(2), NodeId::new(4)]);
///
/// let report = clean(&mut coords, &mut ways);
/// assert_eq!(report.incomplete_ways, 1);
/// assert_eq!(report.unused_coords, 1);
/// assert_eq!(coords.len(), 2);
/// assert!(ways.contains(WayId::new(1)));
/// ```
pub fn clean(coords: &mut CoordinateRegistry, ways: &mut WayRegistry) -> CleanReport {
    let mut report = CleanReport {
        coords_before: coords.len(),
        ways_before: ways.len(),
        ..CleanReport::default()
    };

    ways.retain(|_, way| way.tags.is_classified());
    report.unclassified_ways = report.ways_before - ways.len();

    let referenced = referenced_ids(ways);
    let available: HashSet<NodeId> = coords.ids().collect();
    let invalid: HashSet<NodeId> = referenced.difference(&available).copied().collect();
    report.referenced_coords = referenced.len();
    report.invalid_coords = invalid.len();
    report.valid_coords = referenced.len() - invalid.len();
    report.unused_coords = available.difference(&referenced).count();

    let incomplete: Vec<WayId> = ways
        .iter()
        .filter(|(_, way)| way.refs.len() <= 1 || way.refs.iter().any(|id| invalid.contains(id)))
        .map(|(id, _)| *id)
        .collect();
    for id in &incomplete {
        debug!("Discarding incomplete way {id}");
        ways.remove(*id);
    }
    report.incomplete_ways = incomplete.len();

    let kept = referenced_ids(ways);
    coords.retain(|id, _| kept.contains(&id));
    report.orphaned_coords = report.valid_coords - kept.len();

    report.coords_after = coords.len();
    report.ways_after = ways.len();
    report
}

fn referenced_ids(ways: &WayRegistry) -> HashSet<NodeId> {
    ways.iter()
        .flat_map(|(_, way)| way.refs.iter().copied())
        .collect()
}
