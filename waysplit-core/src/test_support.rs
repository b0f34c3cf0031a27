//! Builders for small registries used by unit, property and behaviour tests.

use geo::Coord;

use crate::{CoordinateRegistry, NodeId, Tags, Way, WayId};

/// Tags of a plain residential highway.
#[must_use]
pub fn highway_tags() -> Tags {
    Tags::from_pairs([("highway", "residential")])
}

/// Wrap raw identifiers as [`NodeId`]s, keeping their order.
#[must_use]
pub fn node_ids(raw: &[i64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}

/// A residential way entry ready to collect into a `WayRegistry`.
#[must_use]
pub fn way(id: i64, refs: &[i64]) -> (WayId, Way) {
    (WayId::new(id), Way::new(highway_tags(), node_ids(refs)))
}

/// Points laid out along the equator, one unit apart, in the given order.
#[must_use]
pub fn coords_from(ids: &[i64]) -> CoordinateRegistry {
    (0_u32..)
        .zip(ids)
        .map(|(offset, id)| (NodeId::new(*id), Coord { x: f64::from(offset), y: 0.0 }))
        .collect()
}
