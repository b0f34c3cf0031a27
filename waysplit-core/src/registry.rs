//! Coordinate and way registries.
//!
//! Both registries are plain values threaded through the pipeline. Each stage
//! takes ownership (or a mutable borrow) from the previous one; nothing is
//! held in global state.

use std::collections::{BTreeMap, HashMap, btree_map, hash_map};

use geo::Coord;

use crate::{NodeId, Tags, WayId};

/// Mapping from point identifier to its WGS84 position.
///
/// Coordinates use `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waysplit_core::{CoordinateRegistry, NodeId};
///
/// let mut coords = CoordinateRegistry::new();
/// coords.insert(NodeId::new(1), Coord { x: 107.6, y: -6.9 });
/// assert!(coords.contains(NodeId::new(1)));
/// assert_eq!(coords.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateRegistry {
    coords: HashMap<NodeId, Coord<f64>>,
}

impl CoordinateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a point. A repeated identifier replaces the earlier position.
    pub fn insert(&mut self, id: NodeId, location: Coord<f64>) -> Option<Coord<f64>> {
        self.coords.insert(id, location)
    }

    /// Position of a point, if present.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<Coord<f64>> {
        self.coords.get(&id).copied()
    }

    /// Whether the point is present.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.coords.contains_key(&id)
    }

    /// Remove a point, returning its position.
    pub fn remove(&mut self, id: NodeId) -> Option<Coord<f64>> {
        self.coords.remove(&id)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the registry holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Identifiers of all points, in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.coords.keys().copied()
    }

    /// All points, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Coord<f64>)> + '_ {
        self.coords.iter().map(|(id, coord)| (*id, *coord))
    }

    /// Keep only points for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(NodeId, Coord<f64>) -> bool,
    {
        self.coords.retain(|id, coord| keep(*id, *coord));
    }
}

impl FromIterator<(NodeId, Coord<f64>)> for CoordinateRegistry {
    fn from_iter<I: IntoIterator<Item = (NodeId, Coord<f64>)>>(iter: I) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }
}

impl Extend<(NodeId, Coord<f64>)> for CoordinateRegistry {
    fn extend<I: IntoIterator<Item = (NodeId, Coord<f64>)>>(&mut self, iter: I) {
        self.coords.extend(iter);
    }
}

impl IntoIterator for CoordinateRegistry {
    type Item = (NodeId, Coord<f64>);
    type IntoIter = hash_map::IntoIter<NodeId, Coord<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.coords.into_iter()
    }
}

/// A polyline: its tags and the ordered points it passes through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Way {
    /// Tag-set, including the classification tag.
    pub tags: Tags,
    /// Point identifiers in traversal order. Repeats are allowed.
    pub refs: Vec<NodeId>,
}

impl Way {
    /// Construct a way from its tags and references.
    #[must_use]
    pub const fn new(tags: Tags, refs: Vec<NodeId>) -> Self {
        Self { tags, refs }
    }
}

/// Mapping from way identifier to its tags and point references.
///
/// Iteration follows identifier order so downstream output is stable.
///
/// # Examples
/// ```
/// use waysplit_core::{NodeId, Tags, WayId, WayRegistry};
///
/// let mut ways = WayRegistry::new();
/// let highway = Tags::from_pairs([("highway", "residential")]);
/// let refs = vec![NodeId::new(1), NodeId::new(2)];
/// assert!(ways.insert_tagged(WayId::new(10), highway, refs.clone()));
/// assert!(!ways.insert_tagged(WayId::new(11), Tags::new(), refs));
/// assert_eq!(ways.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WayRegistry {
    ways: BTreeMap<WayId, Way>,
}

impl WayRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a way unconditionally, replacing any earlier entry.
    pub fn insert(&mut self, id: WayId, way: Way) -> Option<Way> {
        self.ways.insert(id, way)
    }

    /// Record a way only when it carries the classification tag.
    ///
    /// Returns whether the way was accepted.
    pub fn insert_tagged(&mut self, id: WayId, tags: Tags, refs: Vec<NodeId>) -> bool {
        if !tags.is_classified() {
            return false;
        }
        self.ways.insert(id, Way::new(tags, refs));
        true
    }

    /// Look up a way.
    #[must_use]
    pub fn get(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    /// Whether the way is present.
    #[must_use]
    pub fn contains(&self, id: WayId) -> bool {
        self.ways.contains_key(&id)
    }

    /// Remove a way together with its tags.
    pub fn remove(&mut self, id: WayId) -> Option<Way> {
        self.ways.remove(&id)
    }

    /// Number of ways.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ways.len()
    }

    /// Whether the registry holds no ways.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }

    /// Ways in identifier order.
    pub fn iter(&self) -> btree_map::Iter<'_, WayId, Way> {
        self.ways.iter()
    }

    /// Keep only ways for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(WayId, &Way) -> bool,
    {
        self.ways.retain(|id, way| keep(*id, way));
    }

    pub(crate) const fn as_map(&self) -> &BTreeMap<WayId, Way> {
        &self.ways
    }
}

impl FromIterator<(WayId, Way)> for WayRegistry {
    fn from_iter<I: IntoIterator<Item = (WayId, Way)>>(iter: I) -> Self {
        Self {
            ways: iter.into_iter().collect(),
        }
    }
}

impl Extend<(WayId, Way)> for WayRegistry {
    fn extend<I: IntoIterator<Item = (WayId, Way)>>(&mut self, iter: I) {
        self.ways.extend(iter);
    }
}

impl IntoIterator for WayRegistry {
    type Item = (WayId, Way);
    type IntoIter = btree_map::IntoIter<WayId, Way>;

    fn into_iter(self) -> Self::IntoIter {
        self.ways.into_iter()
    }
}

impl<'a> IntoIterator for &'a WayRegistry {
    type Item = (&'a WayId, &'a Way);
    type IntoIter = btree_map::Iter<'a, WayId, Way>;

    fn into_iter(self) -> Self::IntoIter {
        self.ways.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn highway() -> Tags {
        Tags::from_pairs([("highway", "tertiary")])
    }

    #[rstest]
    fn coordinate_insert_replaces_previous_position() {
        let mut coords = CoordinateRegistry::new();
        let id = NodeId::new(5);
        coords.insert(id, Coord { x: 1.0, y: 1.0 });
        let previous = coords.insert(id, Coord { x: 2.0, y: 3.0 });
        assert_eq!(previous, Some(Coord { x: 1.0, y: 1.0 }));
        assert_eq!(coords.get(id), Some(Coord { x: 2.0, y: 3.0 }));
        assert_eq!(coords.len(), 1);
    }

    #[rstest]
    fn unclassified_ways_are_refused(highway: Tags) {
        let mut ways = WayRegistry::new();
        let refs = vec![NodeId::new(1), NodeId::new(2)];
        assert!(!ways.insert_tagged(WayId::new(1), Tags::from_pairs([("railway", "rail")]), refs.clone()));
        assert!(ways.insert_tagged(WayId::new(2), highway, refs));
        assert!(!ways.contains(WayId::new(1)));
        assert!(ways.contains(WayId::new(2)));
    }

    #[rstest]
    fn ways_iterate_in_identifier_order(highway: Tags) {
        let ways: WayRegistry = [30, -4, 12]
            .into_iter()
            .map(|raw| (WayId::new(raw), Way::new(highway.clone(), Vec::new())))
            .collect();
        let order: Vec<i64> = ways.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(order, vec![-4, 12, 30]);
    }

    #[rstest]
    fn owned_ways_are_moved_out_in_identifier_order(highway: Tags) {
        let refs = vec![NodeId::new(1), NodeId::new(2)];
        let ways: WayRegistry = [7, 3]
            .into_iter()
            .map(|raw| (WayId::new(raw), Way::new(highway.clone(), refs.clone())))
            .collect();

        let drained: Vec<(WayId, Way)> = ways.into_iter().collect();

        let order: Vec<i64> = drained.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(order, vec![3, 7]);
        assert!(drained.iter().all(|(_, way)| way.refs == refs));
    }
}
