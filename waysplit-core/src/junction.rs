//! Junction detection over a cleaned way registry.
//!
//! A junction is any point referenced more than once across all ways. Two
//! ways meeting at a point and one way revisiting a point are counted the
//! same way.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::{NodeId, WayRegistry};

/// Points referenced more than once across the way registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunctionSet {
    nodes: HashSet<NodeId>,
}

impl JunctionSet {
    /// Whether `id` is a junction.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Number of junctions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no point is shared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Junction identifiers, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }
}

impl FromIterator<NodeId> for JunctionSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

type OccurrenceCounts = HashMap<NodeId, usize>;

/// Count every reference of every way and keep the points seen more than once.
///
/// Ways are counted in parallel into per-thread tallies which are merged
/// before any count is read, so each reference contributes exactly once.
/// Run this only on a registry that has already been cleaned; a way that is
/// later discarded must not create junctions.
///
/// # Examples
/// ```
/// use waysplit_core::{NodeId, Tags, WayId, WayRegistry, detect_junctions};
///
/// let highway = Tags::from_pairs([("highway", "primary")]);
/// let mut ways = WayRegistry::new();
/// let refs = |ids: &[i64]| ids.iter().copied().map(NodeId::new).collect::<Vec<_>>();
/// ways.insert_tagged(WayId::new(1), highway.clone(), refs(&[1, 2, 3, 4, 5]));
/// ways.insert_tagged(WayId::new(2), highway, refs(&[6, 3, 7]));
///
/// let junctions = detect_junctions(&ways);
/// assert_eq!(junctions.len(), 1);
/// assert!(junctions.contains(NodeId::new(3)));
/// ```
#[must_use]
pub fn detect_junctions(ways: &WayRegistry) -> JunctionSet {
    let counts = ways
        .as_map()
        .par_iter()
        .fold(OccurrenceCounts::new, |mut counts, (_, way)| {
            for id in &way.refs {
                *counts.entry(*id).or_default() += 1;
            }
            counts
        })
        .reduce(OccurrenceCounts::new, merge_counts);

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect()
}

fn merge_counts(left: OccurrenceCounts, right: OccurrenceCounts) -> OccurrenceCounts {
    let (mut larger, smaller) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    for (id, count) in smaller {
        *larger.entry(id).or_default() += count;
    }
    larger
}
