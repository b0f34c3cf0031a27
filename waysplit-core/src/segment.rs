//! Splitting ways into junction-bounded segments.
//!
//! Split points are interior references that are junctions. A way's own
//! endpoints are never split points. Consecutive segments share the split
//! point, so geometry stays continuous across them.

use std::collections::{BTreeMap, btree_map};

use rayon::prelude::*;

use crate::{JunctionSet, NodeId, SegmentationError, Tags, Way, WayId, WayRegistry};

/// A contiguous, junction-bounded run of a way's references.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Parent way.
    pub way_id: WayId,
    /// Parent way's tags.
    pub tags: Tags,
    /// Zero-based position of this segment along the way.
    pub index: usize,
    /// Number of segments the parent way was split into.
    pub count: usize,
    /// References covered by this segment, at least two.
    pub refs: Vec<NodeId>,
}

/// Segments produced for every way, keyed by way identifier.
///
/// Every way in the input registry has an entry holding at least one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    by_way: BTreeMap<WayId, Vec<Segment>>,
}

impl Segmentation {
    /// Segments of one way, in traversal order.
    #[must_use]
    pub fn get(&self, way_id: WayId) -> Option<&[Segment]> {
        self.by_way.get(&way_id).map(Vec::as_slice)
    }

    /// Number of segments for one way.
    #[must_use]
    pub fn segment_count(&self, way_id: WayId) -> Option<usize> {
        self.by_way.get(&way_id).map(Vec::len)
    }

    /// Number of ways segmented.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_way.len()
    }

    /// Whether no way was segmented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_way.is_empty()
    }

    /// Number of segments across all ways.
    #[must_use]
    pub fn total_segments(&self) -> usize {
        self.by_way.values().map(Vec::len).sum()
    }

    /// Number of ways split into more than one segment.
    #[must_use]
    pub fn split_ways(&self) -> usize {
        self.by_way.values().filter(|segments| segments.len() > 1).count()
    }

    /// Per-way segment lists in way identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (WayId, &[Segment])> + '_ {
        self.by_way
            .iter()
            .map(|(id, segments)| (*id, segments.as_slice()))
    }

    /// Every segment, grouped by way in identifier order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.by_way.values().flatten()
    }
}

impl IntoIterator for Segmentation {
    type Item = (WayId, Vec<Segment>);
    type IntoIter = btree_map::IntoIter<WayId, Vec<Segment>>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_way.into_iter()
    }
}

/// Segment every way of a cleaned registry.
///
/// `junctions` must be complete before this is called. Each way is handled
/// independently and in parallel; the result for a way depends only on its
/// own references and the junction set.
///
/// # Errors
/// Returns [`SegmentationError`] if a segmentation invariant fails. This
/// signals a defect, not bad input.
///
/// # Examples
/// ```
/// use waysplit_core::{NodeId, Tags, WayId, WayRegistry, detect_junctions, segment};
///
/// # fn main() -> Result<(), waysplit_core::SegmentationError> {
/// let highway = Tags::from_pairs([("highway", "residential")]);
/// let refs = |ids: &[i64]| ids.iter().copied().map(NodeId::new).collect::<Vec<_>>();
/// let mut ways = WayRegistry::new();
/// ways.insert_tagged(WayId::new(1), highway.clone(), refs(&[1, 2, 3, 4, 5]));
/// ways.insert_tagged(WayId::new(2), highway, refs(&[6, 3, 7]));
///
/// let segmentation = segment(&ways, &detect_junctions(&ways))?;
/// let first = segmentation.get(WayId::new(1)).unwrap_or_default();
/// assert_eq!(first.len(), 2);
/// assert_eq!(first[0].refs, refs(&[1, 2, 3]));
/// assert_eq!(first[1].refs, refs(&[3, 4, 5]));
/// # Ok(())
/// # }
/// ```
pub fn segment(
    ways: &WayRegistry,
    junctions: &JunctionSet,
) -> Result<Segmentation, SegmentationError> {
    let by_way = ways
        .as_map()
        .par_iter()
        .map(|(id, way)| segment_way(*id, way, junctions).map(|segments| (*id, segments)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(Segmentation { by_way })
}

/// Segment a single way.
///
/// # Errors
/// See [`split_refs`].
pub fn segment_way(
    way_id: WayId,
    way: &Way,
    junctions: &JunctionSet,
) -> Result<Vec<Segment>, SegmentationError> {
    let pieces = split_refs(way_id, &way.refs, junctions)?;
    let count = pieces.len();
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, refs)| Segment {
            way_id,
            tags: way.tags.clone(),
            index,
            count,
            refs: refs.to_vec(),
        })
        .collect())
}

/// Partition `refs` at interior junctions into overlapping slices.
///
/// Split positions are taken in traversal order. Each slice includes both of
/// its boundary references, and a way with no interior junction yields one
/// slice covering all of `refs`.
///
/// # Errors
/// Returns [`SegmentationError::DegenerateWay`] when `refs` holds fewer than
/// two references, and the other variants if the produced slices break the
/// segmentation invariants.
///
/// # Examples
/// ```
/// use waysplit_core::{JunctionSet, NodeId, WayId, split_refs};
///
/// # fn main() -> Result<(), waysplit_core::SegmentationError> {
/// let refs: Vec<NodeId> = [1, 2, 3, 1].into_iter().map(NodeId::new).collect();
/// let junctions = JunctionSet::from_iter([NodeId::new(1)]);
///
/// // A closed loop only repeats at its endpoints, so it stays whole.
/// let pieces = split_refs(WayId::new(9), &refs, &junctions)?;
/// assert_eq!(pieces, vec![refs.as_slice()]);
/// # Ok(())
/// # }
/// ```
pub fn split_refs<'a>(
    way_id: WayId,
    refs: &'a [NodeId],
    junctions: &JunctionSet,
) -> Result<Vec<&'a [NodeId]>, SegmentationError> {
    let last = match refs.len() {
        0 | 1 => {
            return Err(SegmentationError::DegenerateWay {
                way_id,
                len: refs.len(),
            });
        }
        len => len - 1,
    };

    let mut pieces = Vec::new();
    let mut start = 0;
    for (position, id) in refs.iter().enumerate().take(last).skip(1) {
        if junctions.contains(*id) {
            pieces.push(slice_piece(way_id, refs, start, position, pieces.len())?);
            start = position;
        }
    }
    pieces.push(slice_piece(way_id, refs, start, last, pieces.len())?);

    if !reconstructs(refs, &pieces) {
        return Err(SegmentationError::Reconstruction { way_id });
    }
    Ok(pieces)
}

fn slice_piece(
    way_id: WayId,
    refs: &[NodeId],
    start: usize,
    end: usize,
    index: usize,
) -> Result<&[NodeId], SegmentationError> {
    refs.get(start..=end)
        .filter(|piece| piece.len() >= 2)
        .ok_or(SegmentationError::ShortSegment {
            way_id,
            index,
            len: (end + 1).saturating_sub(start),
        })
}

/// Join slices, dropping the shared point at each boundary, and compare.
fn reconstructs(refs: &[NodeId], pieces: &[&[NodeId]]) -> bool {
    let mut rebuilt: Vec<NodeId> = Vec::with_capacity(refs.len());
    for piece in pieces {
        match rebuilt.last() {
            None => rebuilt.extend_from_slice(piece),
            Some(tail) => {
                if piece.first() != Some(tail) {
                    return false;
                }
                rebuilt.extend(piece.iter().skip(1));
            }
        }
    }
    rebuilt == refs
}
