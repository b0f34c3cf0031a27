//! End-to-end cleaning and segmentation of one dataset.
//!
//! Stages run strictly in order: cleaning, then junction detection, then
//! segmentation. Junctions are counted only over ways that survived
//! cleaning, and segmentation starts only once every junction is known.

use std::time::Instant;

use log::info;

use crate::{
    CleanReport, CoordinateRegistry, JunctionSet, NodeId, Segment, Segmentation,
    SegmentationError, Tags, WayId, WayRegistry, clean, detect_junctions, segment,
};

/// A cleaned way together with its segment count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighwayRecord<'a> {
    /// Way identifier.
    pub way_id: WayId,
    /// Way tags.
    pub tags: &'a Tags,
    /// Full cleaned reference sequence.
    pub refs: &'a [NodeId],
    /// Number of segments the way was split into.
    pub segment_count: usize,
}

/// Everything the engine hands to a persistence gateway for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyOutput {
    coords: CoordinateRegistry,
    ways: WayRegistry,
    report: CleanReport,
    junctions: JunctionSet,
    segmentation: Segmentation,
}

impl TopologyOutput {
    /// Cleaned points.
    #[must_use]
    pub const fn coords(&self) -> &CoordinateRegistry {
        &self.coords
    }

    /// Cleaned ways.
    #[must_use]
    pub const fn ways(&self) -> &WayRegistry {
        &self.ways
    }

    /// Counters from the cleaning stage.
    #[must_use]
    pub const fn clean_report(&self) -> &CleanReport {
        &self.report
    }

    /// Points shared by more than one reference.
    #[must_use]
    pub const fn junctions(&self) -> &JunctionSet {
        &self.junctions
    }

    /// Segments for every way.
    #[must_use]
    pub const fn segmentation(&self) -> &Segmentation {
        &self.segmentation
    }

    /// Cleaned ways with their segment counts, in identifier order.
    ///
    /// The segmentation holds exactly one entry per cleaned way, so both
    /// sequences walk the same identifiers in step.
    pub fn highways(&self) -> impl Iterator<Item = HighwayRecord<'_>> + '_ {
        self.ways
            .iter()
            .zip(self.segmentation.iter())
            .map(|((id, way), (segmented_id, segments))| {
                debug_assert_eq!(*id, segmented_id, "segmentation out of step with ways");
                HighwayRecord {
                    way_id: *id,
                    tags: &way.tags,
                    refs: &way.refs,
                    segment_count: segments.len(),
                }
            })
    }

    /// Every segment, grouped by way in identifier order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segmentation.segments()
    }

    /// Split the output back into its parts.
    #[must_use]
    pub fn into_parts(self) -> (CoordinateRegistry, WayRegistry, Segmentation) {
        (self.coords, self.ways, self.segmentation)
    }
}

/// Clean the registries, detect junctions and segment every way.
///
/// Integrity repairs are logged as counts. Only segmentation defects are
/// returned as errors.
///
/// # Errors
/// Returns [`SegmentationError`] when the segmenter breaks one of its
/// invariants.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waysplit_core::{CoordinateRegistry, NodeId, Tags, WayId, WayRegistry, run_pipeline};
///
/// # fn main() -> Result<(), waysplit_core::SegmentationError> {
/// let coords: CoordinateRegistry = (1..=3)
///     .map(|id| (NodeId::new(id), Coord { x: 0.0, y: 0.0 }))
///     .collect();
/// let mut ways = WayRegistry::new();
/// let refs = [1, 2, 3].into_iter().map(NodeId::new).collect();
/// ways.insert_tagged(WayId::new(1), Tags::from_pairs([("highway", "residential")]), refs);
///
/// let output = run_pipeline(coords, ways)?;
/// assert_eq!(output.segmentation().segment_count(WayId::new(1)), Some(1));
/// # Ok(())
/// # }
/// ```
pub fn run_pipeline(
    mut coords: CoordinateRegistry,
    mut ways: WayRegistry,
) -> Result<TopologyOutput, SegmentationError> {
    let report = timed("Cleaning data", || clean(&mut coords, &mut ways));
    log_clean_report(&report);

    let junctions = timed("Detecting junctions", || detect_junctions(&ways));
    info!("Shared coords: {}", junctions.len());

    let segmentation = timed("Splitting segments", || segment(&ways, &junctions))?;
    info!(
        "Split highways: {} of {} ({} segments)",
        segmentation.split_ways(),
        segmentation.len(),
        segmentation.total_segments()
    );

    Ok(TopologyOutput {
        coords,
        ways,
        report,
        junctions,
        segmentation,
    })
}

fn timed<T>(stage: &str, run: impl FnOnce() -> T) -> T {
    info!("{stage} :: begin");
    let started = Instant::now();
    let result = run();
    info!("{stage} :: end -> {:?}", started.elapsed());
    result
}

fn log_clean_report(report: &CleanReport) {
    info!(
        "Before cleaning: {} coords, {} highways",
        report.coords_before, report.ways_before
    );
    info!(
        "Cleaning up: {} referenced, {} invalid, {} valid, {} unused, {} orphaned coords; \
         {} incomplete and {} unclassified highways",
        report.referenced_coords,
        report.invalid_coords,
        report.valid_coords,
        report.unused_coords,
        report.orphaned_coords,
        report.incomplete_ways,
        report.unclassified_ways
    );
    info!(
        "After cleaning: {} coords, {} highways",
        report.coords_after, report.ways_after
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{coords_from, node_ids, way};
    use rstest::rstest;

    fn run(coords: CoordinateRegistry, ways: WayRegistry) -> TopologyOutput {
        run_pipeline(coords, ways).unwrap_or_else(|err| panic!("pipeline should succeed: {err}"))
    }

    #[rstest]
    fn discarded_ways_do_not_create_junctions() {
        let coords = coords_from(&[1, 2, 3]);
        let ways = WayRegistry::from_iter([way(1, &[1, 2, 3]), way(2, &[2, 4])]);

        let output = run(coords, ways);

        assert!(output.junctions().is_empty());
        assert!(!output.ways().contains(WayId::new(2)));
        assert_eq!(output.segmentation().segment_count(WayId::new(1)), Some(1));
    }

    #[rstest]
    fn highway_records_report_segment_counts() {
        let coords = coords_from(&[1, 2, 3, 4, 5, 6, 7]);
        let ways = WayRegistry::from_iter([way(1, &[1, 2, 3, 4, 5]), way(2, &[6, 3, 7])]);

        let output = run(coords, ways);
        let records: Vec<_> = output.highways().collect();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.segment_count, 2, "way {} should split", record.way_id);
        }
        assert_eq!(output.segments().count(), 4);
        let first = records.first().map(|record| record.refs.to_vec());
        assert_eq!(first, Some(node_ids(&[1, 2, 3, 4, 5])));
    }

    #[rstest]
    fn every_cleaned_way_has_a_highway_record() {
        let coords = coords_from(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let ways = WayRegistry::from_iter([
            way(1, &[1, 2, 3, 4, 5]),
            way(2, &[6, 3, 7]),
            way(3, &[8, 9]),
            way(4, &[9, 10]),
        ]);

        let output = run(coords, ways);
        let records: Vec<_> = output.highways().collect();

        assert_eq!(records.len(), output.ways().len());
        assert_eq!(records.len(), output.segmentation().len());
        for record in &records {
            let segments = output.segmentation().get(record.way_id).unwrap_or_default();
            assert_eq!(record.segment_count, segments.len());
        }
        let counts: Vec<(i64, usize)> = records
            .iter()
            .map(|record| (record.way_id.get(), record.segment_count))
            .collect();
        assert_eq!(counts, vec![(1, 2), (2, 2), (3, 1)]);
    }

    #[rstest]
    fn empty_input_produces_empty_output() {
        let output = run(CoordinateRegistry::new(), WayRegistry::new());

        assert!(output.coords().is_empty());
        assert!(output.ways().is_empty());
        assert!(output.segmentation().is_empty());
        assert_eq!(output.highways().count(), 0);
    }
}
