//! Defects detected while segmenting ways.
//!
//! None of these can be caused by imperfect input once the registries have
//! been cleaned. Seeing one means the engine itself is broken, so callers
//! should abort the run rather than persist partial output.

use thiserror::Error;

use crate::WayId;

/// Internal invariant violations raised by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentationError {
    /// A way with fewer than two references reached the segmenter.
    #[error("way {way_id} has {len} references; ways must be cleaned before segmentation")]
    DegenerateWay {
        /// Offending way.
        way_id: WayId,
        /// Number of references it holds.
        len: usize,
    },
    /// A produced segment holds fewer than two points.
    #[error("segment {index} of way {way_id} spans {len} points")]
    ShortSegment {
        /// Parent way.
        way_id: WayId,
        /// Ordinal of the segment within the way.
        index: usize,
        /// Number of points the segment would hold.
        len: usize,
    },
    /// Joining the segments does not reproduce the way's references.
    #[error("segments of way {way_id} do not reconstruct its reference sequence")]
    Reconstruction {
        /// Parent way.
        way_id: WayId,
    },
}
