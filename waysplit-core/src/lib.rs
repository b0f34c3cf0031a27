//! Topology cleaning and segmentation for highway extracts.
//!
//! Responsibilities:
//! - Hold raw points and ways in explicit registries.
//! - Remove unreferenced points and ways with dangling or too few references.
//! - Detect junctions and split ways into overlapping segments at them.
//!
//! Boundaries:
//! - No I/O. Decoding map files and writing to a store live in
//!   `waysplit-data`.
//!
//! Invariants:
//! - After cleaning, every way holds at least two references and every
//!   reference resolves to a point.
//! - Joining a way's segments, dropping the shared point at each boundary,
//!   reproduces the way's references exactly.
//! - No global mutable state.

mod clean;
mod error;
mod ids;
mod junction;
mod pipeline;
mod registry;
mod segment;
pub mod tags;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clean::{CleanReport, clean};
pub use error::SegmentationError;
pub use ids::{NodeId, WayId};
pub use junction::{JunctionSet, detect_junctions};
pub use pipeline::{HighwayRecord, TopologyOutput, run_pipeline};
pub use registry::{CoordinateRegistry, Way, WayRegistry};
pub use segment::{Segment, Segmentation, segment, segment_way, split_refs};
pub use tags::Tags;
