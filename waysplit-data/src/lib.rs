//! Data access for the waysplit engine.
//!
//! Responsibilities:
//! - Decode OSM PBF extracts into coordinate and way registries.
//! - Persist cleaned topology (points, highways, segments) to SQLite.
//! - Encode geometry for storage; the engine itself never sees it.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `waysplit-core`).
//! - No referential validation on ingest: the cleaner owns integrity.
//!
//! Invariants:
//! - Persistence is all-or-nothing per run.
//! - No global mutable state.

pub mod ingest;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use ingest::{OsmDataset, OsmIngestError, OsmIngestSummary, ingest_osm_pbf};
pub use store::{PersistReport, PersistTopologyError, persist_topology_to_sqlite};
