//! Facade crate for the waysplit topology engine.
//!
//! This crate re-exports the cleaning and segmentation API and, behind the
//! `data` feature, the OSM ingestion and SQLite persistence collaborators.

#![forbid(unsafe_code)]

pub use waysplit_core::{
    CleanReport, CoordinateRegistry, HighwayRecord, JunctionSet, NodeId, Segment, Segmentation,
    SegmentationError, Tags, TopologyOutput, Way, WayId, WayRegistry, clean, detect_junctions,
    run_pipeline, segment, segment_way, split_refs,
};

#[cfg(feature = "data")]
pub use waysplit_data::{
    OsmDataset, OsmIngestError, OsmIngestSummary, PersistReport, PersistTopologyError,
    ingest_osm_pbf, persist_topology_to_sqlite,
};
