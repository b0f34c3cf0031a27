//! Persistence gateway for cleaned topology.
//!
//! The engine hands over a [`waysplit_core::TopologyOutput`]; this module
//! turns node references into GeoJSON geometry and writes points, highways
//! and segments to SQLite.

mod geometry;
mod sqlite;

pub use sqlite::{PersistReport, PersistTopologyError, persist_topology_to_sqlite};
