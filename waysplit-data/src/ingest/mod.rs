//! OSM PBF ingestion into coordinate and way registries.
//!
//! Every node with a usable WGS84 position becomes a point; every way with a
//! `highway` tag becomes a way record. No referential checks happen here:
//! dangling references and unused points are left for the cleaner.

use std::path::{Path, PathBuf};

use geo::{Coord, Rect};
use log::debug;
use osmpbf::ElementReader;
use thiserror::Error;
use waysplit_core::{CoordinateRegistry, WayRegistry};

mod accumulator;

use accumulator::HighwayAccumulator;

/// Summary of raw OSM elements discovered during ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestSummary {
    /// Number of nodes discovered, including dense-node entries.
    pub nodes: u64,
    /// Nodes dropped because their coordinates were unusable.
    pub skipped_nodes: u64,
    /// Number of ways discovered.
    pub ways: u64,
    /// Ways carrying the classification tag.
    pub highways: u64,
    /// Number of relations discovered.
    pub relations: u64,
    /// Bounding box covering all node coordinates, if any nodes were present.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl OsmIngestSummary {
    fn combine(mut self, other: Self) -> Self {
        self.nodes += other.nodes;
        self.skipped_nodes += other.skipped_nodes;
        self.ways += other.ways;
        self.highways += other.highways;
        self.relations += other.relations;
        if let Some(bounds) = other.bounds {
            self.include_bounds(bounds);
        }
        self
    }

    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }

    fn record_node(&mut self, location: Option<Coord<f64>>) {
        self.nodes += 1;
        match location {
            Some(coordinate) => self.include_bounds(Rect::new(coordinate, coordinate)),
            None => self.skipped_nodes += 1,
        }
    }

    fn record_way(&mut self, is_highway: bool) {
        self.ways += 1;
        if is_highway {
            self.highways += 1;
        }
    }

    fn record_relation(&mut self) {
        self.relations += 1;
    }
}

/// Registries decoded from an OSM extract, ready for cleaning.
#[derive(Debug, Clone, Default)]
pub struct OsmDataset {
    /// Element counts and bounding box information.
    pub summary: OsmIngestSummary,
    /// Every node with a valid position.
    pub coords: CoordinateRegistry,
    /// Every way tagged as a highway, with its references in order.
    pub ways: WayRegistry,
}

/// Errors returned when ingesting an OSM PBF file.
#[derive(Debug, Error)]
pub enum OsmIngestError {
    /// The file could not be opened.
    #[error("failed to open OSM PBF file at {path:?}")]
    Open {
        /// Underlying reader error.
        #[source]
        source: osmpbf::Error,
        /// Requested path.
        path: PathBuf,
    },
    /// The file was opened but its contents could not be decoded.
    #[error("failed to decode OSM PBF data at {path:?}")]
    Decode {
        /// Underlying reader error.
        #[source]
        source: osmpbf::Error,
        /// Requested path.
        path: PathBuf,
    },
}

/// Decode an OSM PBF file into coordinate and way registries.
///
/// Blobs are decoded in parallel and the partial registries merged.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use waysplit_data::ingest_osm_pbf;
///
/// # fn main() -> Result<(), waysplit_data::OsmIngestError> {
/// let dataset = ingest_osm_pbf(Path::new("bandung.osm.pbf"))?;
/// println!("Loaded {} highways", dataset.ways.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_osm_pbf(path: &Path) -> Result<OsmDataset, OsmIngestError> {
    let reader = ElementReader::from_path(path).map_err(|source| OsmIngestError::Open {
        source,
        path: path.to_path_buf(),
    })?;

    let accumulator = reader
        .par_map_reduce(
            |element| {
                let mut accumulator = HighwayAccumulator::default();
                accumulator.process_element(element);
                accumulator
            },
            HighwayAccumulator::default,
            HighwayAccumulator::combine,
        )
        .map_err(|source| OsmIngestError::Decode {
            source,
            path: path.to_path_buf(),
        })?;

    let dataset = accumulator.into_dataset();
    debug!(
        "decoded {} nodes ({} skipped), {} ways ({} highways), {} relations from {}",
        dataset.summary.nodes,
        dataset.summary.skipped_nodes,
        dataset.summary.ways,
        dataset.summary.highways,
        dataset.summary.relations,
        path.display()
    );
    Ok(dataset)
}
