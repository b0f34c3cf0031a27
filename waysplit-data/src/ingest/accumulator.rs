//! Internal accumulator for OpenStreetMap (OSM) PBF ingestion.
//!
//! Collects node positions and highway ways per blob, then merges partial
//! results. Merging is order-insensitive apart from duplicate identifiers,
//! where the first value seen wins.
use geo::Coord;
use osmpbf::Element;
use waysplit_core::tags::has_classification;
use waysplit_core::{CoordinateRegistry, NodeId, Tags, Way, WayId, WayRegistry};

use super::{OsmDataset, OsmIngestSummary};

#[derive(Debug, Default)]
pub(super) struct HighwayAccumulator {
    summary: OsmIngestSummary,
    coords: CoordinateRegistry,
    ways: WayRegistry,
}

impl HighwayAccumulator {
    pub(super) fn process_element(&mut self, element: Element<'_>) {
        match element {
            Element::Node(node) => self.process_node(node.id(), node.lon(), node.lat()),
            Element::DenseNode(node) => self.process_node(node.id(), node.lon(), node.lat()),
            Element::Way(way) => self.process_way(way.id(), way.tags(), way.tags(), way.refs()),
            Element::Relation(_) => self.summary.record_relation(),
        }
    }

    fn process_node(&mut self, raw_id: i64, lon: f64, lat: f64) {
        let location = validated_coord(lon, lat);
        self.summary.record_node(location);
        if let Some(coordinate) = location {
            self.coords.insert(NodeId::new(raw_id), coordinate);
        }
    }

    fn process_way<'a, R, C, I>(&mut self, raw_id: i64, relevance_tags: R, tags: C, refs: I)
    where
        R: IntoIterator<Item = (&'a str, &'a str)>,
        C: IntoIterator<Item = (&'a str, &'a str)>,
        I: IntoIterator<Item = i64>,
    {
        let is_highway = has_classification(relevance_tags);
        self.summary.record_way(is_highway);
        if !is_highway {
            return;
        }
        let refs = refs.into_iter().map(NodeId::new).collect();
        self.ways
            .insert(WayId::new(raw_id), Way::new(Tags::from_pairs(tags), refs));
    }

    pub(super) fn combine(mut self, other: Self) -> Self {
        self.summary = self.summary.combine(other.summary);
        for (id, coord) in other.coords {
            if !self.coords.contains(id) {
                self.coords.insert(id, coord);
            }
        }
        for (id, way) in other.ways {
            if !self.ways.contains(id) {
                self.ways.insert(id, way);
            }
        }
        self
    }

    pub(super) fn into_dataset(self) -> OsmDataset {
        OsmDataset {
            summary: self.summary,
            coords: self.coords,
            ways: self.ways,
        }
    }
}

pub(super) fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Coord { x: lon, y: lat })
}
