//! GeoJSON encoding for persisted geometry columns.
//!
//! Points and line strings are built as `geo` values from the cleaned
//! registry and written as compact GeoJSON geometry objects in WGS84
//! (`[longitude, latitude]` ordering).

use geo::{Coord, LineString, Point};
use serde::Serialize;
use waysplit_core::{CoordinateRegistry, NodeId};

#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeoJsonGeometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
}

impl From<Point<f64>> for GeoJsonGeometry {
    fn from(point: Point<f64>) -> Self {
        Self::Point([point.x(), point.y()])
    }
}

impl From<&LineString<f64>> for GeoJsonGeometry {
    fn from(line: &LineString<f64>) -> Self {
        Self::LineString(line.coords().map(|coord| [coord.x, coord.y]).collect())
    }
}

/// Encode a single position as a GeoJSON `Point`.
pub(super) fn point_json(location: Coord<f64>) -> Result<String, serde_json::Error> {
    serde_json::to_string(&GeoJsonGeometry::from(Point::from(location)))
}

/// Encode a line string as a GeoJSON `LineString`.
pub(super) fn line_json(line: &LineString<f64>) -> Result<String, serde_json::Error> {
    serde_json::to_string(&GeoJsonGeometry::from(line))
}

/// Resolve references against the registry.
///
/// Returns the first identifier without a position on failure.
pub(super) fn resolve_line(
    coords: &CoordinateRegistry,
    refs: &[NodeId],
) -> Result<LineString<f64>, NodeId> {
    refs.iter()
        .map(|id| coords.get(*id).ok_or(*id))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}
