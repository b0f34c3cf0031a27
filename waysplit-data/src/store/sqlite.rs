//! SQLite persistence for cleaned topology.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, Transaction};
use thiserror::Error;
use waysplit_core::{CoordinateRegistry, NodeId, TopologyOutput, WayId};

use super::geometry::{line_json, point_json, resolve_line};

/// Errors raised when persisting topology to SQLite.
#[derive(Debug, Error)]
pub enum PersistTopologyError {
    /// Failed to create the parent directory for the SQLite artefact.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Path of the directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin topology persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A schema statement failed.
    #[error("failed to {step}")]
    CreateSchema {
        /// Schema step being executed.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing an insert statement failed.
    #[error("failed to prepare {table} insert statement")]
    PrepareInsert {
        /// Target table.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a row failed.
    #[error("failed to persist {table} row for OSM id {osm_id}")]
    PersistRow {
        /// Target table.
        table: &'static str,
        /// OSM identifier of the node or way being written.
        osm_id: i64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A way references a point absent from the cleaned registry.
    #[error("way {way_id} references point {node_id} with no position")]
    MissingCoordinate {
        /// Way being written.
        way_id: WayId,
        /// Unresolved reference.
        node_id: NodeId,
    },
    /// Encoding a geometry as GeoJSON failed.
    #[error("failed to encode geometry for OSM id {osm_id}")]
    SerializeGeometry {
        /// OSM identifier of the node or way being written.
        osm_id: i64,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Committing the transaction failed.
    #[error("failed to commit topology persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Row counts written by [`persist_topology_to_sqlite`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Rows written to `coords`.
    pub coords: usize,
    /// Rows written to `highways`.
    pub highways: usize,
    /// Rows written to `segments`.
    pub segments: usize,
}

/// Persist cleaned points, highways and segments to a SQLite database.
///
/// The `coords`, `highways` and `segments` tables are dropped and recreated
/// on every call, so the database always reflects exactly one run. Parent
/// directories are created automatically. All rows are written inside a
/// single transaction; on error nothing is committed.
///
/// Geometry columns hold GeoJSON geometry objects with WGS84
/// `[longitude, latitude]` positions.
///
/// # Errors
/// Returns [`PersistTopologyError`] describing the failing step.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use waysplit_core::{CoordinateRegistry, WayRegistry, run_pipeline};
/// use waysplit_data::persist_topology_to_sqlite;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = run_pipeline(CoordinateRegistry::new(), WayRegistry::new())?;
/// let report = persist_topology_to_sqlite(Utf8Path::new("target/topology.db"), &output)?;
/// assert_eq!(report.segments, 0);
/// # Ok(())
/// # }
/// ```
pub fn persist_topology_to_sqlite(
    path: &Utf8Path,
    output: &TopologyOutput,
) -> Result<PersistReport, PersistTopologyError> {
    ensure_parent_dir(path)?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| PersistTopologyError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| PersistTopologyError::BeginTransaction { source })?;

    create_schema(&transaction)?;
    let report = PersistReport {
        coords: persist_coords(&transaction, output.coords())?,
        highways: persist_highways(&transaction, output)?,
        segments: persist_segments(&transaction, output)?,
    };

    transaction
        .commit()
        .map_err(|source| PersistTopologyError::Commit { source })?;
    debug!(
        "persisted {} coords, {} highways, {} segments to {path}",
        report.coords, report.highways, report.segments
    );
    Ok(report)
}

/// Create the database's parent directory, relative to the filesystem root
/// for absolute paths and to the working directory otherwise.
fn ensure_parent_dir(path: &Utf8Path) -> Result<(), PersistTopologyError> {
    let Some(parent) = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty() && parent.parent().is_some())
    else {
        return Ok(());
    };

    let (base, relative) = parent
        .strip_prefix("/")
        .map_or((".", parent), |relative| ("/", relative));
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())
        .and_then(|dir| dir.create_dir_all(relative))
        .map_err(|source| PersistTopologyError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })
}

const SCHEMA_STEPS: [(&str, &str); 7] = [
    ("drop segments table", "DROP TABLE IF EXISTS segments"),
    ("drop highways table", "DROP TABLE IF EXISTS highways"),
    ("drop coords table", "DROP TABLE IF EXISTS coords"),
    (
        "create coords table",
        "CREATE TABLE coords (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            osm_id INTEGER NOT NULL UNIQUE,
            lon REAL NOT NULL,
            lat REAL NOT NULL,
            geometry TEXT NOT NULL
        )",
    ),
    (
        "create highways table",
        "CREATE TABLE highways (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            osm_id INTEGER NOT NULL UNIQUE,
            highway TEXT NOT NULL,
            name TEXT,
            oneway INTEGER NOT NULL,
            segments INTEGER NOT NULL,
            geometry TEXT NOT NULL
        )",
    ),
    (
        "create segments table",
        "CREATE TABLE segments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            osm_id INTEGER NOT NULL,
            highway TEXT NOT NULL,
            name TEXT,
            oneway INTEGER NOT NULL,
            segment_index INTEGER NOT NULL,
            segment_count INTEGER NOT NULL,
            geometry TEXT NOT NULL
        )",
    ),
    (
        "create segments osm_id index",
        "CREATE INDEX segments_osm_id_idx ON segments (osm_id)",
    ),
];

fn create_schema(transaction: &Transaction<'_>) -> Result<(), PersistTopologyError> {
    for (step, sql) in SCHEMA_STEPS {
        transaction
            .execute(sql, [])
            .map_err(|source| PersistTopologyError::CreateSchema { step, source })?;
    }
    Ok(())
}

fn persist_coords(
    transaction: &Transaction<'_>,
    coords: &CoordinateRegistry,
) -> Result<usize, PersistTopologyError> {
    const TABLE: &str = "coords";
    let mut statement = transaction
        .prepare("INSERT INTO coords (osm_id, lon, lat, geometry) VALUES (?1, ?2, ?3, ?4)")
        .map_err(|source| PersistTopologyError::PrepareInsert { table: TABLE, source })?;

    let mut rows: Vec<_> = coords.iter().collect();
    rows.sort_unstable_by_key(|(id, _)| *id);

    for (id, location) in &rows {
        let osm_id = id.get();
        let geometry = point_json(*location)
            .map_err(|source| PersistTopologyError::SerializeGeometry { osm_id, source })?;
        statement
            .execute((osm_id, location.x, location.y, geometry))
            .map_err(|source| PersistTopologyError::PersistRow {
                table: TABLE,
                osm_id,
                source,
            })?;
    }

    Ok(rows.len())
}

fn persist_highways(
    transaction: &Transaction<'_>,
    output: &TopologyOutput,
) -> Result<usize, PersistTopologyError> {
    const TABLE: &str = "highways";
    let mut statement = transaction
        .prepare(
            "INSERT INTO highways (osm_id, highway, name, oneway, segments, geometry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(|source| PersistTopologyError::PrepareInsert { table: TABLE, source })?;

    let mut written = 0;
    for record in output.highways() {
        let osm_id = record.way_id.get();
        let geometry = encode_line(output.coords(), record.way_id, record.refs)?;
        statement
            .execute((
                osm_id,
                record.tags.classification().unwrap_or_default(),
                record.tags.name(),
                record.tags.is_oneway(),
                record.segment_count,
                geometry,
            ))
            .map_err(|source| PersistTopologyError::PersistRow {
                table: TABLE,
                osm_id,
                source,
            })?;
        written += 1;
    }

    Ok(written)
}

fn persist_segments(
    transaction: &Transaction<'_>,
    output: &TopologyOutput,
) -> Result<usize, PersistTopologyError> {
    const TABLE: &str = "segments";
    let mut statement = transaction
        .prepare(
            "INSERT INTO segments
                (osm_id, highway, name, oneway, segment_index, segment_count, geometry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|source| PersistTopologyError::PrepareInsert { table: TABLE, source })?;

    let mut written = 0;
    for segment in output.segments() {
        let osm_id = segment.way_id.get();
        let geometry = encode_line(output.coords(), segment.way_id, &segment.refs)?;
        statement
            .execute((
                osm_id,
                segment.tags.classification().unwrap_or_default(),
                segment.tags.name(),
                segment.tags.is_oneway(),
                segment.index,
                segment.count,
                geometry,
            ))
            .map_err(|source| PersistTopologyError::PersistRow {
                table: TABLE,
                osm_id,
                source,
            })?;
        written += 1;
    }

    Ok(written)
}

fn encode_line(
    coords: &CoordinateRegistry,
    way_id: WayId,
    refs: &[NodeId],
) -> Result<String, PersistTopologyError> {
    let line = resolve_line(coords, refs)
        .map_err(|node_id| PersistTopologyError::MissingCoordinate { way_id, node_id })?;
    line_json(&line).map_err(|source| PersistTopologyError::SerializeGeometry {
        osm_id: way_id.get(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use rusqlite::Connection;
    use tempfile::TempDir;
    use waysplit_core::test_support::{coords_from, way};
    use waysplit_core::{Tags, WayRegistry, run_pipeline};

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    #[fixture]
    fn crossing() -> TopologyOutput {
        let coords = coords_from(&[1, 2, 3, 4, 5, 6, 7]);
        let mut ways = WayRegistry::from_iter([way(1, &[1, 2, 3, 4, 5])]);
        let tags = Tags::from_pairs([
            ("highway", "primary"),
            ("name", "Jalan Asia Afrika"),
            ("oneway", "yes"),
        ]);
        let refs = [6, 3, 7].into_iter().map(NodeId::new).collect();
        ways.insert_tagged(WayId::new(2), tags, refs);
        run_pipeline(coords, ways).expect("pipeline succeeds")
    }

    fn db_path(temp_dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp_dir.path().join(name)).expect("utf-8 path")
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }

    #[rstest]
    fn persists_all_tables(temp_dir: TempDir, crossing: TopologyOutput) {
        let path = db_path(&temp_dir, "topology.db");

        let report = persist_topology_to_sqlite(&path, &crossing).expect("persist topology");

        assert_eq!(
            report,
            PersistReport {
                coords: 7,
                highways: 2,
                segments: 4
            }
        );
        let conn = Connection::open(path.as_std_path()).expect("open database");
        assert_eq!(count(&conn, "coords"), 7);
        assert_eq!(count(&conn, "highways"), 2);
        assert_eq!(count(&conn, "segments"), 4);
    }

    #[rstest]
    fn writes_highway_attributes(temp_dir: TempDir, crossing: TopologyOutput) {
        let path = db_path(&temp_dir, "topology.db");
        persist_topology_to_sqlite(&path, &crossing).expect("persist topology");

        let conn = Connection::open(path.as_std_path()).expect("open database");
        let row: (String, Option<String>, bool, i64, String) = conn
            .query_row(
                "SELECT highway, name, oneway, segments, geometry FROM highways WHERE osm_id = 2",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .expect("read highway row");

        assert_eq!(row.0, "primary");
        assert_eq!(row.1.as_deref(), Some("Jalan Asia Afrika"));
        assert!(row.2);
        assert_eq!(row.3, 2);
        assert!(row.4.starts_with(r#"{"type":"LineString""#));
    }

    #[rstest]
    fn segments_keep_order_and_count(temp_dir: TempDir, crossing: TopologyOutput) {
        let path = db_path(&temp_dir, "topology.db");
        persist_topology_to_sqlite(&path, &crossing).expect("persist topology");

        let conn = Connection::open(path.as_std_path()).expect("open database");
        let mut statement = conn
            .prepare(
                "SELECT segment_index, segment_count, geometry, name IS NULL FROM segments
                 WHERE osm_id = 1 ORDER BY segment_index",
            )
            .expect("prepare query");
        let rows: Vec<(i64, i64, String, bool)> = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .expect("query segments")
            .collect::<Result<_, _>>()
            .expect("read segments");

        let indices: Vec<i64> = rows.iter().map(|row| row.0).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(rows.iter().all(|row| row.1 == 2 && row.3));
        let first = rows.first().map(|row| row.2.as_str());
        assert_eq!(
            first,
            Some(r#"{"type":"LineString","coordinates":[[0.0,0.0],[1.0,0.0],[2.0,0.0]]}"#)
        );
    }

    #[rstest]
    fn rerun_replaces_previous_contents(temp_dir: TempDir, crossing: TopologyOutput) {
        let path = db_path(&temp_dir, "topology.db");
        persist_topology_to_sqlite(&path, &crossing).expect("first run");
        let empty = run_pipeline(CoordinateRegistry::new(), WayRegistry::new())
            .expect("empty pipeline");

        let report = persist_topology_to_sqlite(&path, &empty).expect("second run");

        assert_eq!(report, PersistReport::default());
        let conn = Connection::open(path.as_std_path()).expect("open database");
        assert_eq!(count(&conn, "segments"), 0);
        assert_eq!(count(&conn, "coords"), 0);
    }

    #[rstest]
    fn creates_parent_directory(temp_dir: TempDir, crossing: TopologyOutput) {
        let nested = db_path(&temp_dir, "nested/deeper/topology.db");

        persist_topology_to_sqlite(&nested, &crossing).expect("persist into nested path");

        assert!(nested.exists(), "database should be created at nested path");
    }

    #[rstest]
    fn reports_parent_that_is_a_file(temp_dir: TempDir, crossing: TopologyOutput) {
        let blocker = db_path(&temp_dir, "occupied");
        std::fs::write(blocker.as_std_path(), b"not a directory").expect("write blocker");

        let err = persist_topology_to_sqlite(&blocker.join("topology.db"), &crossing)
            .expect_err("parent is a regular file");

        match err {
            PersistTopologyError::CreateDirectory { path, .. } => assert_eq!(path, blocker),
            other => panic!("expected directory error, got {other:?}"),
        }
    }
}
