//! Builders for small OSM PBF extracts used by tests.
//!
//! Blobs are written uncompressed (`raw`), one `OSMHeader` followed by a
//! single `OSMData` block holding plain nodes, ways and relations. Positions
//! use the default granularity of 100 nanodegrees.

use std::{fs, io, path::Path};

use prost::Message;

const GRANULARITY: f64 = 1.0e7;
const REQUIRED_FEATURE: &str = "OsmSchema-V0.6";

#[derive(Clone, PartialEq, Message)]
struct BlobHeader {
    #[prost(string, required, tag = "1")]
    kind: String,
    #[prost(int32, required, tag = "3")]
    datasize: i32,
}

#[derive(Clone, PartialEq, Message)]
struct Blob {
    #[prost(bytes = "vec", optional, tag = "1")]
    raw: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "2")]
    raw_size: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
struct HeaderBlock {
    #[prost(string, repeated, tag = "4")]
    required_features: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
struct StringTable {
    #[prost(bytes = "vec", repeated, tag = "1")]
    s: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
struct PrimitiveBlock {
    #[prost(message, optional, tag = "1")]
    stringtable: Option<StringTable>,
    #[prost(message, repeated, tag = "2")]
    primitivegroup: Vec<PrimitiveGroup>,
}

#[derive(Clone, PartialEq, Message)]
struct PrimitiveGroup {
    #[prost(message, repeated, tag = "1")]
    nodes: Vec<Node>,
    #[prost(message, repeated, tag = "3")]
    ways: Vec<Way>,
    #[prost(message, repeated, tag = "4")]
    relations: Vec<Relation>,
}

#[derive(Clone, PartialEq, Message)]
struct Node {
    #[prost(sint64, required, tag = "1")]
    id: i64,
    #[prost(sint64, required, tag = "8")]
    lat: i64,
    #[prost(sint64, required, tag = "9")]
    lon: i64,
}

#[derive(Clone, PartialEq, Message)]
struct Way {
    #[prost(int64, required, tag = "1")]
    id: i64,
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    keys: Vec<u32>,
    #[prost(uint32, repeated, packed = "true", tag = "3")]
    vals: Vec<u32>,
    /// Delta-encoded node references.
    #[prost(sint64, repeated, packed = "true", tag = "8")]
    refs: Vec<i64>,
}

#[derive(Clone, PartialEq, Message)]
struct Relation {
    #[prost(int64, required, tag = "1")]
    id: i64,
}

#[derive(Debug, Clone)]
struct FixtureWay {
    id: i64,
    tags: Vec<(String, String)>,
    refs: Vec<i64>,
}

/// In-memory description of a PBF extract.
#[derive(Debug, Clone, Default)]
pub struct PbfFixture {
    nodes: Vec<(i64, f64, f64)>,
    ways: Vec<FixtureWay>,
    relations: Vec<i64>,
}

impl PbfFixture {
    /// Start an empty extract.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at `lon`/`lat` degrees.
    #[must_use]
    pub fn node(mut self, id: i64, lon: f64, lat: f64) -> Self {
        self.nodes.push((id, lon, lat));
        self
    }

    /// Add a way with tags and ordered node references.
    #[must_use]
    pub fn way(mut self, id: i64, tags: &[(&str, &str)], refs: &[i64]) -> Self {
        self.ways.push(FixtureWay {
            id,
            tags: tags
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
            refs: refs.to_vec(),
        });
        self
    }

    /// Add an empty relation.
    #[must_use]
    pub fn relation(mut self, id: i64) -> Self {
        self.relations.push(id);
        self
    }

    /// Encode the extract as PBF bytes.
    ///
    /// # Panics
    /// Panics if a block exceeds the 2 GiB protobuf size limit.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let header = HeaderBlock {
            required_features: vec![REQUIRED_FEATURE.to_owned()],
        };

        let mut out = Vec::new();
        write_blob(&mut out, "OSMHeader", header.encode_to_vec());
        write_blob(&mut out, "OSMData", self.primitive_block().encode_to_vec());
        out
    }

    /// Encode the extract and write it to `path`.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the file cannot be written.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.encode())
    }

    fn primitive_block(&self) -> PrimitiveBlock {
        let mut strings = Strings::default();
        let mut groups = Vec::new();

        if !self.nodes.is_empty() {
            let nodes = self
                .nodes
                .iter()
                .map(|(id, lon, lat)| Node {
                    id: *id,
                    lat: to_nano(*lat),
                    lon: to_nano(*lon),
                })
                .collect();
            groups.push(PrimitiveGroup {
                nodes,
                ..PrimitiveGroup::default()
            });
        }

        if !self.ways.is_empty() {
            let ways = self
                .ways
                .iter()
                .map(|way| {
                    let (keys, vals) = way
                        .tags
                        .iter()
                        .map(|(key, value)| (strings.index(key), strings.index(value)))
                        .unzip();
                    Way {
                        id: way.id,
                        keys,
                        vals,
                        refs: delta_encode(&way.refs),
                    }
                })
                .collect();
            groups.push(PrimitiveGroup {
                ways,
                ..PrimitiveGroup::default()
            });
        }

        if !self.relations.is_empty() {
            let relations = self.relations.iter().map(|id| Relation { id: *id }).collect();
            groups.push(PrimitiveGroup {
                relations,
                ..PrimitiveGroup::default()
            });
        }

        PrimitiveBlock {
            stringtable: Some(strings.into_table()),
            primitivegroup: groups,
        }
    }
}

#[derive(Debug)]
struct Strings {
    entries: Vec<String>,
}

impl Default for Strings {
    fn default() -> Self {
        // Index zero is reserved as a delimiter.
        Self {
            entries: vec![String::new()],
        }
    }
}

impl Strings {
    fn index(&mut self, value: &str) -> u32 {
        let position = match self.entries.iter().position(|entry| entry == value) {
            Some(position) => position,
            None => {
                self.entries.push(value.to_owned());
                self.entries.len() - 1
            }
        };
        u32::try_from(position).unwrap_or_else(|_| panic!("string table overflow"))
    }

    fn into_table(self) -> StringTable {
        StringTable {
            s: self.entries.into_iter().map(String::into_bytes).collect(),
        }
    }
}

fn write_blob(out: &mut Vec<u8>, kind: &str, payload: Vec<u8>) {
    let blob = Blob {
        raw_size: Some(len_i32(payload.len())),
        raw: Some(payload),
    }
    .encode_to_vec();
    let header = BlobHeader {
        kind: kind.to_owned(),
        datasize: len_i32(blob.len()),
    }
    .encode_to_vec();

    let header_len =
        u32::try_from(header.len()).unwrap_or_else(|_| panic!("blob header too large"));
    out.extend_from_slice(&header_len.to_be_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&blob);
}

fn len_i32(len: usize) -> i32 {
    i32::try_from(len).unwrap_or_else(|_| panic!("payload too large"))
}

fn to_nano(degrees: f64) -> i64 {
    (degrees * GRANULARITY).round() as i64
}

fn delta_encode(refs: &[i64]) -> Vec<i64> {
    let mut previous = 0_i64;
    refs.iter()
        .map(|id| {
            let delta = id - previous;
            previous = *id;
            delta
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn refs_are_delta_encoded() {
        assert_eq!(delta_encode(&[5, 7, 6, 10]), vec![5, 2, -1, 4]);
    }

    #[rstest]
    fn string_table_reuses_entries() {
        let mut strings = Strings::default();
        let first = strings.index("highway");
        let second = strings.index("highway");
        assert_eq!(first, 1);
        assert_eq!(first, second);
    }

    #[rstest]
    fn encoded_block_decodes_back() {
        let fixture = PbfFixture::new()
            .node(1, 107.6, -6.9)
            .way(10, &[("highway", "residential")], &[1, 2])
            .relation(99);

        let block = PrimitiveBlock::decode(fixture.primitive_block().encode_to_vec().as_slice())
            .expect("decode primitive block");

        assert_eq!(block.primitivegroup.len(), 3);
        let way = block
            .primitivegroup
            .iter()
            .flat_map(|group| &group.ways)
            .next()
            .expect("way group");
        assert_eq!(way.refs, vec![1, 1]);
        assert_eq!(way.keys.len(), way.vals.len());
    }
}
