//! Graph provider: reading and writing attributed graphs.
//!
//! Two input shapes are supported:
//!
//! - **Node-link JSON**, the layout networkx emits with `node_link_data`:
//!   `{"nodes": [{"id": "A", "main_genre": "rock"}], "links": [{"source": "A", "target": "B"}]}`.
//!   `edges` is accepted as an alias of `links`.
//! - **Collaboration records**, the flat album dump the scrapers produce:
//!   `{"data": [{"artist": "A", "feat": ["B"], "artist_genre": "rock"}]}`.
//!   [`build_from_records`] turns these into a graph, one node per artist and
//!   one edge per distinct (artist, featured artist) pair.

use crate::error::Result;
use crate::graph::AttributedGraph;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// A graph serialized in node-link form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeLinkDocument {
    /// Always false for collaboration graphs; kept for networkx compatibility.
    #[serde(default)]
    pub directed: bool,
    /// Nodes with their attributes.
    pub nodes: Vec<NodeEntry>,
    /// Undirected edges.
    #[serde(alias = "edges", default)]
    pub links: Vec<LinkEntry>,
}

/// One node of a [`NodeLinkDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Artist name. Integer ids are read as their decimal text.
    #[serde(deserialize_with = "node_id")]
    pub id: String,
    /// Remaining keys are node attributes.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

/// One edge of a [`NodeLinkDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    /// One endpoint.
    #[serde(deserialize_with = "node_id")]
    pub source: String,
    /// Other endpoint.
    #[serde(deserialize_with = "node_id")]
    pub target: String,
}

/// Accept a string or an integer where a node id is expected.
fn node_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "node id must be a string or an integer, found {other}"
        ))),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Build a graph from a node-link document.
///
/// Duplicate links and self-loops are dropped. A link naming an unknown node
/// is an error.
pub fn from_document(doc: &NodeLinkDocument) -> Result<AttributedGraph> {
    let mut graph = AttributedGraph::new();
    for entry in &doc.nodes {
        let idx = graph.add_node(&entry.id);
        for (key, value) in &entry.attributes {
            if let Some(v) = value_to_string(value) {
                graph.set_attribute(idx, key, v);
            }
        }
    }
    let mut dropped = 0usize;
    for link in &doc.links {
        if !graph.add_edge(&link.source, &link.target)? {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!(dropped, "dropped duplicate or self-loop links");
    }
    Ok(graph)
}

/// Serialize a graph into node-link form.
pub fn to_document(graph: &AttributedGraph) -> NodeLinkDocument {
    let nodes = graph
        .node_indices()
        .filter_map(|n| graph.artist(n))
        .map(|artist| NodeEntry {
            id: artist.name.clone(),
            attributes: artist
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        })
        .collect();
    let links = graph
        .edges()
        .map(|(a, b)| LinkEntry {
            source: graph.name(a).to_string(),
            target: graph.name(b).to_string(),
        })
        .collect();
    NodeLinkDocument {
        directed: false,
        nodes,
        links,
    }
}

/// Read a node-link JSON graph from disk.
pub fn read_graph(path: impl AsRef<Path>) -> Result<AttributedGraph> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let doc: NodeLinkDocument = serde_json::from_str(&text)?;
    let graph = from_document(&doc)?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

/// Write a graph to disk as pretty node-link JSON.
pub fn write_graph(graph: &AttributedGraph, path: impl AsRef<Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(&to_document(graph))?;
    fs::write(path, text)?;
    Ok(())
}

/// Top-level collaboration dump.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSet {
    /// One record per album (or per artist entry).
    #[serde(default)]
    pub data: Vec<CollaborationRecord>,
}

/// One album-level record: a principal artist and the artists it featured.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaborationRecord {
    /// Principal artist.
    #[serde(default)]
    pub artist: Option<String>,
    /// Featured artists.
    #[serde(default)]
    pub feat: Vec<String>,
    /// Every other field, e.g. `artist_genre` or `major_labels`.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Where a node attribute comes from in a [`CollaborationRecord`].
#[derive(Debug, Clone)]
pub struct RecordSource {
    /// Attribute key written on graph nodes, e.g. `main_genre`.
    pub attribute: String,
    /// Record field read, e.g. `artist_genre` or `major_labels`.
    pub field: String,
    /// Value used when the field is absent or empty.
    pub default_value: String,
}

impl RecordSource {
    /// Genre graph: `artist_genre` stored as `main_genre`, default `Unknown`.
    pub fn genre() -> Self {
        Self {
            attribute: "main_genre".to_string(),
            field: "artist_genre".to_string(),
            default_value: "Unknown".to_string(),
        }
    }

    /// Label graph: single-element `major_labels` stored as `major_label`,
    /// default `Independent`.
    pub fn label() -> Self {
        Self {
            attribute: "major_label".to_string(),
            field: "major_labels".to_string(),
            default_value: "Independent".to_string(),
        }
    }
}

/// Outcome counters of [`build_from_records`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    /// Records skipped for lacking an artist name.
    pub skipped_records: usize,
    /// Artists dropped because their attribute field held several values.
    pub ambiguous_artists: Vec<String>,
    /// Nodes in the resulting graph.
    pub nodes: usize,
    /// Edges in the resulting graph.
    pub edges: usize,
}

enum Resolved {
    Value(String),
    Ambiguous,
}

fn resolve_field(record: &CollaborationRecord, source: &RecordSource) -> Resolved {
    let value = match record.fields.get(&source.field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => None,
            [single] => value_to_string(single),
            _ => return Resolved::Ambiguous,
        },
        Some(other) => Some(other.to_string()),
    };
    Resolved::Value(value.unwrap_or_else(|| source.default_value.clone()))
}

/// Build an attributed collaboration graph from album records.
///
/// Nodes are added in order of first appearance; when an artist appears in
/// several records the last resolved value wins. Artists whose field lists
/// more than one value are excluded entirely, edges included.
pub fn build_from_records(
    records: &[CollaborationRecord],
    source: &RecordSource,
) -> (AttributedGraph, BuildSummary) {
    let mut summary = BuildSummary::default();
    let mut order: Vec<&str> = Vec::new();
    let mut values: BTreeMap<&str, String> = BTreeMap::new();
    let mut ambiguous: HashSet<&str> = HashSet::new();

    for record in records {
        let Some(artist) = record.artist.as_deref().filter(|a| !a.is_empty()) else {
            summary.skipped_records += 1;
            continue;
        };
        match resolve_field(record, source) {
            Resolved::Ambiguous => {
                ambiguous.insert(artist);
            }
            Resolved::Value(v) => {
                if !values.contains_key(artist) {
                    order.push(artist);
                }
                values.insert(artist, v);
            }
        }
    }

    let mut graph = AttributedGraph::new();
    for artist in order.iter().filter(|a| !ambiguous.contains(*a)) {
        let idx = graph.add_node(artist);
        if let Some(v) = values.get(artist) {
            graph.set_attribute(idx, &source.attribute, v.clone());
        }
    }

    for record in records {
        let Some(artist) = record.artist.as_deref() else {
            continue;
        };
        let Some(principal) = graph.node(artist) else {
            continue;
        };
        for featured in &record.feat {
            if let Some(other) = graph.node(featured) {
                graph.add_edge_between(principal, other);
            }
        }
    }

    let mut ambiguous: Vec<String> = ambiguous.into_iter().map(str::to_string).collect();
    ambiguous.sort();
    summary.ambiguous_artists = ambiguous;
    summary.nodes = graph.node_count();
    summary.edges = graph.edge_count();
    info!(
        nodes = summary.nodes,
        edges = summary.edges,
        ambiguous = summary.ambiguous_artists.len(),
        "collaboration graph built"
    );
    (graph, summary)
}

/// Read a record dump from disk and build its graph.
pub fn read_records(
    path: impl AsRef<Path>,
    source: &RecordSource,
) -> Result<(AttributedGraph, BuildSummary)> {
    let text = fs::read_to_string(path)?;
    let set: RecordSet = serde_json::from_str(&text)?;
    Ok(build_from_records(&set.data, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    fn records(json: &str) -> Vec<CollaborationRecord> {
        let set: RecordSet = serde_json::from_str(json).unwrap();
        set.data
    }

    #[test]
    fn test_node_link_roundtrip_through_disk() -> Result<()> {
        let json = r#"{
            "nodes": [
                {"id": "A", "main_genre": "rock"},
                {"id": "B", "main_genre": "pop", "popularity": 7},
                {"id": "C"}
            ],
            "links": [
                {"source": "A", "target": "B"},
                {"source": "B", "target": "A"},
                {"source": "C", "target": "C"}
            ]
        }"#;
        let doc: NodeLinkDocument = serde_json::from_str(json)?;
        let graph = from_document(&doc)?;
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        let b = graph.node("B").unwrap();
        assert_eq!(graph.attribute(b, "popularity"), Some("7"));
        assert_eq!(graph.attribute(graph.node("C").unwrap(), "main_genre"), None);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("graph.json");
        write_graph(&graph, &path)?;
        let back = read_graph(&path)?;
        assert_eq!(back.node_count(), 3);
        assert_eq!(back.edge_count(), 1);
        assert_eq!(back.attribute(back.node("A").unwrap(), "main_genre"), Some("rock"));
        Ok(())
    }

    #[test]
    fn test_edges_alias_and_unknown_node() {
        let json = r#"{"nodes": [{"id": "A"}], "edges": [{"source": "A", "target": "Z"}]}"#;
        let doc: NodeLinkDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.links.len(), 1);
        assert!(from_document(&doc).is_err());
    }

    #[test]
    fn test_integer_node_ids() {
        let json = r#"{"directed": false, "nodes": [{"id": 0, "main_genre": "rock"}, {"id": "1"}, {"id": 2}],
                        "links": [{"source": 0, "target": 1}, {"source": "1", "target": 2}]}"#;
        let doc: NodeLinkDocument = serde_json::from_str(json).unwrap();
        let graph = from_document(&doc).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let zero = graph.node("0").unwrap();
        assert_eq!(graph.attribute(zero, "main_genre"), Some("rock"));
        assert!(graph.has_edge(zero, graph.node("1").unwrap()));

        let bad = r#"{"nodes": [{"id": 1.5}], "links": []}"#;
        assert!(serde_json::from_str::<NodeLinkDocument>(bad).is_err());
    }

    #[test]
    fn test_genre_records_build_graph() {
        let data = records(
            r#"{"data": [
                {"artist": "A", "artist_genre": "rock", "feat": ["B", "A", "Nobody"]},
                {"artist": "B", "artist_genre": "pop", "feat": ["A"]},
                {"artist": "C", "feat": ["B"]},
                {"feat": ["A"]}
            ]}"#,
        );
        let (graph, summary) = build_from_records(&data, &RecordSource::genre());
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.edges, 2);
        assert_eq!(summary.skipped_records, 1);
        let c = graph.node("C").unwrap();
        assert_eq!(graph.attribute(c, "main_genre"), Some("Unknown"));
        assert_eq!(graph.name(petgraph::graph::NodeIndex::new(0)), "A");
    }

    #[test]
    fn test_label_records_drop_ambiguous_artists() {
        let data = records(
            r#"{"data": [
                {"artist": "A", "major_labels": ["Sony"], "feat": ["B", "C"]},
                {"artist": "B", "major_labels": ["Sony", "Universal"], "feat": ["A"]},
                {"artist": "C", "major_labels": [], "feat": []}
            ]}"#,
        );
        let (graph, summary) = build_from_records(&data, &RecordSource::label());
        assert_eq!(summary.ambiguous_artists, vec!["B".to_string()]);
        assert!(graph.node("B").is_none());
        assert_eq!(graph.edge_count(), 1);
        let c = graph.node("C").unwrap();
        assert_eq!(graph.attribute(c, "major_label"), Some("Independent"));
    }
}
