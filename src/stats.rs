//! Basic structural statistics of a collaboration graph.
//!
//! Size, density, clustering, degree distribution, component census and
//! path metrics. Path metrics need a connected graph: when the input is
//! disconnected they are computed on the largest component instead, and the
//! report says so through [`PathScope`].

use crate::error::{Error, Result};
use crate::graph::AttributedGraph;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Summary of the degree sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeStats {
    /// Mean degree.
    pub mean: f64,
    /// Median degree.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Smallest degree.
    pub min: usize,
    /// Largest degree.
    pub max: usize,
}

/// Connected-component census.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentCensus {
    /// Number of connected components.
    pub count: usize,
    /// Nodes in the largest component.
    pub largest_size: usize,
    /// `largest_size / nodes`.
    pub largest_fraction: f64,
}

/// Which graph the path metrics were measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathScope {
    /// The input graph is connected.
    WholeGraph,
    /// The input graph is disconnected; only its largest component was used.
    LargestComponent,
}

impl PathScope {
    /// Heading used in text reports.
    pub fn label(self) -> &'static str {
        match self {
            PathScope::WholeGraph => "Whole Graph",
            PathScope::LargestComponent => "Largest Component",
        }
    }
}

/// Shortest-path metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathMetrics {
    /// Graph the metrics were computed on.
    pub scope: PathScope,
    /// Mean shortest-path length over ordered pairs of distinct nodes.
    pub average_path_length: f64,
    /// Longest shortest path.
    pub diameter: usize,
}

/// Frequency of one attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    /// Attribute value.
    pub value: String,
    /// Nodes holding it.
    pub count: usize,
    /// Share of all nodes, in percent.
    pub percentage: f64,
}

/// Basic statistics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicReport {
    /// Node count.
    pub nodes: usize,
    /// Edge count.
    pub edges: usize,
    /// `|E| / (|V| (|V| - 1) / 2)`, 0 with fewer than two nodes.
    pub density: f64,
    /// Mean local clustering coefficient over all nodes.
    pub average_clustering: f64,
    /// Degree summary.
    pub degree: DegreeStats,
    /// Component census.
    pub components: ComponentCensus,
    /// Shortest-path metrics.
    pub paths: PathMetrics,
    /// Attribute frequency table, present only when every node carries the attribute.
    pub attribute_counts: Option<Vec<ValueCount>>,
}

/// Edge density of an undirected simple graph.
pub fn density(graph: &AttributedGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    let possible = (n * (n - 1)) as f64 / 2.0;
    graph.edge_count() as f64 / possible
}

/// Local clustering coefficient of one node (0 for degree < 2).
pub fn local_clustering(graph: &AttributedGraph, node: NodeIndex) -> f64 {
    let neighbors: Vec<NodeIndex> = graph.neighbors(node).collect();
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }
    let set: HashSet<NodeIndex> = neighbors.iter().copied().collect();
    let mut links = 0usize;
    for &u in &neighbors {
        links += graph.neighbors(u).filter(|w| set.contains(w)).count();
    }
    // Each triangle edge was seen from both ends.
    let triangles = links / 2;
    2.0 * triangles as f64 / (k * (k - 1)) as f64
}

/// Mean local clustering coefficient over all nodes.
pub fn average_clustering(graph: &AttributedGraph) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = graph.node_indices().map(|v| local_clustering(graph, v)).sum();
    total / n as f64
}

/// Degree summary. `None` for an empty graph.
pub fn degree_stats(graph: &AttributedGraph) -> Option<DegreeStats> {
    let mut degrees = graph.degrees();
    if degrees.is_empty() {
        return None;
    }
    degrees.sort_unstable();
    let n = degrees.len();
    let mean = degrees.iter().sum::<usize>() as f64 / n as f64;
    let median = if n % 2 == 1 {
        degrees[n / 2] as f64
    } else {
        (degrees[n / 2 - 1] + degrees[n / 2]) as f64 / 2.0
    };
    let variance = degrees
        .iter()
        .map(|&d| (d as f64 - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    Some(DegreeStats {
        mean,
        median,
        std_dev: variance.sqrt(),
        min: degrees[0],
        max: degrees[n - 1],
    })
}

fn bfs_distances(graph: &AttributedGraph, source: NodeIndex) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.node_count()];
    dist[source.index()] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(node) = queue.pop_front() {
        let d = dist[node.index()].unwrap_or(0);
        for next in graph.neighbors(node) {
            if dist[next.index()].is_none() {
                dist[next.index()] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Average shortest-path length and diameter of a connected graph.
///
/// Returns `None` when the graph is empty or disconnected. A single node has
/// average path length 0 and diameter 0.
pub fn path_lengths(graph: &AttributedGraph) -> Option<(f64, usize)> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some((0.0, 0));
    }
    let mut total = 0usize;
    let mut diameter = 0usize;
    for source in graph.node_indices() {
        for d in bfs_distances(graph, source) {
            let d = d?;
            total += d;
            diameter = diameter.max(d);
        }
    }
    Some((total as f64 / (n * (n - 1)) as f64, diameter))
}

/// Path metrics on the whole graph if connected, else on its largest component.
pub fn path_metrics(graph: &AttributedGraph) -> Option<PathMetrics> {
    if graph.is_connected() {
        let (average_path_length, diameter) = path_lengths(graph)?;
        return Some(PathMetrics {
            scope: PathScope::WholeGraph,
            average_path_length,
            diameter,
        });
    }
    let lcc = graph.largest_component();
    let (average_path_length, diameter) = path_lengths(&lcc)?;
    Some(PathMetrics {
        scope: PathScope::LargestComponent,
        average_path_length,
        diameter,
    })
}

/// Attribute frequency table, most frequent first.
///
/// `None` unless every node carries `attribute`.
pub fn attribute_counts(graph: &AttributedGraph, attribute: &str) -> Option<Vec<ValueCount>> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.node_indices() {
        *counts.entry(graph.attribute(node, attribute)?).or_insert(0) += 1;
    }
    let mut table: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
            percentage: count as f64 / n as f64 * 100.0,
        })
        .collect();
    // Stable: ties stay in value order.
    table.sort_by(|a, b| b.count.cmp(&a.count));
    Some(table)
}

/// Compute the full basic statistics report.
///
/// Fails only on an empty graph; every other degenerate case (no edges,
/// a single node) yields defined zero values.
pub fn analyze(graph: &AttributedGraph, attribute: Option<&str>) -> Result<BasicReport> {
    let degree = degree_stats(graph).ok_or(Error::EmptyInput)?;
    let paths = path_metrics(graph).ok_or(Error::EmptyInput)?;

    let components = graph.connected_components();
    let largest_size = components.first().map_or(0, Vec::len);
    let nodes = graph.node_count();

    Ok(BasicReport {
        nodes,
        edges: graph.edge_count(),
        density: density(graph),
        average_clustering: average_clustering(graph),
        degree,
        components: ComponentCensus {
            count: components.len(),
            largest_size,
            largest_fraction: largest_size as f64 / nodes as f64,
        },
        paths,
        attribute_counts: attribute.and_then(|a| attribute_counts(graph, a)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> AttributedGraph {
        let mut g = AttributedGraph::new();
        for n in nodes {
            g.add_node(n);
        }
        for (a, b) in edges {
            g.add_edge(a, b).unwrap();
        }
        g
    }

    #[test]
    fn test_single_isolated_node() {
        let g = graph(&["solo"], &[]);
        let report = analyze(&g, None).unwrap();
        assert_eq!(report.nodes, 1);
        assert_eq!(report.edges, 0);
        assert_eq!(report.density, 0.0);
        assert_eq!(report.average_clustering, 0.0);
        assert_eq!(report.components.count, 1);
        assert_eq!(report.paths.scope, PathScope::WholeGraph);
        assert_eq!(report.paths.diameter, 0);
    }

    #[test]
    fn test_empty_graph_is_error() {
        assert!(matches!(
            analyze(&AttributedGraph::new(), None),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_triangle_with_tail() {
        // a-b-c triangle, c-d tail
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d")],
        );
        assert!((density(&g) - 4.0 / 6.0).abs() < 1e-10);

        let c = g.node("c").unwrap();
        assert!((local_clustering(&g, c) - 1.0 / 3.0).abs() < 1e-10);
        // (1 + 1 + 1/3 + 0) / 4
        assert!((average_clustering(&g) - (7.0 / 3.0) / 4.0).abs() < 1e-10);

        let deg = degree_stats(&g).unwrap();
        assert!((deg.mean - 2.0).abs() < 1e-10);
        assert!((deg.median - 2.0).abs() < 1e-10);
        assert_eq!(deg.min, 1);
        assert_eq!(deg.max, 3);
        assert!((deg.std_dev - 0.5f64.sqrt()).abs() < 1e-10);

        let (avg, diameter) = path_lengths(&g).unwrap();
        // pair distances: ab1 ac1 ad2 bc1 bd2 cd1 -> 8 / 6
        assert!((avg - 8.0 / 6.0).abs() < 1e-10);
        assert_eq!(diameter, 2);
    }

    #[test]
    fn test_disconnected_uses_largest_component() {
        let g = graph(&["a", "b", "c", "x", "y"], &[("a", "b"), ("b", "c"), ("x", "y")]);
        let report = analyze(&g, None).unwrap();
        assert_eq!(report.components.count, 2);
        assert_eq!(report.components.largest_size, 3);
        assert!((report.components.largest_fraction - 0.6).abs() < 1e-10);
        assert_eq!(report.paths.scope, PathScope::LargestComponent);
        assert_eq!(report.paths.diameter, 2);
        assert!(path_lengths(&g).is_none());
    }

    #[test]
    fn test_attribute_counts_require_full_coverage() {
        let mut g = graph(&["a", "b", "c"], &[("a", "b")]);
        for (name, v) in [("a", "rock"), ("b", "pop"), ("c", "rock")] {
            let idx = g.node(name).unwrap();
            g.set_attribute(idx, "main_genre", v);
        }
        let table = attribute_counts(&g, "main_genre").unwrap();
        assert_eq!(table[0].value, "rock");
        assert_eq!(table[0].count, 2);
        assert!((table[1].percentage - 100.0 / 3.0).abs() < 1e-10);

        let c = g.node("c").unwrap();
        g.remove_attribute(c, "main_genre");
        assert!(attribute_counts(&g, "main_genre").is_none());
    }
}
