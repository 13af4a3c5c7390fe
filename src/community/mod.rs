//! Community detection against an attribute-defined ground truth.
//!
//! Do collaboration communities follow genre (or label) lines? The engine
//! builds two partitions of the same graph and compares them:
//!
//! - the **attribute partition**: one community per distinct attribute value,
//!   numbered densely in sorted value order;
//! - the **detected partition**: the output of [`Louvain`] modularity
//!   optimization, seeded for reproducibility.
//!
//! ## The Modularity Objective
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = number of edges
//! - A_ij = 1 if i and j collaborate
//! - k_i = degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! A good partition has Q > 0: more internal edges than a random graph with
//! the same degrees would have. The one-community partition scores exactly 0.
//!
//! ## Agreement
//!
//! [`nmi`](crate::metrics::nmi) and [`ari`](crate::metrics::ari) need both
//! partitions over the same node set. Nodes lacking the attribute have no
//! attribute community, so agreement is measured over attributed nodes only,
//! aligned by node name; the report records how many nodes were compared.
//!
//! ## Disconnected input
//!
//! Communities are detected on the largest connected component. The report
//! says whether that reduction happened.
//!
//! ## References
//!
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."

mod louvain;
mod traits;

pub use louvain::Louvain;
pub use traits::CommunityDetection;

use crate::config::CommunityConfig;
use crate::error::{Error, Result};
use crate::graph::AttributedGraph;
use crate::homophily::{attribute_values, check_input};
use crate::metrics::{ari, nmi};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// One community per attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributePartition {
    /// Attribute values, sorted; a value's position is its community id.
    pub values: Vec<String>,
    /// Community id per node index; `None` for nodes lacking the attribute.
    pub membership: Vec<Option<usize>>,
}

impl AttributePartition {
    /// Group the nodes of `graph` by their `attribute` value.
    pub fn build(graph: &AttributedGraph, attribute: &str) -> Self {
        let values = attribute_values(graph, attribute);
        let ids: HashMap<&str, usize> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let membership = graph
            .node_indices()
            .map(|n| graph.attribute(n, attribute).map(|v| ids[v]))
            .collect();
        Self { values, membership }
    }

    /// Total partition where every unattributed node is a singleton community.
    pub fn with_singletons(&self) -> Vec<usize> {
        let mut next = self.values.len();
        self.membership
            .iter()
            .map(|m| {
                m.unwrap_or_else(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect()
    }
}

/// Modularity of a total partition of `graph` (one entry per node index).
pub fn modularity(graph: &AttributedGraph, partition: &[usize]) -> Result<f64> {
    if partition.len() != graph.node_count() {
        return Err(Error::PartitionMismatch {
            expected: graph.node_count(),
            found: partition.len(),
        });
    }
    let edges = louvain::unit_edges(graph.inner());
    let self_loops = vec![0.0; graph.node_count()];
    Ok(louvain::modularity_weighted(
        graph.node_count(),
        &edges,
        &self_loops,
        partition,
        1.0,
    ))
}

/// Share of one attribute value inside a community.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueShare {
    /// Attribute value.
    pub value: String,
    /// Members holding it.
    pub count: usize,
    /// Share of the community's attributed members, in percent.
    pub percentage: f64,
}

/// Attribute make-up of one detected community.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityComposition {
    /// Detected community id.
    pub community: usize,
    /// All members.
    pub size: usize,
    /// Members lacking the attribute (not part of `values`).
    pub unattributed: usize,
    /// Value shares, largest first; percentages sum to 100.
    pub values: Vec<ValueShare>,
}

/// Attribute composition of every detected community, largest community first.
pub fn composition(
    graph: &AttributedGraph,
    detected: &[usize],
    attribute: &str,
) -> Vec<CommunityComposition> {
    let mut counts: BTreeMap<usize, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    let mut unattributed: BTreeMap<usize, usize> = BTreeMap::new();

    for (node, &comm) in graph.node_indices().zip(detected) {
        *sizes.entry(comm).or_insert(0) += 1;
        let row = counts.entry(comm).or_default();
        match graph.attribute(node, attribute) {
            Some(v) => *row.entry(v).or_insert(0) += 1,
            None => *unattributed.entry(comm).or_insert(0) += 1,
        }
    }

    let mut out: Vec<CommunityComposition> = counts
        .into_iter()
        .map(|(community, row)| {
            let total: usize = row.values().sum();
            let mut values: Vec<ValueShare> = row
                .into_iter()
                .map(|(value, count)| ValueShare {
                    value: value.to_string(),
                    count,
                    percentage: count as f64 / total as f64 * 100.0,
                })
                .collect();
            values.sort_by(|a, b| b.count.cmp(&a.count));
            CommunityComposition {
                community,
                size: sizes.get(&community).copied().unwrap_or(0),
                unattributed: unattributed.get(&community).copied().unwrap_or(0),
                values,
            }
        })
        .collect();
    out.sort_by(|a, b| b.size.cmp(&a.size));
    out
}

/// Community-detection section of the analysis report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityReport {
    /// Nodes of the analyzed graph.
    pub nodes: usize,
    /// Edges of the analyzed graph.
    pub edges: usize,
    /// True when the input was disconnected and only its largest component was used.
    pub reduced_to_largest_component: bool,
    /// Number of attribute communities (distinct values).
    pub attribute_communities: usize,
    /// Number of detected communities.
    pub detected_communities: usize,
    /// Attributed nodes the agreement metrics were computed over.
    pub compared_nodes: usize,
    /// Normalized mutual information; `None` when no node could be compared.
    pub nmi: Option<f64>,
    /// Adjusted Rand index; `None` when no node could be compared.
    pub ari: Option<f64>,
    /// Modularity of the attribute partition.
    pub attribute_modularity: f64,
    /// Modularity of the detected partition.
    pub detected_modularity: f64,
    /// Attribute community per attributed node.
    pub attribute_partition: BTreeMap<String, usize>,
    /// Detected community per node.
    pub detected_partition: BTreeMap<String, usize>,
    /// Attribute make-up of each detected community.
    pub composition: Vec<CommunityComposition>,
}

/// Detect communities and compare them with the attribute partition.
pub fn analyze(
    graph: &AttributedGraph,
    attribute: &str,
    config: &CommunityConfig,
) -> Result<CommunityReport> {
    check_input(graph, attribute)?;

    let reduced = !graph.is_connected();
    let graph = if reduced {
        let lcc = graph.largest_component();
        warn!(
            nodes = lcc.node_count(),
            original = graph.node_count(),
            "graph is disconnected; using largest connected component"
        );
        lcc
    } else {
        graph.clone()
    };

    let attr_partition = AttributePartition::build(&graph, attribute);
    let detected = Louvain::from_config(config).detect(graph.inner())?;

    // Align both partitions on attributed nodes, ordered by name.
    let mut aligned: Vec<(&str, usize, usize)> = graph
        .node_indices()
        .filter_map(|n| {
            let a = attr_partition.membership[n.index()]?;
            Some((graph.name(n), a, detected[n.index()]))
        })
        .collect();
    aligned.sort_by(|x, y| x.0.cmp(y.0));
    let attr_membership: Vec<usize> = aligned.iter().map(|t| t.1).collect();
    let detected_membership: Vec<usize> = aligned.iter().map(|t| t.2).collect();

    let (nmi, ari) = if aligned.is_empty() {
        (None, None)
    } else {
        (
            Some(nmi(&detected_membership, &attr_membership)?),
            Some(ari(&detected_membership, &attr_membership)?),
        )
    };

    let attribute_modularity = modularity(&graph, &attr_partition.with_singletons())?;
    let detected_modularity = modularity(&graph, &detected)?;

    let detected_communities = detected.iter().max().map_or(0, |&m| m + 1);
    info!(
        attribute,
        attribute_communities = attr_partition.values.len(),
        detected_communities,
        nmi = ?nmi,
        ari = ?ari,
        attribute_modularity,
        detected_modularity,
        "community detection finished"
    );

    Ok(CommunityReport {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        reduced_to_largest_component: reduced,
        attribute_communities: attr_partition.values.len(),
        detected_communities,
        compared_nodes: aligned.len(),
        nmi,
        ari,
        attribute_modularity,
        detected_modularity,
        attribute_partition: graph
            .node_indices()
            .filter_map(|n| {
                let a = attr_partition.membership[n.index()]?;
                Some((graph.name(n).to_string(), a))
            })
            .collect(),
        detected_partition: graph
            .node_indices()
            .map(|n| (graph.name(n).to_string(), detected[n.index()]))
            .collect(),
        composition: composition(&graph, &detected, attribute),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two genre-pure 4-cliques joined by one bridge, plus a stray pair.
    fn bridged(with_stray: bool) -> AttributedGraph {
        let mut g = AttributedGraph::new();
        for (prefix, genre) in [("r", "rock"), ("p", "pop")] {
            for i in 0..4 {
                let idx = g.add_node(&format!("{prefix}{i}"));
                g.set_attribute(idx, "genre", genre);
            }
            for i in 0..4 {
                for j in (i + 1)..4 {
                    g.add_edge(&format!("{prefix}{i}"), &format!("{prefix}{j}"))
                        .unwrap();
                }
            }
        }
        g.add_edge("r0", "p0").unwrap();
        if with_stray {
            let x = g.add_node("x");
            g.set_attribute(x, "genre", "jazz");
            g.add_node("y");
            g.add_edge("x", "y").unwrap();
        }
        g
    }

    #[test]
    fn test_detected_matches_genres() {
        let g = bridged(false);
        let report = analyze(&g, "genre", &CommunityConfig::default()).unwrap();
        assert!(!report.reduced_to_largest_component);
        assert_eq!(report.attribute_communities, 2);
        assert_eq!(report.detected_communities, 2);
        assert_eq!(report.compared_nodes, 8);
        assert!((report.nmi.unwrap() - 1.0).abs() < 1e-10);
        assert!((report.ari.unwrap() - 1.0).abs() < 1e-10);
        assert!((report.attribute_modularity - report.detected_modularity).abs() < 1e-10);
        assert!(report.detected_modularity > 0.3);
    }

    #[test]
    fn test_disconnected_input_is_reduced() {
        let g = bridged(true);
        let report = analyze(&g, "genre", &CommunityConfig::default()).unwrap();
        assert!(report.reduced_to_largest_component);
        assert_eq!(report.nodes, 8);
        assert!(!report.detected_partition.contains_key("x"));
        assert_eq!(report.attribute_communities, 2);
    }

    #[test]
    fn test_composition_rows_sum_to_hundred() {
        let mut g = bridged(false);
        let p3 = g.node("p3").unwrap();
        g.set_attribute(p3, "genre", "rock");
        let r1 = g.node("r1").unwrap();
        g.remove_attribute(r1, "genre");

        let detected = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let rows = composition(&g, &detected, "genre");
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let total: f64 = row.values.iter().map(|v| v.percentage).sum();
            assert!((total - 100.0).abs() < 1e-10);
        }
        let pop_side = rows.iter().find(|r| r.community == 1).unwrap();
        assert_eq!(pop_side.values[0].value, "pop");
        assert_eq!(pop_side.values[0].count, 3);
        assert!((pop_side.values[1].percentage - 25.0).abs() < 1e-10);
        let rock_side = rows.iter().find(|r| r.community == 0).unwrap();
        assert_eq!(rock_side.unattributed, 1);
        assert_eq!(rock_side.size, 4);
    }

    #[test]
    fn test_one_community_modularity_is_zero() {
        let g = bridged(false);
        let q = modularity(&g, &vec![0; g.node_count()]).unwrap();
        assert!(q.abs() < 1e-12);
        assert!(modularity(&g, &[0, 1]).is_err());
    }

    #[test]
    fn test_attribute_partition_singletons() {
        let mut g = bridged(false);
        let r2 = g.node("r2").unwrap();
        g.remove_attribute(r2, "genre");
        let part = AttributePartition::build(&g, "genre");
        assert_eq!(part.values, vec!["pop".to_string(), "rock".to_string()]);
        assert_eq!(part.membership[0], Some(1));
        assert_eq!(part.membership[2], None);
        let total = part.with_singletons();
        assert_eq!(total[2], 2);
        assert_eq!(total[4], 0);
    }

    #[test]
    fn test_unattributed_nodes_excluded_from_agreement() {
        let mut g = bridged(false);
        let r3 = g.node("r3").unwrap();
        g.remove_attribute(r3, "genre");
        let report = analyze(&g, "genre", &CommunityConfig::default()).unwrap();
        assert_eq!(report.compared_nodes, 7);
        assert_eq!(report.detected_partition.len(), 8);
        assert_eq!(report.attribute_partition.len(), 7);
    }
}
