//! Homophily measures over a categorical node attribute.
//!
//! | Measure | Range | Meaning |
//! |---------|-------|---------|
//! | [`homophily_ratio`] | [0, 1] | share of attributed edges joining equal values |
//! | [`blau_index`] | [0, 1 - 1/m] | diversity of one node's neighborhood |
//! | [`ei_indices`] | [-1, 1] | -1 all ties internal, +1 all ties external |
//! | [`assortativity`] | [-1, 1] | Newman's categorical assortativity |
//!
//! Nodes lacking the attribute are skipped, never treated as a value of
//! their own. Edges count only when both endpoints are attributed.
//!
//! ## Mixing matrix
//!
//! `M[a][b]` counts edge ends: every edge between an `a` node and a `b` node
//! adds one to `M[a][b]` and one to `M[b][a]`, so an edge inside value `a`
//! adds two to `M[a][a]`. The matrix is symmetric and sums to twice the
//! number of attributed edges. Normalized, it is exactly the `e_ij` matrix of
//! the assortativity coefficient:
//!
//! ```text
//! r = (Σ_i e_ii - Σ_i a_i b_i) / (1 - Σ_i a_i b_i)
//! ```
//!
//! ## References
//!
//! - Newman (2003). "Mixing patterns in networks." Phys. Rev. E 67, 026126.
//! - Krackhardt & Stern (1988). "Informal networks and organizational crises" (E-I index).
//! - Blau (1977). "Inequality and Heterogeneity."

use crate::error::{Error, Result};
use crate::graph::AttributedGraph;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

/// Symmetric value-by-value edge count matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MixingMatrix {
    /// Row/column labels, sorted.
    pub values: Vec<String>,
    /// `counts[i][j]` for `values[i]`, `values[j]`.
    pub counts: Vec<Vec<usize>>,
}

impl MixingMatrix {
    /// Position of a value in the row/column labels.
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.binary_search_by(|v| v.as_str().cmp(value)).ok()
    }

    /// Cell for a pair of values (0 for unknown values).
    pub fn get(&self, a: &str, b: &str) -> usize {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Sum of all cells.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// True when `counts[i][j] == counts[j][i]` everywhere.
    pub fn is_symmetric(&self) -> bool {
        let k = self.values.len();
        (0..k).all(|i| (0..k).all(|j| self.counts[i][j] == self.counts[j][i]))
    }
}

/// Homophily section of the analysis report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomophilyReport {
    /// Share of attributed edges joining equal values.
    pub homophily_ratio: f64,
    /// Blau index per node that has at least one attributed neighbor.
    pub blau_indices: BTreeMap<String, f64>,
    /// Mean of `blau_indices`; `None` when no node qualifies.
    pub average_blau: Option<f64>,
    /// Mixing matrix.
    pub mixing_matrix: MixingMatrix,
    /// E-I index per attribute value.
    pub ei_indices: BTreeMap<String, f64>,
    /// Assortativity coefficient; `None` when undefined.
    pub assortativity: Option<f64>,
}

/// `(u_value, v_value)` for every edge whose endpoints both carry `attribute`.
fn attributed_edges<'a>(
    graph: &'a AttributedGraph,
    attribute: &'a str,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    graph.edges().filter_map(move |(u, v)| {
        Some((graph.attribute(u, attribute)?, graph.attribute(v, attribute)?))
    })
}

/// Distinct attribute values over the node set, sorted.
pub fn attribute_values(graph: &AttributedGraph, attribute: &str) -> Vec<String> {
    graph
        .node_indices()
        .filter_map(|n| graph.attribute(n, attribute))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Fraction of attributed edges whose endpoints share the attribute value.
///
/// Returns 0 when no edge has both endpoints attributed.
pub fn homophily_ratio(graph: &AttributedGraph, attribute: &str) -> f64 {
    let mut total = 0usize;
    let mut same = 0usize;
    for (a, b) in attributed_edges(graph, attribute) {
        total += 1;
        if a == b {
            same += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    same as f64 / total as f64
}

/// Blau heterogeneity of a node's attributed neighborhood: `1 - Σ p_v²`.
///
/// Returns 0 when the node has no attributed neighbor.
pub fn blau_index(graph: &AttributedGraph, node: NodeIndex, attribute: &str) -> f64 {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for neighbor in graph.neighbors(node) {
        if let Some(v) = graph.attribute(neighbor, attribute) {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    let n: usize = counts.values().sum();
    if n == 0 {
        return 0.0;
    }
    let squares: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n as f64;
            p * p
        })
        .sum();
    1.0 - squares
}

/// Blau index for every node with at least one attributed neighbor, keyed by name.
pub fn blau_indices(graph: &AttributedGraph, attribute: &str) -> BTreeMap<String, f64> {
    graph
        .node_indices()
        .filter(|&n| {
            graph
                .neighbors(n)
                .any(|m| graph.attribute(m, attribute).is_some())
        })
        .map(|n| (graph.name(n).to_string(), blau_index(graph, n, attribute)))
        .collect()
}

/// Build the mixing matrix in one pass over the edges.
pub fn mixing_matrix(graph: &AttributedGraph, attribute: &str) -> MixingMatrix {
    let values = attribute_values(graph, attribute);
    let position: HashMap<&str, usize> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v.as_str(), i))
        .collect();
    let k = values.len();
    let mut counts = vec![vec![0usize; k]; k];

    for (a, b) in attributed_edges(graph, attribute) {
        let (i, j) = (position[a], position[b]);
        counts[i][j] += 1;
        counts[j][i] += 1;
    }
    MixingMatrix { values, counts }
}

/// E-I index for each attribute value.
///
/// Ties are accumulated from the members of each value: an internal edge is
/// seen from both of its ends and is halved, an external edge is seen once.
/// A value whose members have no attributed neighbor scores 0.
pub fn ei_indices(graph: &AttributedGraph, attribute: &str) -> BTreeMap<String, f64> {
    let mut internal: BTreeMap<&str, usize> = BTreeMap::new();
    let mut external: BTreeMap<&str, usize> = BTreeMap::new();

    for node in graph.node_indices() {
        let Some(value) = graph.attribute(node, attribute) else {
            continue;
        };
        internal.entry(value).or_insert(0);
        external.entry(value).or_insert(0);
        for neighbor in graph.neighbors(node) {
            match graph.attribute(neighbor, attribute) {
                Some(other) if other == value => *internal.entry(value).or_insert(0) += 1,
                Some(_) => *external.entry(value).or_insert(0) += 1,
                None => {}
            }
        }
    }

    internal
        .into_iter()
        .map(|(value, doubled)| {
            let i = doubled as f64 / 2.0;
            let e = external.get(value).copied().unwrap_or(0) as f64;
            let index = if i + e == 0.0 { 0.0 } else { (e - i) / (e + i) };
            (value.to_string(), index)
        })
        .collect()
}

/// Assortativity coefficient from a mixing matrix.
///
/// `None` when the matrix is empty or `Σ a_i b_i = 1` (a single value on
/// every attributed edge end), where the coefficient is 0/0.
pub fn assortativity_from_matrix(matrix: &MixingMatrix) -> Option<f64> {
    let total = matrix.total();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    let k = matrix.values.len();
    let trace: f64 = (0..k).map(|i| matrix.counts[i][i] as f64 / total).sum();
    let expected: f64 = (0..k)
        .map(|i| {
            let a: f64 = matrix.counts[i].iter().sum::<usize>() as f64 / total;
            let b: f64 = (0..k).map(|j| matrix.counts[j][i]).sum::<usize>() as f64 / total;
            a * b
        })
        .sum();
    let denom = 1.0 - expected;
    if denom.abs() < 1e-12 {
        return None;
    }
    Some((trace - expected) / denom)
}

/// Attribute assortativity coefficient (Newman's categorical form).
pub fn assortativity(graph: &AttributedGraph, attribute: &str) -> Option<f64> {
    assortativity_from_matrix(&mixing_matrix(graph, attribute))
}

/// Reject inputs no homophily measure can be computed on.
pub(crate) fn check_input(graph: &AttributedGraph, attribute: &str) -> Result<()> {
    if graph.is_empty() {
        return Err(Error::EmptyInput);
    }
    if graph.attributed_count(attribute) == 0 {
        return Err(Error::MissingAttribute {
            attribute: attribute.to_string(),
        });
    }
    Ok(())
}

/// Run every homophily measure.
pub fn analyze(graph: &AttributedGraph, attribute: &str) -> Result<HomophilyReport> {
    check_input(graph, attribute)?;

    let homophily_ratio = homophily_ratio(graph, attribute);
    let blau_indices = blau_indices(graph, attribute);
    let average_blau = if blau_indices.is_empty() {
        None
    } else {
        Some(blau_indices.values().sum::<f64>() / blau_indices.len() as f64)
    };
    let mixing_matrix = mixing_matrix(graph, attribute);
    let assortativity = assortativity_from_matrix(&mixing_matrix);

    info!(
        attribute,
        homophily_ratio,
        assortativity = ?assortativity,
        "homophily analysis finished"
    );

    Ok(HomophilyReport {
        homophily_ratio,
        blau_indices,
        average_blau,
        mixing_matrix,
        ei_indices: ei_indices(graph, attribute),
        assortativity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(nodes: &[(&str, Option<&str>)], edges: &[(&str, &str)]) -> AttributedGraph {
        let mut g = AttributedGraph::new();
        for (name, value) in nodes {
            let idx = g.add_node(name);
            if let Some(v) = value {
                g.set_attribute(idx, "genre", *v);
            }
        }
        for (a, b) in edges {
            g.add_edge(a, b).unwrap();
        }
        g
    }

    fn ring() -> AttributedGraph {
        labeled(
            &[("A", Some("x")), ("B", Some("x")), ("C", Some("y")), ("D", Some("y"))],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")],
        )
    }

    fn two_triangles() -> AttributedGraph {
        labeled(
            &[
                ("a1", Some("x")),
                ("a2", Some("x")),
                ("a3", Some("x")),
                ("b1", Some("y")),
                ("b2", Some("y")),
                ("b3", Some("y")),
            ],
            &[
                ("a1", "a2"),
                ("a2", "a3"),
                ("a1", "a3"),
                ("b1", "b2"),
                ("b2", "b3"),
                ("b1", "b3"),
            ],
        )
    }

    #[test]
    fn test_ring_ratio_and_mixing_matrix() {
        let g = ring();
        assert!((homophily_ratio(&g, "genre") - 0.5).abs() < 1e-10);

        let m = mixing_matrix(&g, "genre");
        assert_eq!(m.values, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(m.counts, vec![vec![2, 2], vec![2, 2]]);
        assert!(m.is_symmetric());
        assert_eq!(m.total(), 2 * g.edge_count());
        assert_eq!(m.get("x", "y"), 2);
        assert_eq!(m.get("x", "nope"), 0);
    }

    #[test]
    fn test_ring_ei_and_assortativity() {
        let g = ring();
        let ei = ei_indices(&g, "genre");
        // x: internal 1, external 2 -> 1/3
        assert!((ei["x"] - 1.0 / 3.0).abs() < 1e-10);
        assert!((ei["y"] - 1.0 / 3.0).abs() < 1e-10);
        // e = [[.25,.25],[.25,.25]], a = b = [.5,.5]: (0.5 - 0.5) / 0.5
        assert!(assortativity(&g, "genre").unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_disjoint_monochromatic_triangles() {
        let g = two_triangles();
        assert!((homophily_ratio(&g, "genre") - 1.0).abs() < 1e-10);
        let ei = ei_indices(&g, "genre");
        assert!((ei["x"] + 1.0).abs() < 1e-10);
        assert!((ei["y"] + 1.0).abs() < 1e-10);
        assert!((assortativity(&g, "genre").unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_isolated_node() {
        let g = labeled(&[("solo", Some("x"))], &[]);
        assert_eq!(homophily_ratio(&g, "genre"), 0.0);
        assert!(blau_indices(&g, "genre").is_empty());
        assert_eq!(blau_index(&g, g.node("solo").unwrap(), "genre"), 0.0);
        assert!(assortativity(&g, "genre").is_none());

        let report = analyze(&g, "genre").unwrap();
        assert!(report.average_blau.is_none());
        assert_eq!(report.ei_indices["x"], 0.0);
    }

    #[test]
    fn test_blau_bounds() {
        // hub with neighbors x, y, z, x
        let g = labeled(
            &[
                ("hub", Some("x")),
                ("n1", Some("x")),
                ("n2", Some("y")),
                ("n3", Some("z")),
                ("n4", Some("x")),
                ("n5", None),
            ],
            &[("hub", "n1"), ("hub", "n2"), ("hub", "n3"), ("hub", "n4"), ("hub", "n5")],
        );
        let hub = g.node("hub").unwrap();
        let b = blau_index(&g, hub, "genre");
        // 1 - (0.5² + 0.25² + 0.25²)
        assert!((b - 0.625).abs() < 1e-10);
        assert!(b <= 1.0 - 1.0 / 3.0);

        let leaf = g.node("n1").unwrap();
        assert_eq!(blau_index(&g, leaf, "genre"), 0.0);
        // n5 lacks the attribute but still has an attributed neighbor
        assert!(blau_indices(&g, "genre").contains_key("n5"));
    }

    #[test]
    fn test_unattributed_endpoints_are_skipped() {
        let g = labeled(
            &[("a", Some("x")), ("b", Some("x")), ("c", None)],
            &[("a", "b"), ("b", "c")],
        );
        assert!((homophily_ratio(&g, "genre") - 1.0).abs() < 1e-10);
        let m = mixing_matrix(&g, "genre");
        assert_eq!(m.total(), 2);
        assert!(assortativity(&g, "genre").is_none());
    }

    #[test]
    fn test_fully_external_value() {
        // star: center x, leaves y
        let g = labeled(
            &[("c", Some("x")), ("l1", Some("y")), ("l2", Some("y"))],
            &[("c", "l1"), ("c", "l2")],
        );
        let ei = ei_indices(&g, "genre");
        assert!((ei["x"] - 1.0).abs() < 1e-10);
        assert!((ei["y"] - 1.0).abs() < 1e-10);
        assert_eq!(homophily_ratio(&g, "genre"), 0.0);
        assert!((assortativity(&g, "genre").unwrap() + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_missing_attribute_everywhere_is_error() {
        let g = labeled(&[("a", None)], &[]);
        assert!(matches!(
            analyze(&g, "genre"),
            Err(Error::MissingAttribute { .. })
        ));
    }
}
