//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! Louvain is a multi-level, greedy modularity optimization algorithm:
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Visit nodes in a seeded random order and move each to the neighboring
//!    community with the highest modularity gain, until a full pass moves
//!    nothing.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities.
//!    Self-loops carry the internal weight of each community.
//!
//! 3. **Iterate**: Repeat phases 1-2 on the meta-graph until modularity
//!    stops improving.
//!
//! ## Determinism
//!
//! The only randomness is the node visiting order. Candidate communities are
//! scanned in ascending id order and a move needs a strictly larger gain, so
//! a fixed seed always yields the same partition.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::traits::CommunityDetection;
use crate::config::CommunityConfig;
use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Gains below this are treated as ties.
const GAIN_EPSILON: f64 = 1e-12;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum local-moving passes per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
    /// Seed of the node visiting order.
    seed: Option<u64>,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
            seed: None,
        }
    }

    /// Detector configured from the `[community]` config table.
    pub fn from_config(config: &CommunityConfig) -> Self {
        Self::new()
            .with_resolution(config.resolution)
            .with_max_iter(config.max_iter)
            .with_max_levels(config.max_levels)
            .with_seed(config.seed)
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum passes per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Phase 1: Local moving on weighted graph.
    /// Returns (communities, improved).
    fn local_moving(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        rng: &mut dyn RngCore,
    ) -> (Vec<usize>, bool) {
        // Build adjacency with weights
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for &(i, j, w) in edges {
            adj[i].push((j, w));
            adj[j].push((i, w));
        }

        let m = total_weight(edges, self_loops);
        if m == 0.0 {
            return ((0..n).collect(), false);
        }
        let degrees = weighted_degrees(n, edges, self_loops);

        // Initialize communities
        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut any_improved = false;

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        for _iter in 0..self.max_iter {
            let mut improved = false;

            for &node in &order {
                let current_community = communities[node];
                let ki = degrees[node];

                // Temporarily remove node from community
                community_degrees[current_community] -= ki;

                // Edge weight from node into each neighboring community
                let mut community_weights: BTreeMap<usize, f64> = BTreeMap::new();
                for &(neighbor, w) in &adj[node] {
                    *community_weights.entry(communities[neighbor]).or_insert(0.0) += w;
                }

                // Gain scaled by m: k_i,in - γ Σ_tot k_i / 2m
                let gain = |comm: usize, ki_in: f64| {
                    ki_in - self.resolution * community_degrees[comm] * ki / (2.0 * m)
                };

                let mut best_community = current_community;
                let mut best_gain = gain(
                    current_community,
                    community_weights
                        .get(&current_community)
                        .copied()
                        .unwrap_or(0.0),
                );
                for (&target_comm, &ki_in) in &community_weights {
                    let g = gain(target_comm, ki_in);
                    if g > best_gain + GAIN_EPSILON {
                        best_gain = g;
                        best_community = target_comm;
                    }
                }

                communities[node] = best_community;
                community_degrees[best_community] += ki;
                if best_community != current_community {
                    improved = true;
                    any_improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }

    /// Phase 2: Aggregate graph based on communities.
    /// Returns (new_edges, new_self_loops, node_to_original_mapping).
    fn aggregate(
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> (Vec<(usize, usize, f64)>, Vec<f64>, Vec<Vec<usize>>) {
        // Find unique communities and create mapping
        let mut unique_comms: Vec<usize> = communities.to_vec();
        unique_comms.sort_unstable();
        unique_comms.dedup();
        let n_new = unique_comms.len();

        let comm_to_new: HashMap<usize, usize> = unique_comms
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();

        // Track which nodes of this level map to each new node
        let mut new_to_old: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for (node, &comm) in communities.iter().enumerate() {
            new_to_old[comm_to_new[&comm]].push(node);
        }

        // Inter-community edges merge; intra-community edges become self-loops
        let mut new_edge_weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut new_self_loops = vec![0.0; n_new];
        for (i, &sl) in self_loops.iter().enumerate() {
            new_self_loops[comm_to_new[&communities[i]]] += sl;
        }
        for &(i, j, w) in edges {
            let ci = comm_to_new[&communities[i]];
            let cj = comm_to_new[&communities[j]];
            if ci == cj {
                new_self_loops[ci] += w;
            } else {
                let key = if ci < cj { (ci, cj) } else { (cj, ci) };
                *new_edge_weights.entry(key).or_insert(0.0) += w;
            }
        }

        let new_edges: Vec<(usize, usize, f64)> = new_edge_weights
            .into_iter()
            .map(|((i, j), w)| (i, j, w))
            .collect();

        (new_edges, new_self_loops, new_to_old)
    }

    /// Expand partition from aggregated level to the level below.
    fn expand_partition(partition: &[usize], node_mapping: &[Vec<usize>]) -> Vec<usize> {
        let n_below: usize = node_mapping.iter().map(Vec::len).sum();
        let mut result = vec![0; n_below];

        for (agg_node, members) in node_mapping.iter().enumerate() {
            let comm = partition[agg_node];
            for &node in members {
                result[node] = comm;
            }
        }
        result
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

/// Total edge weight `m`, self-loops included once.
fn total_weight(edges: &[(usize, usize, f64)], self_loops: &[f64]) -> f64 {
    edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>()
}

/// Weighted degrees; a self-loop counts twice.
fn weighted_degrees(n: usize, edges: &[(usize, usize, f64)], self_loops: &[f64]) -> Vec<f64> {
    let mut degrees = vec![0.0; n];
    for &(i, j, w) in edges {
        degrees[i] += w;
        degrees[j] += w;
    }
    for (i, &sl) in self_loops.iter().enumerate() {
        degrees[i] += 2.0 * sl;
    }
    degrees
}

/// Modularity of a partition of a weighted graph.
///
/// ```text
/// Q = Σ_c [ L_c / m - γ (d_c / 2m)² ]
/// ```
///
/// with `L_c` the weight inside community `c` and `d_c` its total degree.
/// This is the pairwise `(1/2m) Σ_ij [A_ij - γ k_i k_j / 2m] δ(c_i, c_j)`
/// grouped by community. A graph without edges has modularity 0.
pub(crate) fn modularity_weighted(
    n: usize,
    edges: &[(usize, usize, f64)],
    self_loops: &[f64],
    communities: &[usize],
    resolution: f64,
) -> f64 {
    let m = total_weight(edges, self_loops);
    if m == 0.0 {
        return 0.0;
    }
    let degrees = weighted_degrees(n, edges, self_loops);

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut totals: HashMap<usize, f64> = HashMap::new();
    for (i, &d) in degrees.iter().enumerate() {
        *totals.entry(communities[i]).or_insert(0.0) += d;
    }
    for (i, &sl) in self_loops.iter().enumerate() {
        *internal.entry(communities[i]).or_insert(0.0) += sl;
    }
    for &(i, j, w) in edges {
        if communities[i] == communities[j] {
            *internal.entry(communities[i]).or_insert(0.0) += w;
        }
    }

    totals
        .iter()
        .map(|(c, &d_c)| {
            let l_c = internal.get(c).copied().unwrap_or(0.0);
            l_c / m - resolution * (d_c / (2.0 * m)).powi(2)
        })
        .sum()
}

/// Unit-weight edge list of a petgraph graph, each undirected edge once.
pub(crate) fn unit_edges<N, E>(graph: &UnGraph<N, E>) -> Vec<(usize, usize, f64)> {
    graph
        .edge_references()
        .filter(|e| e.source() != e.target())
        .map(|e| (e.source().index(), e.target().index(), 1.0))
        .collect()
}

impl CommunityDetection for Louvain {
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if graph.edge_count() == 0 {
            // No edges: each node is its own community
            return Ok((0..n).collect());
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        // Multi-level Louvain
        let mut current_n = n;
        let mut current_edges = unit_edges(graph);
        let mut current_self_loops = vec![0.0; n];

        // Stack of node mappings for expanding final partition
        let mut mapping_stack: Vec<Vec<Vec<usize>>> = Vec::new();

        let mut prev_modularity = f64::NEG_INFINITY;

        for _level in 0..self.max_levels {
            // Phase 1: Local moving
            let (partition, improved) = self.local_moving(
                current_n,
                &current_edges,
                &current_self_loops,
                rng.as_mut(),
            );

            if !improved {
                break;
            }

            // Check modularity improvement
            let mod_now = modularity_weighted(
                current_n,
                &current_edges,
                &current_self_loops,
                &partition,
                self.resolution,
            );

            if mod_now - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = mod_now;

            // Phase 2: Aggregate
            let (new_edges, new_self_loops, node_mapping) =
                Self::aggregate(&current_edges, &current_self_loops, &partition);

            current_n = node_mapping.len();
            mapping_stack.push(node_mapping);
            current_edges = new_edges;
            current_self_loops = new_self_loops;
        }

        // Expand partition back to original nodes
        // Start with identity partition at current level
        let mut result: Vec<usize> = (0..current_n).collect();

        // Expand through all aggregation levels
        while let Some(mapping) = mapping_stack.pop() {
            result = Self::expand_partition(&result, &mapping);
        }

        // Renumber to consecutive integers in order of first appearance
        let mut renumber: HashMap<usize, usize> = HashMap::new();
        Ok(result
            .iter()
            .map(|&c| {
                let next = renumber.len();
                *renumber.entry(c).or_insert(next)
            })
            .collect())
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::UnGraph;

    fn two_cliques() -> UnGraph<(), ()> {
        // Two triangles connected by a single edge
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let a: Vec<_> = (0..3).map(|_| graph.add_node(())).collect();
        let b: Vec<_> = (0..3).map(|_| graph.add_node(())).collect();
        for clique in [&a, &b] {
            let _ = graph.add_edge(clique[0], clique[1], ());
            let _ = graph.add_edge(clique[1], clique[2], ());
            let _ = graph.add_edge(clique[0], clique[2], ());
        }
        let _ = graph.add_edge(a[2], b[0], ());
        graph
    }

    #[test]
    fn test_louvain_triangle() {
        // Simple triangle - should be one community
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());

        let _ = graph.add_edge(n0, n1, ());
        let _ = graph.add_edge(n1, n2, ());
        let _ = graph.add_edge(n0, n2, ());

        let communities = Louvain::new().with_seed(1).detect(&graph).unwrap();

        assert_eq!(communities.len(), 3);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
    }

    #[test]
    fn test_louvain_two_cliques() {
        let graph = two_cliques();
        let communities = Louvain::new().with_seed(3).detect(&graph).unwrap();

        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
    }

    fn partition<D: CommunityDetection>(algo: &D, graph: &UnGraph<(), ()>) -> Vec<usize> {
        algo.detect(graph).unwrap()
    }

    #[test]
    fn test_detect_ids_dense_in_node_order() {
        let graph = two_cliques();
        let algo = Louvain::new().with_seed(3).with_resolution(1.0);
        assert_eq!(partition(&algo, &graph), vec![0, 0, 0, 1, 1, 1]);
        assert!((algo.resolution() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_louvain_same_seed_same_partition() {
        let graph = two_cliques();
        for seed in 0..5 {
            let a = Louvain::new().with_seed(seed).detect(&graph).unwrap();
            let b = Louvain::new().with_seed(seed).detect(&graph).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_louvain_empty_graph() {
        let graph = UnGraph::<(), ()>::new_undirected();
        assert!(Louvain::new().detect(&graph).is_err());
    }

    #[test]
    fn test_louvain_disconnected() {
        // Two isolated nodes
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let _ = graph.add_node(());
        let _ = graph.add_node(());

        let communities = Louvain::new().detect(&graph).unwrap();
        assert_eq!(communities.len(), 2);
        assert_ne!(communities[0], communities[1]);
    }

    #[test]
    fn test_modularity_known_values() {
        let graph = two_cliques();
        let edges = unit_edges(&graph);
        let loops = vec![0.0; 6];

        // One community: Q = 1 - 1 = 0
        let q_all = modularity_weighted(6, &edges, &loops, &[0; 6], 1.0);
        assert!(q_all.abs() < 1e-12);

        // Clique split: each side L = 3, d = 7, m = 7 -> 2 (3/7 - (7/14)²)
        let q_split = modularity_weighted(6, &edges, &loops, &[0, 0, 0, 1, 1, 1], 1.0);
        assert!((q_split - (6.0 / 7.0 - 0.5)).abs() < 1e-12);

        // Aggregating preserves modularity of the coarse partition
        let (agg_edges, agg_loops, _) = Louvain::aggregate(&edges, &loops, &[0, 0, 0, 1, 1, 1]);
        let q_agg = modularity_weighted(2, &agg_edges, &agg_loops, &[0, 1], 1.0);
        assert!((q_agg - q_split).abs() < 1e-12);
    }
}
