//! Seam between the community engine and a detection algorithm.

use crate::error::Result;
use petgraph::graph::UnGraph;

/// A partitioning algorithm run on the collaboration graph.
///
/// [`analyze`](super::analyze) only needs a membership vector to compare
/// against the attribute partition, so any algorithm returning one fits.
pub trait CommunityDetection {
    /// Partition `graph`; entry `i` is the community of node index `i`.
    ///
    /// Ids are dense and numbered by first appearance in node order, so the
    /// same partition always serializes the same way.
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>>;

    /// Modularity resolution `γ` the algorithm optimizes at.
    fn resolution(&self) -> f64 {
        1.0
    }
}
