//! Attribute-shuffling randomization.
//!
//! Keeps the edge set and the multiset of attribute values, and permutes
//! which node holds which value. Only nodes that carry the attribute take
//! part; unattributed nodes stay unattributed. Values are reassigned in
//! node index order, so a seeded RNG yields a reproducible graph.

use crate::graph::AttributedGraph;
use rand::prelude::*;

/// Copy of `graph` with the values of `attribute` randomly permuted.
pub fn shuffle_attribute<R: Rng + ?Sized>(
    graph: &AttributedGraph,
    attribute: &str,
    rng: &mut R,
) -> AttributedGraph {
    let holders: Vec<_> = graph
        .node_indices()
        .filter(|&n| graph.attribute(n, attribute).is_some())
        .collect();
    let mut values: Vec<String> = holders
        .iter()
        .filter_map(|&n| graph.attribute(n, attribute))
        .map(str::to_string)
        .collect();
    values.shuffle(rng);

    let mut shuffled = graph.clone();
    for (node, value) in holders.into_iter().zip(values) {
        shuffled.set_attribute(node, attribute, value);
    }
    shuffled
}
