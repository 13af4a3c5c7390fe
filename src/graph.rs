//! Attributed undirected collaboration graph.
//!
//! Nodes are artists identified by a unique name. Each node owns a small
//! attribute store (`key -> categorical value`). Any node may lack any key. Edges are unweighted, undirected and
//! simple. Parallel edges and self-loops are rejected at insertion, so the
//! edge set stays symmetric and loop-free for every consumer.
//!
//! Node indices follow insertion order. Every analysis that needs a stable
//! iteration order (attribute shuffling, partition alignment) relies on it.

use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// A node payload: artist name plus its categorical attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Unique artist name.
    pub name: String,
    attributes: BTreeMap<String, String>,
}

impl Artist {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Value stored under `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// All attributes of this node.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Undirected simple graph of artists with per-node categorical attributes.
#[derive(Debug, Clone, Default)]
pub struct AttributedGraph {
    graph: UnGraph<Artist, ()>,
    index: HashMap<String, NodeIndex>,
}

impl AttributedGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// Add a node by name, returning the existing index if already present.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(Artist::new(name));
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Set an attribute on an existing node.
    pub fn set_attribute(&mut self, node: NodeIndex, key: &str, value: impl Into<String>) {
        if let Some(artist) = self.graph.node_weight_mut(node) {
            artist.attributes.insert(key.to_string(), value.into());
        }
    }

    /// Remove an attribute from an existing node.
    pub fn remove_attribute(&mut self, node: NodeIndex, key: &str) -> Option<String> {
        self.graph
            .node_weight_mut(node)
            .and_then(|artist| artist.attributes.remove(key))
    }

    /// Add an undirected edge between two named nodes.
    ///
    /// Returns `Ok(false)` when the edge is a self-loop or already exists.
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<bool> {
        let ia = self.node(a).ok_or_else(|| Error::UnknownNode(a.to_string()))?;
        let ib = self.node(b).ok_or_else(|| Error::UnknownNode(b.to_string()))?;
        Ok(self.add_edge_between(ia, ib))
    }

    /// Add an undirected edge between two node indices.
    ///
    /// Returns `false` when the edge is a self-loop or already exists.
    pub fn add_edge_between(&mut self, a: NodeIndex, b: NodeIndex) -> bool {
        if a == b || self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    /// Look up a node index by name.
    pub fn node(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    /// Name of the node at `node`.
    ///
    /// Panics if the index does not belong to this graph.
    pub fn name(&self, node: NodeIndex) -> &str {
        &self.graph[node].name
    }

    /// Attribute value of a node, if the node carries `key`.
    pub fn attribute(&self, node: NodeIndex, key: &str) -> Option<&str> {
        self.graph.node_weight(node).and_then(|a| a.attribute(key))
    }

    /// Node payload.
    pub fn artist(&self, node: NodeIndex) -> Option<&Artist> {
        self.graph.node_weight(node)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node indices in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Neighbors of a node.
    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(node)
    }

    /// Degree of a node.
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.graph.edges(node).count()
    }

    /// Degree of every node, in node index order.
    pub fn degrees(&self) -> Vec<usize> {
        self.graph.node_indices().map(|n| self.degree(n)).collect()
    }

    /// True when an edge joins `a` and `b`.
    pub fn has_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    /// All edges as `(source, target)` index pairs, each edge once.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target()))
    }

    /// Underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<Artist, ()> {
        &self.graph
    }

    /// Number of nodes carrying `key`.
    pub fn attributed_count(&self, key: &str) -> usize {
        self.graph
            .node_weights()
            .filter(|a| a.attribute(key).is_some())
            .count()
    }

    /// Copy of this graph with the same nodes (and attributes) but a new edge set.
    ///
    /// Edges are given as node index positions; loops and duplicates are dropped.
    pub fn with_edges(&self, edges: &[(usize, usize)]) -> Self {
        let mut graph = UnGraph::with_capacity(self.node_count(), edges.len());
        for artist in self.graph.node_weights() {
            graph.add_node(artist.clone());
        }
        let mut out = Self {
            graph,
            index: self.index.clone(),
        };
        for &(a, b) in edges {
            out.add_edge_between(NodeIndex::new(a), NodeIndex::new(b));
        }
        out
    }

    /// Connected components, largest first.
    ///
    /// Each component lists its nodes in ascending index order. Components of
    /// equal size keep the order of their lowest node index.
    pub fn connected_components(&self) -> Vec<Vec<NodeIndex>> {
        let n = self.node_count();
        let mut seen = vec![false; n];
        let mut components = Vec::new();

        for start in self.graph.node_indices() {
            if seen[start.index()] {
                continue;
            }
            seen[start.index()] = true;
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for next in self.graph.neighbors(node) {
                    if !seen[next.index()] {
                        seen[next.index()] = true;
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        // Stable sort keeps discovery order among equal sizes.
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        components
    }

    /// True when the graph is non-empty and has a single component.
    pub fn is_connected(&self) -> bool {
        !self.is_empty() && self.connected_components().len() == 1
    }

    /// Subgraph induced by `nodes`, keeping their relative index order.
    pub fn induced_subgraph(&self, nodes: &[NodeIndex]) -> Self {
        let mut ordered = nodes.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut out = Self::new();
        let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(ordered.len());
        for &old in &ordered {
            let artist = self.graph[old].clone();
            let name = artist.name.clone();
            let new = out.graph.add_node(artist);
            out.index.insert(name, new);
            remap.insert(old, new);
        }
        for (a, b) in self.edges() {
            if let (Some(&na), Some(&nb)) = (remap.get(&a), remap.get(&b)) {
                out.add_edge_between(na, nb);
            }
        }
        out
    }

    /// Largest connected component as its own graph.
    ///
    /// Returns a plain copy when the graph is already connected (or empty).
    pub fn largest_component(&self) -> Self {
        let components = self.connected_components();
        match components.first() {
            Some(largest) if components.len() > 1 => self.induced_subgraph(largest),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> AttributedGraph {
        let mut g = AttributedGraph::new();
        for name in names {
            g.add_node(name);
        }
        for pair in names.windows(2) {
            g.add_edge(pair[0], pair[1]).unwrap();
        }
        g
    }

    #[test]
    fn test_duplicate_and_loop_edges_rejected() {
        let mut g = path(&["a", "b"]);
        assert!(!g.add_edge("b", "a").unwrap());
        assert!(!g.add_edge("a", "a").unwrap());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_unknown_node_is_error() {
        let mut g = path(&["a"]);
        assert!(matches!(g.add_edge("a", "zz"), Err(Error::UnknownNode(_))));
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut g = AttributedGraph::new();
        let a = g.add_node("a");
        let again = g.add_node("a");
        assert_eq!(a, again);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_attribute_lookup_is_presence_checked() {
        let mut g = path(&["a", "b"]);
        let a = g.node("a").unwrap();
        g.set_attribute(a, "main_genre", "rock");
        assert_eq!(g.attribute(a, "main_genre"), Some("rock"));
        assert_eq!(g.attribute(g.node("b").unwrap(), "main_genre"), None);
        assert_eq!(g.attributed_count("main_genre"), 1);
    }

    #[test]
    fn test_components_and_largest() {
        let mut g = path(&["a", "b", "c"]);
        g.add_node("d");
        g.add_node("e");
        g.add_edge("d", "e").unwrap();
        g.add_node("f");

        let comps = g.connected_components();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].len(), 3);
        assert_eq!(comps[1].len(), 2);
        assert!(!g.is_connected());

        let lcc = g.largest_component();
        assert_eq!(lcc.node_count(), 3);
        assert_eq!(lcc.edge_count(), 2);
        assert!(lcc.is_connected());
        assert!(lcc.node("d").is_none());
    }

    #[test]
    fn test_with_edges_keeps_nodes_and_attributes() {
        let mut g = path(&["a", "b", "c"]);
        let c = g.node("c").unwrap();
        g.set_attribute(c, "k", "v");
        let h = g.with_edges(&[(0, 2), (2, 0), (1, 1)]);
        assert_eq!(h.node_count(), 3);
        assert_eq!(h.edge_count(), 1);
        assert_eq!(h.attribute(c, "k"), Some("v"));
        assert_eq!(h.node("b"), g.node("b"));
    }
}
