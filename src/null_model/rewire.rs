//! Degree-preserving randomization by double edge swaps.
//!
//! A swap takes two edges `(a, b)` and `(c, d)` and replaces them with
//! `(a, d)` and `(c, b)`. Every endpoint keeps its degree. A swap is
//! rejected when the four endpoints are not distinct (it would create a
//! self-loop) or when either new edge already exists (it would create a
//! parallel edge).

use crate::graph::AttributedGraph;
use rand::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// Bookkeeping of one rewiring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapOutcome {
    /// Swaps requested.
    pub budget: usize,
    /// Swaps applied.
    pub performed: usize,
    /// Candidate pairs drawn, accepted or not.
    pub attempts: usize,
}

impl SwapOutcome {
    /// True when the attempt limit ran out before the budget was met.
    pub fn is_partial(&self) -> bool {
        self.performed < self.budget
    }
}

fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Randomize a copy of `graph` with up to `nswap` double edge swaps.
///
/// Gives up after `max_tries` candidate draws and returns whatever was
/// reached; the outcome records how many swaps actually happened. Graphs
/// with fewer than two edges cannot be rewired.
pub fn double_edge_swap<R: Rng + ?Sized>(
    graph: &AttributedGraph,
    nswap: usize,
    max_tries: usize,
    rng: &mut R,
) -> (AttributedGraph, SwapOutcome) {
    let mut edges: Vec<(usize, usize)> = graph
        .edges()
        .map(|(a, b)| (a.index(), b.index()))
        .collect();
    let mut present: HashSet<(usize, usize)> = edges.iter().map(|&(a, b)| key(a, b)).collect();

    let mut outcome = SwapOutcome {
        budget: nswap,
        performed: 0,
        attempts: 0,
    };
    let m = edges.len();
    if m < 2 {
        return (graph.clone(), outcome);
    }

    while outcome.performed < nswap && outcome.attempts < max_tries {
        outcome.attempts += 1;

        let i = rng.random_range(0..m);
        let mut j = rng.random_range(0..m - 1);
        if j >= i {
            j += 1;
        }
        let (a, b) = edges[i];
        let (mut c, mut d) = edges[j];
        if rng.random_bool(0.5) {
            std::mem::swap(&mut c, &mut d);
        }

        if a == c || a == d || b == c || b == d {
            continue;
        }
        if present.contains(&key(a, d)) || present.contains(&key(c, b)) {
            continue;
        }

        present.remove(&key(a, b));
        present.remove(&key(c, d));
        present.insert(key(a, d));
        present.insert(key(c, b));
        edges[i] = (a, d);
        edges[j] = (c, b);
        outcome.performed += 1;
    }

    (graph.with_edges(&edges), outcome)
}
