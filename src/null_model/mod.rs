//! Null-model significance testing for homophily.
//!
//! Is the observed homophily a property of who collaborates with whom, or
//! would any graph with the same degrees (or the same genre base rates) show
//! it too? Two randomized ensembles answer that:
//!
//! 1. **Rewiring**: `|E| × R` double edge swaps per sample. Degrees are
//!    preserved, the attribute-edge correlation is destroyed.
//! 2. **Attribute shuffling**: node values permuted. Edges and value counts
//!    are preserved, the value-position correlation is destroyed.
//!
//! Each ensemble's homophily ratios are t-tested against the observed ratio
//! (the observed value plays the population mean). A low p-value means the
//! observed homophily is unlikely under that null model.
//!
//! ## Reproducibility
//!
//! One master seed derives an ordered list of per-sample seeds, first for
//! the rewiring samples, then for the shuffling samples. Every sample owns
//! its RNG and its graph copy, so with the `parallel` feature the samples
//! run on rayon and still produce exactly the serial result.

mod rewire;
mod shuffle;

pub use rewire::{double_edge_swap, SwapOutcome};
pub use shuffle::shuffle_attribute;

use crate::config::NullModelConfig;
use crate::error::{Error, Result};
use crate::graph::AttributedGraph;
use crate::homophily::{assortativity, check_input, homophily_ratio};
use crate::significance::{mean, one_sample_t_test, TTest};
use rand::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Metrics of one randomized graph.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    homophily: f64,
    assortativity: Option<f64>,
    swaps: Option<SwapOutcome>,
}

/// Distribution of metrics over one ensemble.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleSummary {
    /// Homophily ratio of every sample, in seed order.
    pub homophily_samples: Vec<f64>,
    /// Assortativity of every sample; `None` where undefined.
    pub assortativity_samples: Vec<Option<f64>>,
    /// Mean homophily ratio.
    pub mean_homophily: Option<f64>,
    /// Mean over the samples with a defined assortativity.
    pub mean_assortativity: Option<f64>,
    /// One-sample t-test of the homophily samples against the observed ratio.
    pub t_test: Option<TTest>,
}

impl EnsembleSummary {
    fn from_samples(samples: &[Sample], observed: f64) -> Self {
        let homophily_samples: Vec<f64> = samples.iter().map(|s| s.homophily).collect();
        let assortativity_samples: Vec<Option<f64>> =
            samples.iter().map(|s| s.assortativity).collect();
        let defined: Vec<f64> = assortativity_samples.iter().flatten().copied().collect();
        Self {
            mean_homophily: mean(&homophily_samples),
            mean_assortativity: mean(&defined),
            t_test: one_sample_t_test(&homophily_samples, observed),
            homophily_samples,
            assortativity_samples,
        }
    }

    /// p-value of the t-test, if defined.
    pub fn p_value(&self) -> Option<f64> {
        self.t_test.map(|t| t.p_value)
    }
}

/// Swap bookkeeping for the rewiring ensemble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewiringDiagnostics {
    /// Swaps requested per sample (`|E| × R`).
    pub swap_budget: usize,
    /// Candidate draws allowed per sample.
    pub max_tries: usize,
    /// Swaps applied, per sample in seed order.
    pub swaps_performed: Vec<usize>,
}

impl RewiringDiagnostics {
    /// Number of samples that stopped short of the budget.
    pub fn partial_samples(&self) -> usize {
        self.swaps_performed
            .iter()
            .filter(|&&s| s < self.swap_budget)
            .count()
    }
}

/// Null-model section of the analysis report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullModelReport {
    /// Samples per ensemble.
    pub iterations: usize,
    /// Master seed the per-sample seeds were derived from.
    pub seed: u64,
    /// Homophily ratio of the input graph.
    pub observed_homophily: f64,
    /// Assortativity of the input graph.
    pub observed_assortativity: Option<f64>,
    /// Degree-preserving rewiring ensemble.
    pub rewiring: EnsembleSummary,
    /// Swap bookkeeping for `rewiring`.
    pub rewiring_swaps: RewiringDiagnostics,
    /// Attribute-shuffling ensemble.
    pub shuffling: EnsembleSummary,
}

/// Null-model runner.
#[derive(Debug, Clone)]
pub struct NullModel {
    /// Samples per ensemble.
    iterations: usize,
    /// Swaps per edge in each rewiring sample.
    rewiring_factor: usize,
    /// Candidate draws allowed per requested swap.
    max_tries_factor: usize,
    /// Master seed; drawn from the OS when unset.
    seed: Option<u64>,
}

impl NullModel {
    /// Create a runner with 100 samples, 10 swaps per edge, 10 tries per swap.
    pub fn new() -> Self {
        Self {
            iterations: 100,
            rewiring_factor: 10,
            max_tries_factor: 10,
            seed: None,
        }
    }

    /// Runner configured from the `[null_model]` config table.
    pub fn from_config(config: &NullModelConfig) -> Self {
        Self {
            iterations: config.iterations,
            rewiring_factor: config.rewiring_factor,
            max_tries_factor: config.max_tries_factor,
            seed: config.seed,
        }
    }

    /// Set samples per ensemble.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set swaps per edge.
    pub fn with_rewiring_factor(mut self, factor: usize) -> Self {
        self.rewiring_factor = factor;
        self
    }

    /// Set candidate draws allowed per requested swap.
    pub fn with_max_tries_factor(mut self, factor: usize) -> Self {
        self.max_tries_factor = factor;
        self
    }

    /// Set master seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rewired_sample(
        &self,
        graph: &AttributedGraph,
        attribute: &str,
        seed: u64,
        budget: usize,
    ) -> Sample {
        let mut rng = StdRng::seed_from_u64(seed);
        let max_tries = budget.saturating_mul(self.max_tries_factor);
        let (rewired, outcome) = double_edge_swap(graph, budget, max_tries, &mut rng);
        Sample {
            homophily: homophily_ratio(&rewired, attribute),
            assortativity: assortativity(&rewired, attribute),
            swaps: Some(outcome),
        }
    }

    fn shuffled_sample(graph: &AttributedGraph, attribute: &str, seed: u64) -> Sample {
        let mut rng = StdRng::seed_from_u64(seed);
        let shuffled = shuffle_attribute(graph, attribute, &mut rng);
        Sample {
            homophily: homophily_ratio(&shuffled, attribute),
            assortativity: assortativity(&shuffled, attribute),
            swaps: None,
        }
    }

    fn progress(kind: &str, i: usize, total: usize) {
        if i > 0 && i % 10 == 0 {
            debug!(kind, iteration = i, total, "null model progress");
        }
    }

    /// Build both ensembles and test the observed homophily against them.
    pub fn run(&self, graph: &AttributedGraph, attribute: &str) -> Result<NullModelReport> {
        check_input(graph, attribute)?;
        if self.iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "iterations",
                message: "must be at least 1",
            });
        }

        let observed_homophily = homophily_ratio(graph, attribute);
        let observed_assortativity = assortativity(graph, attribute);

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut master = StdRng::seed_from_u64(seed);
        let rewire_seeds: Vec<u64> = (0..self.iterations).map(|_| master.random()).collect();
        let shuffle_seeds: Vec<u64> = (0..self.iterations).map(|_| master.random()).collect();

        let budget = graph.edge_count().saturating_mul(self.rewiring_factor);
        info!(
            attribute,
            iterations = self.iterations,
            swap_budget = budget,
            seed,
            "running null models"
        );

        #[cfg(feature = "parallel")]
        let (rewired, shuffled): (Vec<Sample>, Vec<Sample>) = {
            let rewired = rewire_seeds
                .par_iter()
                .enumerate()
                .map(|(i, &s)| {
                    Self::progress("rewiring", i, self.iterations);
                    self.rewired_sample(graph, attribute, s, budget)
                })
                .collect();
            let shuffled = shuffle_seeds
                .par_iter()
                .enumerate()
                .map(|(i, &s)| {
                    Self::progress("shuffling", i, self.iterations);
                    Self::shuffled_sample(graph, attribute, s)
                })
                .collect();
            (rewired, shuffled)
        };

        #[cfg(not(feature = "parallel"))]
        let (rewired, shuffled): (Vec<Sample>, Vec<Sample>) = {
            let rewired = rewire_seeds
                .iter()
                .enumerate()
                .map(|(i, &s)| {
                    Self::progress("rewiring", i, self.iterations);
                    self.rewired_sample(graph, attribute, s, budget)
                })
                .collect();
            let shuffled = shuffle_seeds
                .iter()
                .enumerate()
                .map(|(i, &s)| {
                    Self::progress("shuffling", i, self.iterations);
                    Self::shuffled_sample(graph, attribute, s)
                })
                .collect();
            (rewired, shuffled)
        };

        let rewiring_swaps = RewiringDiagnostics {
            swap_budget: budget,
            max_tries: budget.saturating_mul(self.max_tries_factor),
            swaps_performed: rewired
                .iter()
                .map(|s| s.swaps.map_or(0, |o| o.performed))
                .collect(),
        };
        let partial = rewiring_swaps.partial_samples();
        if partial > 0 {
            warn!(
                partial,
                iterations = self.iterations,
                swap_budget = budget,
                "edge-swap budget not reached in some rewiring samples"
            );
        }

        let report = NullModelReport {
            iterations: self.iterations,
            seed,
            observed_homophily,
            observed_assortativity,
            rewiring: EnsembleSummary::from_samples(&rewired, observed_homophily),
            rewiring_swaps,
            shuffling: EnsembleSummary::from_samples(&shuffled, observed_homophily),
        };
        info!(
            rewired_mean = ?report.rewiring.mean_homophily,
            shuffled_mean = ?report.shuffling.mean_homophily,
            rewired_p = ?report.rewiring.p_value(),
            shuffled_p = ?report.shuffling.p_value(),
            "null models finished"
        );
        Ok(report)
    }
}

impl Default for NullModel {
    fn default() -> Self {
        Self::new()
    }
}
