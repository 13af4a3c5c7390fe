//! # assort
//!
//! Homophily analysis of attributed collaboration graphs: do artists who
//! share a genre (or a record label) collaborate with each other more than
//! chance would predict?
//!
//! One analysis run over an [`AttributedGraph`] and one attribute key
//! produces four independent sections:
//!
//! - [`stats`]: size, density, clustering, degrees, components, path lengths;
//! - [`homophily`]: homophily ratio, Blau heterogeneity, mixing matrix,
//!   E-I indices, attribute assortativity;
//! - [`null_model`]: degree-preserving rewiring and attribute shuffling
//!   ensembles with one-sample t-tests;
//! - [`community`]: Louvain communities compared to the attribute partition
//!   with [`nmi`] and [`ari`].
//!
//! [`analysis::run`] drives all four; [`report::render`] formats the result.
//!
//! **Default build** runs null-model samples on rayon. Disable the `parallel`
//! feature for a single-threaded build with identical results.

pub mod analysis;
pub mod community;
pub mod config;
/// Error types used across `assort`.
pub mod error;
pub mod graph;
pub mod homophily;
pub mod io;
pub mod metrics;
pub mod null_model;
pub mod report;
pub mod significance;
pub mod stats;
pub mod validate;


pub use analysis::{AnalysisReport, run};
pub use community::{CommunityDetection, CommunityReport, Louvain};
pub use config::{AnalysisConfig, CommunityConfig, NullModelConfig, ReportConfig};
pub use error::{Error, Result};
pub use graph::{Artist, AttributedGraph};
pub use homophily::HomophilyReport;
pub use metrics::{ari, nmi};
pub use null_model::{NullModel, NullModelReport};
pub use stats::BasicReport;
pub use validate::{validate, ValidationReport};
