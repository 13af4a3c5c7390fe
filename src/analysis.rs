//! End-to-end analysis of one graph on one attribute.
//!
//! Runs the four components in order (basic statistics, homophily, null
//! models, community detection). They share nothing but the read-only input
//! graph. A component that cannot produce a result is logged and its section
//! left empty; the others still run.

use crate::community;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::graph::AttributedGraph;
use crate::homophily::{self, HomophilyReport};
use crate::null_model::{NullModel, NullModelReport};
use crate::report;
use crate::stats::{self, BasicReport};
use crate::validate::{self, ValidationReport};
use community::CommunityReport;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Every section of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Attribute key analyzed.
    pub attribute: String,
    /// Input checks.
    pub validation: ValidationReport,
    /// Basic statistics.
    pub basic: Option<BasicReport>,
    /// Homophily measures.
    pub homophily: Option<HomophilyReport>,
    /// Null-model comparison.
    pub null_model: Option<NullModelReport>,
    /// Community detection.
    pub community: Option<CommunityReport>,
}

fn section<T>(name: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(section = name, error = %e, "analysis section skipped");
            None
        }
    }
}

/// Analyze `graph` on `attribute`.
pub fn run(graph: &AttributedGraph, attribute: &str, config: &AnalysisConfig) -> AnalysisReport {
    let validation = validate::validate(graph, attribute);
    for issue in &validation.issues {
        warn!(attribute, "{issue}");
    }

    let basic = section("basic", stats::analyze(graph, Some(attribute)));
    let homophily = section("homophily", homophily::analyze(graph, attribute));
    let null_model = section(
        "null_model",
        NullModel::from_config(&config.null_model).run(graph, attribute),
    );
    let community = section(
        "community",
        community::analyze(graph, attribute, &config.community),
    );

    AnalysisReport {
        attribute: attribute.to_string(),
        validation,
        basic,
        homophily,
        null_model,
        community,
    }
}

/// Write `report.json` and `network_analysis.txt` into `dir`.
///
/// Returns the paths written.
pub fn write_outputs(
    report: &AnalysisReport,
    config: &AnalysisConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let json_path = dir.join("report.json");
    fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
    let text_path = dir.join("network_analysis.txt");
    fs::write(&text_path, report::render(report, &config.report))?;
    info!(dir = %dir.display(), "analysis results written");
    Ok(vec![json_path, text_path])
}
