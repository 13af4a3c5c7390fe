//! Plain-text rendering of an [`AnalysisReport`].
//!
//! Undefined values print as `unavailable`. Omitted sections print a one-line
//! notice instead of their body.

use crate::analysis::AnalysisReport;
use crate::community::CommunityReport;
use crate::config::ReportConfig;
use crate::homophily::{HomophilyReport, MixingMatrix};
use crate::null_model::{EnsembleSummary, NullModelReport};
use crate::stats::BasicReport;
use std::fmt::{self, Write};

/// Render the full text report.
pub fn render(report: &AnalysisReport, config: &ReportConfig) -> String {
    TextReport { report, config }.to_string()
}

struct TextReport<'a> {
    report: &'a AnalysisReport,
    config: &'a ReportConfig,
}

fn opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "unavailable".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "NETWORK ANALYSIS REPORT")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f)?;
        writeln!(f, "Attribute: {}", r.attribute)?;
        if !r.validation.is_clean() {
            write!(f, "{}", r.validation)?;
        }
        writeln!(f)?;

        match &r.basic {
            Some(basic) => write_basic(f, basic, &r.attribute, self.config)?,
            None => writeln!(f, "Basic statistics unavailable.\n")?,
        }
        match &r.homophily {
            Some(h) => write_homophily(f, h, &r.attribute)?,
            None => writeln!(f, "--- Homophily Analysis ---\nunavailable\n")?,
        }
        match &r.null_model {
            Some(n) => write_null_model(f, n)?,
            None => writeln!(f, "--- Null Model Analysis ---\nunavailable\n")?,
        }
        match &r.community {
            Some(c) => write_community(f, c, self.config)?,
            None => writeln!(f, "--- Community Detection ---\nunavailable")?,
        }
        Ok(())
    }
}

fn write_basic(
    f: &mut impl Write,
    b: &BasicReport,
    attribute: &str,
    config: &ReportConfig,
) -> fmt::Result {
    writeln!(f, "Basic Information:")?;
    writeln!(f, "- Nodes: {}", b.nodes)?;
    writeln!(f, "- Edges: {}", b.edges)?;
    writeln!(f, "- Density: {:.6}", b.density)?;
    writeln!(f, "- Average Clustering Coefficient: {:.4}", b.average_clustering)?;
    writeln!(f)?;

    writeln!(f, "Degree Statistics:")?;
    writeln!(f, "- Average Degree: {:.2}", b.degree.mean)?;
    writeln!(f, "- Median Degree: {:.2}", b.degree.median)?;
    writeln!(f, "- Std Dev Degree: {:.2}", b.degree.std_dev)?;
    writeln!(f, "- Min Degree: {}", b.degree.min)?;
    writeln!(f, "- Max Degree: {}", b.degree.max)?;
    writeln!(f)?;

    writeln!(f, "Component Analysis:")?;
    writeln!(f, "- Connected Components: {}", b.components.count)?;
    writeln!(f, "- Largest Component Size: {}", b.components.largest_size)?;
    writeln!(
        f,
        "- Largest Component Ratio: {:.2}%",
        b.components.largest_fraction * 100.0
    )?;
    writeln!(f)?;

    writeln!(f, "Path Metrics ({}):", b.paths.scope.label())?;
    writeln!(f, "- Average Path Length: {:.4}", b.paths.average_path_length)?;
    writeln!(f, "- Diameter: {}", b.paths.diameter)?;
    writeln!(f)?;

    if let Some(table) = &b.attribute_counts {
        writeln!(f, "{} Distribution:", capitalize(attribute))?;
        for row in table.iter().take(config.top_values) {
            writeln!(f, "- {}: {} ({:.2}%)", row.value, row.count, row.percentage)?;
        }
        if table.len() > config.top_values {
            writeln!(f, "- ... {} more", table.len() - config.top_values)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn write_matrix(f: &mut impl Write, m: &MixingMatrix) -> fmt::Result {
    let width = m
        .values
        .iter()
        .map(String::len)
        .chain(m.counts.iter().flatten().map(|c| c.to_string().len()))
        .max()
        .unwrap_or(1);
    write!(f, "{:width$}", "")?;
    for v in &m.values {
        write!(f, " {v:>width$}")?;
    }
    writeln!(f)?;
    for (v, row) in m.values.iter().zip(&m.counts) {
        write!(f, "{v:width$}")?;
        for c in row {
            write!(f, " {c:>width$}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn write_homophily(f: &mut impl Write, h: &HomophilyReport, attribute: &str) -> fmt::Result {
    writeln!(f, "--- Homophily Analysis ---")?;
    writeln!(f, "Homophily Ratio: {:.4}", h.homophily_ratio)?;
    writeln!(
        f,
        "Average Blau's Heterogeneity Index: {}",
        opt(h.average_blau, 4)
    )?;
    writeln!(f)?;
    writeln!(f, "Mixing Matrix:")?;
    write_matrix(f, &h.mixing_matrix)?;
    writeln!(f)?;

    writeln!(f, "E-I Index by {}:", capitalize(attribute))?;
    let mut ei: Vec<(&String, &f64)> = h.ei_indices.iter().collect();
    ei.sort_by(|a, b| a.1.total_cmp(b.1));
    for (value, index) in ei {
        writeln!(f, "  {value}: {index:.4}")?;
    }
    writeln!(f)?;
    writeln!(
        f,
        "Attribute Assortativity Coefficient: {}",
        opt(h.assortativity, 4)
    )?;
    writeln!(f)
}

fn write_ensemble(f: &mut impl Write, name: &str, e: &EnsembleSummary) -> fmt::Result {
    writeln!(f, "{name} - Avg homophily: {}", opt(e.mean_homophily, 4))?;
    writeln!(f, "{name} - Avg assortativity: {}", opt(e.mean_assortativity, 4))
}

fn write_null_model(f: &mut impl Write, n: &NullModelReport) -> fmt::Result {
    writeln!(f, "--- Null Model Analysis ---")?;
    writeln!(f, "Samples per model: {} (seed {})", n.iterations, n.seed)?;
    writeln!(f, "Original homophily ratio: {:.4}", n.observed_homophily)?;
    writeln!(
        f,
        "Original assortativity coefficient: {}",
        opt(n.observed_assortativity, 4)
    )?;
    write_ensemble(f, "Rewiring Model", &n.rewiring)?;
    let partial = n.rewiring_swaps.partial_samples();
    if partial > 0 {
        writeln!(
            f,
            "  {partial} of {} rewired graphs stopped short of {} swaps",
            n.iterations, n.rewiring_swaps.swap_budget
        )?;
    }
    write_ensemble(f, "Attribute Shuffling", &n.shuffling)?;
    writeln!(f)?;
    writeln!(f, "Statistical significance (p-values):")?;
    writeln!(f, "Rewiring Model: {}", opt(n.rewiring.p_value(), 6))?;
    writeln!(f, "Attribute Shuffling: {}", opt(n.shuffling.p_value(), 6))?;
    writeln!(f)
}

fn write_community(f: &mut impl Write, c: &CommunityReport, config: &ReportConfig) -> fmt::Result {
    writeln!(f, "--- Community Detection ---")?;
    if c.reduced_to_largest_component {
        writeln!(f, "Using largest connected component with {} nodes", c.nodes)?;
    } else {
        writeln!(f, "Using full graph (connected)")?;
    }
    writeln!(
        f,
        "Number of attribute-based communities: {}",
        c.attribute_communities
    )?;
    writeln!(
        f,
        "Number of Louvain-detected communities: {}",
        c.detected_communities
    )?;
    writeln!(f, "Nodes compared: {}", c.compared_nodes)?;
    writeln!(f, "Normalized Mutual Information (NMI): {}", opt(c.nmi, 4))?;
    writeln!(f, "Adjusted Rand Index (ARI): {}", opt(c.ari, 4))?;
    writeln!(
        f,
        "Modularity of attribute-based partition: {:.4}",
        c.attribute_modularity
    )?;
    writeln!(f, "Modularity of Louvain partition: {:.4}", c.detected_modularity)?;
    writeln!(f)?;

    writeln!(f, "Community composition (largest first):")?;
    for comm in c.composition.iter().take(config.top_values) {
        let shares: Vec<String> = comm
            .values
            .iter()
            .map(|s| format!("{} {:.1}%", s.value, s.percentage))
            .collect();
        writeln!(
            f,
            "  Comm {} (n={}): {}",
            comm.community,
            comm.size,
            shares.join(", ")
        )?;
    }
    Ok(())
}
