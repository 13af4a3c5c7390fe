//! Pre-analysis checks on an input graph.
//!
//! Detects the input problems that make analysis meaningless or partial:
//! - Empty graph
//! - Graph without edges
//! - Nodes missing the analyzed attribute
//!
//! ```rust,ignore
//! let report = assort::validate::validate(&graph, "main_genre");
//! if !report.is_healthy() {
//!     eprintln!("{report}");
//! }
//! ```

use crate::graph::AttributedGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Something unusual, analysis still proceeds.
    Warning,
    /// Analysis cannot produce results.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single issue found in the input graph.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Issues found by [`validate`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
    /// Nodes lacking the attribute (by name, in node order).
    pub missing_attribute: Vec<String>,
}

impl ValidationReport {
    fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            message: message.into(),
        });
    }

    /// True when no error-level issue was found.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// True when no issue at all was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }
        let counts = self.counts();
        let parts: Vec<String> = [(Severity::Error, "errors"), (Severity::Warning, "warnings")]
            .iter()
            .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{c} {name}")))
            .collect();
        writeln!(f, "Validation report: {}", parts.join(", "))?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Check that `graph` can be analyzed on `attribute`.
pub fn validate(graph: &AttributedGraph, attribute: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    if graph.is_empty() {
        report.push(Severity::Error, "graph has no nodes");
        return report;
    }
    if graph.edge_count() == 0 {
        report.push(Severity::Warning, "graph has no edges");
    }

    report.missing_attribute = graph
        .node_indices()
        .filter(|&n| graph.attribute(n, attribute).is_none())
        .map(|n| graph.name(n).to_string())
        .collect();

    let missing = report.missing_attribute.len();
    if missing == graph.node_count() {
        report.push(
            Severity::Error,
            format!("no node carries the '{attribute}' attribute"),
        );
    } else if missing > 0 {
        report.push(
            Severity::Warning,
            format!("{missing} nodes are missing the '{attribute}' attribute"),
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_is_unhealthy() {
        let report = validate(&AttributedGraph::new(), "main_genre");
        assert!(!report.is_healthy());
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_partial_attribute_is_warning() {
        let mut g = AttributedGraph::new();
        let a = g.add_node("a");
        g.add_node("b");
        g.add_edge("a", "b").unwrap();
        g.set_attribute(a, "main_genre", "rock");

        let report = validate(&g, "main_genre");
        assert!(report.is_healthy());
        assert!(!report.is_clean());
        assert_eq!(report.missing_attribute, vec!["b".to_string()]);
        assert_eq!(report.counts().get(&Severity::Warning), Some(&1));
    }

    #[test]
    fn test_attribute_absent_everywhere_is_error() {
        let mut g = AttributedGraph::new();
        g.add_node("a");
        let report = validate(&g, "major_label");
        assert!(!report.is_healthy());
        // No edges plus missing attribute.
        assert_eq!(report.issues.len(), 2);
        assert!(report.to_string().contains("major_label"));
    }
}
