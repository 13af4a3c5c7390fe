use anyhow::{bail, Context, Result};
use assort::io::{self, RecordSource};
use assort::{analysis, validate, AnalysisConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

const DEFAULT_ATTRIBUTES: [&str; 2] = ["main_genre", "major_label"];
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "assort", version, about = "Homophily analysis of collaboration graphs")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every analysis section and write report.json and network_analysis.txt.
    Analyze {
        /// Node-link JSON graph.
        graph: PathBuf,
        /// Node attribute to analyze; repeat for several. Without it, every
        /// default attribute (main_genre, major_label) the graph carries.
        #[arg(short, long)]
        attribute: Vec<String>,
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory [default: analysis_results/<attribute>]. With
        /// several attributes, one subdirectory per attribute.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Samples per null model.
        #[arg(long)]
        iterations: Option<usize>,
        /// Master seed for the null models.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Build a node-link graph from collaboration records.
    Build {
        /// JSON document with a `data` array of records.
        records: PathBuf,
        /// Attribute key written on nodes [default: main_genre].
        #[arg(short, long)]
        attribute: Option<String>,
        /// Record field the attribute is read from [default: artist_genre].
        #[arg(short, long)]
        field: Option<String>,
        /// Value used when the field is missing or empty [default: Unknown].
        #[arg(short, long)]
        default: Option<String>,
        /// Use the record-label preset (major_labels -> major_label, Independent).
        #[arg(long)]
        labels: bool,
        /// Output graph path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Check that a graph can be analyzed on an attribute.
    Validate {
        graph: PathBuf,
        #[arg(short, long)]
        attribute: String,
    },
}

/// Where one attribute's results go.
fn output_dir(out: Option<&Path>, attribute: &str, several: bool) -> PathBuf {
    match out {
        Some(dir) if several => dir.join(attribute),
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("analysis_results").join(attribute),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            graph,
            attribute,
            config,
            out,
            iterations,
            seed,
        } => {
            let mut config = AnalysisConfig::load(config.as_deref())
                .context("failed to load configuration")?;
            if let Some(n) = iterations {
                config.null_model.iterations = n;
            }
            if seed.is_some() {
                config.null_model.seed = seed;
            }
            let g = io::read_graph(&graph)
                .with_context(|| format!("failed to read graph {}", graph.display()))?;
            info!(
                nodes = g.node_count(),
                edges = g.edge_count(),
                "graph loaded"
            );

            let explicit = !attribute.is_empty();
            let attributes: Vec<String> = if explicit {
                attribute
            } else {
                DEFAULT_ATTRIBUTES.iter().map(|a| a.to_string()).collect()
            };
            let several = attributes.len() > 1;
            let mut analyzed = 0usize;
            for attribute in &attributes {
                let validation = validate(&g, attribute);
                if !validation.is_healthy() {
                    if explicit {
                        bail!("graph cannot be analyzed on `{attribute}`:\n{validation}");
                    }
                    warn!(attribute = %attribute, "attribute not usable, skipped");
                    continue;
                }
                let report = analysis::run(&g, attribute, &config);
                let dir = output_dir(out.as_deref(), attribute, several);
                let written = analysis::write_outputs(&report, &config, &dir)
                    .with_context(|| format!("failed to write results to {}", dir.display()))?;
                for path in written {
                    println!("{}", path.display());
                }
                analyzed += 1;
            }
            if analyzed == 0 {
                bail!(
                    "graph carries none of the default attributes: {}",
                    DEFAULT_ATTRIBUTES.join(", ")
                );
            }
        }
        Command::Build {
            records,
            attribute,
            field,
            default,
            labels,
            output,
        } => {
            let mut source = if labels {
                RecordSource::label()
            } else {
                RecordSource::genre()
            };
            if let Some(a) = attribute {
                source.attribute = a;
            }
            if let Some(f) = field {
                source.field = f;
            }
            if let Some(d) = default {
                source.default_value = d;
            }
            let (graph, summary) = io::read_records(&records, &source)
                .with_context(|| format!("failed to read records {}", records.display()))?;
            io::write_graph(&graph, &output)
                .with_context(|| format!("failed to write graph {}", output.display()))?;
            println!(
                "{} nodes, {} edges, {} records skipped, {} artists excluded",
                summary.nodes,
                summary.edges,
                summary.skipped_records,
                summary.ambiguous_artists.len()
            );
        }
        Command::Validate { graph, attribute } => {
            let g = io::read_graph(&graph)
                .with_context(|| format!("failed to read graph {}", graph.display()))?;
            let report = validate(&g, &attribute);
            println!("{report}");
            if !report.is_healthy() {
                bail!("validation failed");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_attributes(args: &[&str]) -> Vec<String> {
        match Cli::try_parse_from(args).unwrap().command {
            Command::Analyze { attribute, .. } => attribute,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_attribute_flag_repeats() {
        let attrs = analyze_attributes(&[
            "assort", "analyze", "g.json", "-a", "main_genre", "--attribute", "major_label",
        ]);
        assert_eq!(attrs, ["main_genre", "major_label"]);
        assert!(analyze_attributes(&["assort", "analyze", "g.json"]).is_empty());
    }

    #[test]
    fn test_output_dir_per_attribute() {
        assert_eq!(
            output_dir(None, "main_genre", true),
            PathBuf::from("analysis_results/main_genre")
        );
        assert_eq!(
            output_dir(Some(Path::new("out")), "major_label", true),
            PathBuf::from("out/major_label")
        );
        assert_eq!(
            output_dir(Some(Path::new("out")), "major_label", false),
            PathBuf::from("out")
        );
    }
}
