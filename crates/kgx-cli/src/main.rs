//! KGX CLI
//!
//! Inspect a knowledge graph snapshot from the command line: index
//! statistics, neighbors, paths, relevant sets, clusters and ranked paths.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kgx_explorer::{
    ExplorationSession, ExplorerConfig, HeuristicOracle, RankedPathOutcome, SelectionMode, Toggle,
};
use kgx_graph::{GraphIndex, Snapshot};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "kgx")]
#[command(about = "KGX - knowledge graph exploration", long_about = None)]
struct Cli {
    /// Snapshot file (JSON with `nodes` and `relationships`)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Explorer config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show index statistics
    Stats,

    /// List the neighbors of a node
    Neighbors {
        /// Node ID
        id: String,
    },

    /// Shortest path between two nodes
    Path {
        /// Start node ID
        start: String,
        /// End node ID
        end: String,
    },

    /// Bounded candidate paths between two nodes
    Candidates {
        /// Start node ID
        start: String,
        /// End node ID
        end: String,

        /// Maximum edges per path (overrides config)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Relevant node set for filters and expansions
    Relevant {
        /// Context label or insight text (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Expanded node ID (repeatable)
        #[arg(long = "expand")]
        expand: Vec<String>,
    },

    /// Type clusters of the relevant set
    Clusters {
        /// Context label or insight text (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
    },

    /// Rank candidate paths with the built-in heuristic oracle
    Rank {
        /// Start node ID
        start: String,
        /// End node ID
        end: String,
    },
}

fn load_index(path: &Path) -> Result<GraphIndex> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = Snapshot::from_json(&text)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
    Ok(GraphIndex::build(snapshot))
}

fn load_config(path: Option<&Path>) -> Result<ExplorerConfig> {
    match path {
        Some(path) => ExplorerConfig::load(path).context("failed to load config"),
        None => Ok(ExplorerConfig::default()),
    }
}

fn emit(out: &mut impl Write, json: bool, value: &serde_json::Value, text: &str) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        writeln!(out, "{text}")?;
    }
    Ok(())
}

async fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let index = Arc::new(load_index(&cli.snapshot)?);
    tracing::debug!(nodes = index.len(), "snapshot loaded");

    match cli.command {
        Commands::Stats => {
            let stats = index.stats();
            let text = format!(
                "Nodes: {}\nRelationships: {}\nDangling relationships: {}\nDuplicate nodes: {}",
                stats.node_count,
                stats.relationship_count,
                stats.dangling_relationships,
                stats.duplicate_nodes
            );
            emit(out, cli.json, &serde_json::to_value(stats)?, &text)?;
        }
        Commands::Neighbors { id } => {
            let neighbors = index.neighbors(&id);
            let text = neighbors
                .iter()
                .map(|adj| {
                    format!(
                        "{} [{}] {}",
                        adj.neighbor_id,
                        adj.relationship_type,
                        index.label_of(adj.neighbor_id.as_str())
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            emit(out, cli.json, &serde_json::to_value(&neighbors)?, &text)?;
        }
        Commands::Path { start, end } => {
            let session = ExplorationSession::new(index, config);
            let path = session.find_path(&start, &end);
            let text = if path.is_empty() {
                format!("No path between {start} and {end}")
            } else {
                path.to_string()
            };
            emit(out, cli.json, &serde_json::to_value(&path)?, &text)?;
        }
        Commands::Candidates {
            start,
            end,
            max_depth,
        } => {
            let config = match max_depth {
                Some(depth) => config.with_max_path_depth(depth),
                None => config,
            };
            let session = ExplorationSession::new(index, config);
            let found = session.find_candidate_paths(&start, &end);
            let mut lines: Vec<String> = found.paths.iter().map(ToString::to_string).collect();
            lines.push(found.to_string());
            emit(out, cli.json, &serde_json::to_value(&found)?, &lines.join("\n"))?;
        }
        Commands::Relevant { filters, expand } => {
            let session = ExplorationSession::new(index, config);
            for id in &expand {
                if session.toggle_expansion(id) == Toggle::Ignored {
                    tracing::warn!(node_id = %id, "unknown node ignored for expansion");
                }
            }
            let nodes = session.relevant_nodes(&filters);
            let text = nodes
                .iter()
                .map(|n| format!("{} ({}) {}", n.id, n.node_type, n.label))
                .collect::<Vec<_>>()
                .join("\n");
            emit(out, cli.json, &serde_json::to_value(&nodes)?, &text)?;
        }
        Commands::Clusters { filters } => {
            let session = ExplorationSession::new(index, config);
            let clusters = session.clusters(&filters);
            let text = if clusters.is_empty() {
                "No clusters".to_string()
            } else {
                clusters
                    .iter()
                    .map(|c| format!("{}: {}", c.node_type, c.count))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            emit(out, cli.json, &serde_json::to_value(&clusters)?, &text)?;
        }
        Commands::Rank { start, end } => {
            let session =
                ExplorationSession::with_oracle(index, config, Arc::new(HeuristicOracle));
            session.set_selection_mode(SelectionMode::Multi);
            for id in [&start, &end] {
                if session.toggle_multi_select(id)? != Toggle::Added {
                    bail!("cannot select node {id}");
                }
            }
            let outcome = session.request_ranked_path().await?;
            let (value, text) = describe_outcome(&outcome);
            emit(out, cli.json, &value, &text)?;
        }
    }
    Ok(())
}

fn describe_outcome(outcome: &RankedPathOutcome) -> (serde_json::Value, String) {
    match outcome {
        RankedPathOutcome::Ranked {
            path,
            annotation,
            candidates,
        } => (
            json!({
                "outcome": "ranked",
                "path": path,
                "annotation": annotation,
                "considered": candidates.considered,
                "totalFound": candidates.total_found,
            }),
            format!("{path}\n{}\n{candidates}", annotation.rationale),
        ),
        RankedPathOutcome::Fallback {
            path,
            warning,
            candidates,
        } => (
            json!({
                "outcome": "fallback",
                "path": path,
                "warning": warning.to_string(),
                "considered": candidates.considered,
                "totalFound": candidates.total_found,
            }),
            format!("{path}\nwarning: {warning}\n{candidates}"),
        ),
        RankedPathOutcome::NoPath => (
            json!({ "outcome": "noPath" }),
            "No path within depth bound".to_string(),
        ),
        RankedPathOutcome::AlreadyInProgress => (
            json!({ "outcome": "alreadyInProgress" }),
            "Ranking already in progress".to_string(),
        ),
        RankedPathOutcome::TimedOut { warning } => (
            json!({ "outcome": "timedOut", "warning": warning.to_string() }),
            format!("warning: {warning}"),
        ),
        RankedPathOutcome::Superseded => (
            json!({ "outcome": "superseded" }),
            "Ranking superseded".to_string(),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock()).await
}
