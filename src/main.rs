//! Stagegraph CLI - inspect and edit grading pipeline snapshots

use std::path::Path;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use stagegraph::dag::{check_connection, overlapping_stages};
use stagegraph::error::{FixSuggestion, Result, StageGraphError};
use stagegraph::{Connection, EdgeId, PipelineEditor, PipelineSnapshot, StageGraphConfig};

#[derive(Parser)]
#[command(name = "stagegraph")]
#[command(about = "Stagegraph - stage dependency graphs for grading pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pipeline snapshot
    Validate {
        /// Path to the snapshot (.yaml or .json)
        file: String,
    },

    /// Print stages in execution order
    Order {
        /// Path to the snapshot
        file: String,
    },

    /// Compute auto-layout positions
    Layout {
        /// Path to the snapshot
        file: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Check whether two stages can be connected (source runs first)
    Connect {
        /// Path to the snapshot
        file: String,
        source: String,
        target: String,
    },

    /// Remove an edge given as `source->target`
    Disconnect {
        /// Path to the snapshot
        file: String,
        edge: String,
    },

    /// Delete a stage and its edges, print the resulting snapshot
    Delete {
        /// Path to the snapshot
        file: String,
        stage: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() {
    // Warnings only unless RUST_LOG says otherwise; logs go to stderr so
    // stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => validate_snapshot(&file),
        Commands::Order { file } => print_order(&file),
        Commands::Layout { file, format } => print_layout(&file, format),
        Commands::Connect {
            file,
            source,
            target,
        } => connect_stages(&file, source, target),
        Commands::Disconnect { file, edge } => disconnect_edge(&file, &edge),
        Commands::Delete { file, stage } => delete_stage(&file, &stage),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_editor(file: &str) -> Result<PipelineEditor> {
    PipelineSnapshot::load(Path::new(file))?.into_editor()
}

fn print_snapshot(editor: &PipelineEditor) -> Result<()> {
    print!("{}", editor.to_snapshot().to_yaml()?);
    Ok(())
}

fn validate_snapshot(file: &str) -> Result<()> {
    // Loading already validates the whole graph
    let editor = load_editor(file)?;

    let graph = editor.graph();
    println!("{} Pipeline is valid", "✓".green());
    println!(
        "  {} stages, {} connections",
        graph.len().to_string().cyan(),
        graph.edges().len().to_string().cyan()
    );
    Ok(())
}

fn print_order(file: &str) -> Result<()> {
    let editor = load_editor(file)?;
    for (index, stage) in editor.execution_order()?.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            index + 1,
            stage.id.bold(),
            format!("({})", stage.display_name()).dimmed()
        );
    }
    Ok(())
}

fn print_layout(file: &str, format: OutputFormat) -> Result<()> {
    let editor = load_editor(file)?;
    let config = StageGraphConfig::load()?.with_env();
    let layout = editor.format_layout(config.layout_config());

    let overlaps = overlapping_stages(&layout);
    if !overlaps.is_empty() {
        tracing::warn!(stages = ?overlaps, "layout placed stages on top of each other");
    }

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&layout).map_err(|e| {
            StageGraphError::SerializeError {
                details: e.to_string(),
            }
        })?,
        OutputFormat::Yaml => {
            serde_yaml::to_string(&layout).map_err(|e| StageGraphError::SerializeError {
                details: e.to_string(),
            })?
        }
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn connect_stages(file: &str, source: String, target: String) -> Result<()> {
    let mut editor = load_editor(file)?;
    for id in [&source, &target] {
        if editor.stage(id).is_none() {
            return Err(StageGraphError::UnknownStage { id: id.clone() });
        }
    }

    let connection = Connection::new(source.as_str(), target.as_str());
    if let Err(reason) = check_connection(&connection, editor.graph()) {
        println!("{} {}", "✗ Rejected:".red().bold(), reason);
        return Ok(());
    }

    editor.connect(&connection);
    tracing::info!(source = %source, target = %target, "connection accepted");
    println!(
        "{} {} {} {}",
        "✓ Accepted:".green().bold(),
        source.cyan(),
        "→".dimmed(),
        target.cyan()
    );
    print_snapshot(&editor)
}

fn disconnect_edge(file: &str, edge: &str) -> Result<()> {
    let edge: EdgeId = edge.parse()?;
    let mut editor = load_editor(file)?;

    if !editor.disconnect(&edge) {
        println!("{} no edge {}", "→".cyan(), edge.to_string().bold());
        return Ok(());
    }
    print_snapshot(&editor)
}

fn delete_stage(file: &str, stage: &str) -> Result<()> {
    let mut editor = load_editor(file)?;
    if editor.delete_stage(stage).is_none() {
        return Err(StageGraphError::UnknownStage {
            id: stage.to_string(),
        });
    }
    print_snapshot(&editor)
}
