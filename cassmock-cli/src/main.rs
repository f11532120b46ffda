use anyhow::{Context, Result};
use cassmock_api::{Cluster, ResultSet, Session};
use cassmock_core::cql::split_statements;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod shell;
mod table;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// Pretty JSON
    Json,
    /// JSON Lines (one row per line)
    Jsonl,
}

#[derive(Parser)]
#[command(name = "cassmock")]
#[command(about = "In-memory CQL session backed by SQLite", long_about = None)]
struct Cli {
    /// Keyspace to start in
    #[arg(short, long, global = true)]
    keyspace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute statements in one session
    Exec {
        /// CQL statements, run in order
        #[arg(required = true)]
        statements: Vec<String>,
        /// Output format (table, json, jsonl)
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
    /// Execute a `;`-separated CQL script
    Script {
        /// Script file path
        path: PathBuf,
        /// Output format (table, json, jsonl)
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
    /// Start interactive shell
    Shell,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = Cluster::new()
        .connect(cli.keyspace.as_deref())
        .context("Failed to open session")?;

    match cli.command {
        Commands::Exec { statements, output } => {
            run_statements(&session, &statements, output)?;
        }

        Commands::Script { path, output } => {
            let script = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            let statements = split_statements(&script);
            tracing::info!(path = %path.display(), statements = statements.len(), "running script");
            run_statements(&session, &statements, output)?;
        }

        Commands::Shell => {
            let mut shell = shell::Shell::new(session)?;
            shell.run()?;
        }
    }

    Ok(())
}

/// Execute statements in order, stopping at the first failure
fn run_statements(session: &Session, statements: &[String], output: OutputFormat) -> Result<()> {
    for (index, statement) in statements.iter().enumerate() {
        tracing::debug!(index, statement = %statement, "executing");
        let rows = session
            .execute(statement.as_str())
            .with_context(|| format!("Failed to execute: {}", statement))?;
        print_rows(&rows, output)?;
    }
    Ok(())
}

/// Print a result set; statements without rows print nothing in JSON modes
pub fn print_rows(rows: &ResultSet, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => {
            if rows.column_names().is_empty() {
                println!("OK");
            } else {
                println!("{}", table::format_rows_table(rows));
            }
        }
        OutputFormat::Json => {
            if !rows.column_names().is_empty() {
                println!("{}", serde_json::to_string_pretty(&table::rows_to_json(rows))?);
            }
        }
        OutputFormat::Jsonl => {
            for row in rows {
                println!("{}", serde_json::to_string(&table::row_to_json(row))?);
            }
        }
    }
    Ok(())
}
