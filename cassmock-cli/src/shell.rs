/// Interactive CQL shell
///
/// Line editing, history, keyword completion and dot-commands on top of a
/// single in-memory session.

use crate::OutputFormat;
use anyhow::{Context, Result};
use cassmock_api::Session;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{
    completion::{Completer, Pair},
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Helper,
};
use std::path::PathBuf;

const HISTORY_FILE: &str = ".cassmock_history";

const META_COMMANDS: &[&str] = &[
    ".help", ".exit", ".quit", ".tables", ".schema", ".format", ".timer", ".clear",
];

const CQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "INSERT", "INTO", "VALUES", "CREATE", "TABLE", "INDEX",
    "ON", "PRIMARY", "KEY", "IF", "NOT", "EXISTS", "UPDATE", "SET", "DELETE", "TRUNCATE",
    "DROP", "USE", "KEYSPACE", "LIMIT", "ORDER", "BY", "ALLOW", "FILTERING", "IN", "CONTAINS",
];

/// Completion for dot-commands and CQL keywords
#[derive(Clone, Default)]
struct CqlCompleter;

impl CqlCompleter {
    fn candidates(words: &[&str], prefix: &str) -> Vec<Pair> {
        let upper = prefix.to_uppercase();
        words
            .iter()
            .filter(|w| w.to_uppercase().starts_with(&upper))
            .map(|w| Pair {
                display: w.to_string(),
                replacement: w.to_string(),
            })
            .collect()
    }
}

impl Completer for CqlCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_prefix = &line[..pos];

        if line_prefix.starts_with('.') {
            return Ok((0, Self::candidates(META_COMMANDS, line_prefix)));
        }

        let word_start = line_prefix
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map_or(0, |i| i + 1);
        Ok((word_start, Self::candidates(CQL_KEYWORDS, &line_prefix[word_start..])))
    }
}

impl Hinter for CqlCompleter {
    type Hint = String;
}

impl Highlighter for CqlCompleter {}

impl Validator for CqlCompleter {}

impl Helper for CqlCompleter {}

/// Interactive shell state
pub struct Shell {
    session: Session,
    editor: rustyline::Editor<CqlCompleter, rustyline::history::FileHistory>,
    format: OutputFormat,
    show_timing: bool,
}

impl Shell {
    pub fn new(session: Session) -> Result<Self> {
        let mut editor = rustyline::Editor::new().context("Failed to initialize line editor")?;
        editor.set_helper(Some(CqlCompleter));

        let history_path = history_path();
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            session,
            editor,
            format: OutputFormat::Table,
            show_timing: true,
        })
    }

    /// Run the REPL until `.exit` or Ctrl+D
    pub fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut buffer = String::new();

        loop {
            let prompt = if !buffer.is_empty() {
                format!("{}    ", "...>".dimmed())
            } else {
                match self.session.keyspace() {
                    Some(ks) => format!("{} ", format!("cqlsh:{}>", ks).green().bold()),
                    None => format!("{} ", "cqlsh>".green().bold()),
                }
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() && buffer.is_empty() {
                        continue;
                    }
                    if buffer.is_empty() && (line == ".exit" || line == ".quit") {
                        break;
                    }

                    if !buffer.is_empty() {
                        buffer.push(' ');
                    }
                    buffer.push_str(line);

                    // dot-commands are single line; CQL ends with ';'
                    let complete = buffer.starts_with('.') || buffer.trim_end().ends_with(';');
                    if complete {
                        let input = std::mem::take(&mut buffer);
                        let _ = self.editor.add_history_entry(input.as_str());
                        if let Err(e) = self.execute(input.trim()) {
                            tracing::debug!(error = ?e, input = %input.trim(), "shell command failed");
                            eprintln!("{} {:#}", "Error:".red().bold(), e);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "readline failed, leaving shell");
                    eprintln!("Error reading line: {}", err);
                    break;
                }
            }
        }

        println!();
        self.save_history()
    }

    fn execute(&mut self, input: &str) -> Result<()> {
        if input.starts_with('.') {
            self.execute_meta_command(input)
        } else {
            self.execute_query(input)
        }
    }

    fn execute_meta_command(&mut self, command: &str) -> Result<()> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            ".help" => self.show_help(),
            ".tables" => self.show_tables(),
            ".schema" => self.show_schema(parts.get(1).copied())?,
            ".format" => match parts.get(1) {
                Some(format) => self.set_format(format),
                None => {
                    println!("Usage: .format <table|json>");
                    println!("Current format: {:?}", self.format);
                }
            },
            ".timer" => match parts.get(1) {
                Some(value) => self.set_timer(value),
                None => {
                    println!("Usage: .timer <on|off>");
                    println!("Current: {}", if self.show_timing { "on" } else { "off" });
                }
            },
            ".clear" => print!("\x1B[2J\x1B[1;1H"),
            ".exit" | ".quit" => {}
            _ => {
                println!("{} {}", "Unknown command:".yellow(), cmd);
                println!("Type .help for available commands");
            }
        }
        Ok(())
    }

    fn execute_query(&mut self, cql: &str) -> Result<()> {
        let start = std::time::Instant::now();
        let rows = self.session.execute(cql).context("Query execution failed")?;
        let elapsed = start.elapsed();

        crate::print_rows(&rows, self.format)?;

        if self.show_timing {
            let count = rows.len();
            println!(
                "\n{} ({:.2}ms)",
                format!("{} row{}", count, if count == 1 { "" } else { "s" }).dimmed(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        Ok(())
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold());
        println!("\n  {}", "Meta-commands:".cyan());
        println!("    .help              Show this help message");
        println!("    .exit, .quit       Exit the shell");
        println!("    .tables            List registered tables");
        println!("    .schema [table]    Show key structure of tables");
        println!("    .format <type>     Set output format (table|json)");
        println!("    .timer <on|off>    Toggle query timing display");
        println!("    .clear             Clear the screen");

        println!("\n  {}", "CQL:".cyan());
        println!("    CREATE TABLE users (id uuid, name text, PRIMARY KEY (id));");
        println!("    INSERT INTO users (id, name) VALUES ('u1', 'Alice');");
        println!("    SELECT * FROM users WHERE id = 'u1';");
        println!("\n  Statements continue across lines until a terminating ';'.");
        println!();
    }

    fn show_tables(&self) {
        let tables = self.session.tables();
        if tables.is_empty() {
            println!("No tables");
        }
        for table in tables {
            println!("  {}", table);
        }
    }

    fn show_schema(&self, table: Option<&str>) -> Result<()> {
        let names = match table {
            Some(table) => vec![table.to_string()],
            None => self.session.tables(),
        };

        for name in names {
            let schema = self.session.schema(&name)?;
            println!("\n{}", schema.name.bold());
            for column in &schema.columns {
                println!("  {:<24} {}", column.name, column.cql_type);
            }
            println!("  {}: {}", "Partition key".cyan(), schema.partition_keys.join(", "));
            if let Some(ck) = &schema.clustering_key {
                println!("  {}: {}", "Clustering key".cyan(), ck);
            }
            if let Some(idx) = &schema.secondary_index {
                println!("  {}: {}", "Secondary index".cyan(), idx);
            }
        }
        println!();
        Ok(())
    }

    fn set_format(&mut self, format: &str) {
        self.format = match format.to_lowercase().as_str() {
            "table" => OutputFormat::Table,
            "json" => OutputFormat::Json,
            _ => {
                println!("{} {}. Use: table or json", "Invalid format:".red(), format);
                return;
            }
        };
        println!("Output format set to: {:?}", self.format);
    }

    fn set_timer(&mut self, value: &str) {
        self.show_timing = match value.to_lowercase().as_str() {
            "on" | "true" | "1" => true,
            "off" | "false" | "0" => false,
            _ => {
                println!("{} {}. Use: on or off", "Invalid value:".red(), value);
                return;
            }
        };
        println!("Timer {}", if self.show_timing { "enabled" } else { "disabled" });
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "cassmock interactive shell".cyan().bold());
        println!(
            "  {} In-memory session; data is discarded on exit. Type {} for commands.",
            "Note:".yellow().bold(),
            ".help".bold()
        );
        println!();
    }

    fn save_history(&mut self) -> Result<()> {
        self.editor
            .save_history(&history_path())
            .context("Failed to save command history")
    }
}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(HISTORY_FILE))
        .unwrap_or_else(|| HISTORY_FILE.into())
}
