//! oxide-odata CLI
//!
//! Compiles an OData-style query string into SQL and prints the statement and
//! its parameters as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_odata::{CompileOptions, PlaceholderStyle, QueryCompiler, QueryInput, Schema};

/// Compile OData-style query strings into parameterized SQL.
#[derive(Debug, Parser)]
#[command(name = "oxide-odata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Query string, e.g. "$select=name&$filter=age gt 18".
    query: String,

    /// Treat the query argument as a request URL and compile its query part.
    #[arg(long)]
    url: bool,

    /// Primary table.
    #[arg(short, long)]
    table: Option<String>,

    /// Alias of the primary table.
    #[arg(short, long)]
    alias: Option<String>,

    /// JSON schema file.
    #[arg(short, long, env = "OXIDE_ODATA_SCHEMA")]
    schema: Option<PathBuf>,

    /// Placeholder style (mysql or postgres).
    #[arg(short, long)]
    placeholder_style: Option<PlaceholderStyle>,

    /// JSON file with full compile options. Other flags override it.
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Builds the compile options: the options file first, then the flags.
fn load_options(cli: &Cli) -> anyhow::Result<CompileOptions> {
    let mut options = match &cli.options {
        Some(path) => read_json(path)?,
        None => CompileOptions::default(),
    };
    if let Some(table) = &cli.table {
        options.table.clone_from(table);
    }
    if let Some(alias) = &cli.alias {
        options.alias = Some(alias.clone());
    }
    if let Some(path) = &cli.schema {
        options.schema = read_json::<Schema>(path)?;
    }
    if let Some(style) = cli.placeholder_style {
        options.placeholder_style = style;
    }
    Ok(options)
}

/// Compiles the query and renders the JSON output.
fn run(cli: &Cli) -> anyhow::Result<String> {
    let options = load_options(cli)?;
    debug!(table = %options.table, tables = options.schema.tables().count(), "loaded options");

    let input = if cli.url {
        QueryInput::Url(cli.query.clone())
    } else {
        QueryInput::from(cli.query.as_str())
    };
    let query = QueryCompiler::new(&options).compile(&input)?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&query)?
    } else {
        serde_json::to_string(&query)?
    };
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("{}", run(&cli)?);
    Ok(())
}
