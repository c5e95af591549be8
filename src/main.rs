use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use schemagraph::config::{Config, LoggingConfig};

mod cli;

#[derive(Parser)]
#[command(name = "schemagraph")]
#[command(author = "Intent Project Team")]
#[command(version)]
#[command(about = "Index a multi-file GraphQL schema project and serve it over MCP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project and summarize the index
    Scan {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Entry schema file, relative to the project
        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Find where a type or root operation field is declared
    Definition {
        /// Symbol name (exact, case-sensitive)
        name: String,

        /// Case-insensitive substring search instead of an exact lookup
        #[arg(short, long)]
        search: bool,

        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List operations and fragments of the executable documents
    Operations {
        /// Print only this operation, with its source text
        name: Option<String>,

        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List persisted documents by content-addressed id
    Persisted {
        /// Print a document id -> document text manifest
        #[arg(short, long)]
        manifest: bool,

        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the fields of one type, or of every type
    Fields {
        /// Type name
        type_name: Option<String>,

        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show type relationships
    Graph {
        /// Restrict to edges touching this type
        type_name: Option<String>,

        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json, mermaid
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show index statistics
    Stats {
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Start the MCP server on stdio
    Serve {
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,

        /// Disable file watching
        #[arg(long)]
        no_watch: bool,
    },

    /// Rescan whenever a schema or operation file changes
    Watch {
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(short, long)]
        entry: Option<String>,
    },
}

impl Commands {
    fn project(&self) -> &str {
        match self {
            Commands::Scan { project, .. }
            | Commands::Definition { project, .. }
            | Commands::Operations { project, .. }
            | Commands::Persisted { project, .. }
            | Commands::Fields { project, .. }
            | Commands::Graph { project, .. }
            | Commands::Stats { project, .. }
            | Commands::Serve { project, .. }
            | Commands::Watch { project, .. } => project,
        }
    }
}

/// Logs go to stderr; stdout carries command output and MCP responses
fn init_logging(debug: bool, verbose: bool, config: &LoggingConfig) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.format.as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_project_dir(cli.command.project());
    init_logging(cli.debug, cli.verbose, &config.logging);

    info!("schemagraph v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scan {
            project,
            entry,
            format,
            no_progress,
        } => {
            cli::scan::scan_project(project, entry, format, !no_progress).await?;
        }

        Commands::Definition {
            name,
            search,
            project,
            entry,
            format,
        } => {
            cli::query::definition(name, search, project, entry, format).await?;
        }

        Commands::Operations {
            name,
            project,
            entry,
            format,
        } => {
            cli::query::operations(name, project, entry, format).await?;
        }

        Commands::Persisted {
            manifest,
            project,
            entry,
            format,
        } => {
            cli::query::persisted(manifest, project, entry, format).await?;
        }

        Commands::Fields {
            type_name,
            project,
            entry,
            format,
        } => {
            cli::query::fields(type_name, project, entry, format).await?;
        }

        Commands::Graph {
            type_name,
            project,
            entry,
            format,
        } => {
            cli::query::graph(type_name, project, entry, format).await?;
        }

        Commands::Stats {
            project,
            entry,
            format,
        } => {
            cli::stats::show_stats(project, entry, cli.verbose, format).await?;
        }

        Commands::Serve {
            project,
            entry,
            no_watch,
        } => {
            cli::serve::serve_stdio(project, entry, !no_watch).await?;
        }

        Commands::Watch { project, entry } => {
            cli::watch::watch_project(project, entry).await?;
        }
    }

    Ok(())
}
