use clap::{Parser, Subcommand};
use repolens_cli::commands;
use std::path::PathBuf;

/// Structure-first, evidence-first repository analysis
#[derive(Parser)]
#[command(name = "repolens", version, about)]
struct Cli {
    /// Repository root to operate on
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze the repository and persist the snapshot
    Analyze {
        /// Repository identifier (defaults to the directory name)
        #[arg(long)]
        repo_id: Option<String>,
    },
    /// Print languages, module tree, and entry points
    Summary,
    /// List all modules
    Modules,
    /// Show one module with its files, symbols, and cross-module deps
    Module {
        /// Module identifier (see `modules`)
        id: String,
    },
    /// Print the dependency graph (nodes and edges)
    Graph,
    /// Search indexed chunks; every result carries a citation
    Search {
        query: String,
        /// Restrict to a module and its descendants
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, default_value_t = 8)]
        top_k: usize,
        /// Plain token matching instead of semantic retrieval
        #[arg(long)]
        keyword: bool,
    },
    /// Ask a question; the answer cites the evidence it used
    Answer {
        query: String,
        /// Restrict to a module and its descendants
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        max_evidence: Option<usize>,
        /// Stream the answer as it is generated
        #[arg(long)]
        stream: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { repo_id } => commands::analyze(&cli.root, repo_id).await,
        Command::Summary => commands::summary(&cli.root).await,
        Command::Modules => commands::modules(&cli.root).await,
        Command::Module { id } => commands::module(&cli.root, &id).await,
        Command::Graph => commands::graph(&cli.root).await,
        Command::Search {
            query,
            scope,
            top_k,
            keyword,
        } => commands::search(&cli.root, &query, scope, top_k, keyword).await,
        Command::Answer {
            query,
            scope,
            max_evidence,
            stream,
        } => commands::answer(&cli.root, &query, scope, max_evidence, stream).await,
    }
}
