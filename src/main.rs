use clap::{Parser, Subcommand};
use faq_search::commands::{insert_faq, search_faqs, serve, show_status};
use faq_search::config::{Config, get_config_dir, run_interactive_config, show_config};
use faq_search::{FaqError, Result};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "faq-search")]
#[command(about = "Store FAQ entries and search them semantically over HTTP")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the vector data (default: ~/.faq-search)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the Ollama connection, server and search settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP API
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Store a single FAQ entry
    Insert {
        question: String,
        answer: String,
    },
    /// Search stored FAQ entries
    Search {
        query: String,
        /// Number of matches to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show stored FAQ count and embedding provider status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir().map_err(|e| FaqError::Config(e.to_string()))?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&Config::load(&config_dir)?);
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Serve { host, port } => {
            serve(&Config::load(&config_dir)?, host, port).await?;
        }
        Commands::Insert { question, answer } => {
            insert_faq(&Config::load(&config_dir)?, &question, &answer).await?;
        }
        Commands::Search { query, top_k } => {
            search_faqs(&Config::load(&config_dir)?, &query, top_k).await?;
        }
        Commands::Status => {
            show_status(&Config::load(&config_dir)?).await?;
        }
    }

    Ok(())
}
