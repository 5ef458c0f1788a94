mod config;
mod extract;
mod logging;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dinoqode_engine::{BatchStore, Orchestrator, ProcessGenerator};
use dinoqode_logging::{dq_error, dq_info, dq_warn};

use config::{AppConfig, DEFAULT_CONFIG_FILENAME};

#[derive(Parser)]
#[command(name = "dinoqode", about = "Music card line extractor and batch card generator")]
struct Cli {
    /// Configuration file (RON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILENAME)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the creator pages and accept card batches
    Serve {
        /// Address to listen on (default from config, 0.0.0.0:5006)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the card line for a streaming-store page
    Extract {
        /// Page URL; selects the service
        url: String,
        /// Read the page from a saved HTML file instead of fetching it
        #[arg(long)]
        html: Option<PathBuf>,
        /// album or song (blank means album)
        #[arg(short, long, default_value = "")]
        kind: String,
        /// Print the extracted record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = AppConfig::load_or_default(&cli.config);
    logging::initialize(config.log_destination, config.level(), &config.log_file);
    if let Some(err) = config_error {
        dq_warn!("{}; using default settings", err);
    }

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let store = BatchStore::new(config.input_path(), config.archive_dir());
            let generator = Arc::new(ProcessGenerator::new(config.generator_settings()));
            let orchestrator = Arc::new(Orchestrator::new(store, generator));
            dq_info!("Serving {:?}", config.root_dir);
            server::serve(&bind, server::AppState::new(orchestrator, config.root_dir.clone()))
                .await
        }
        Commands::Extract {
            url,
            html,
            kind,
            json,
        } => {
            let record =
                match extract::extract_record(&url, html.as_deref(), &kind, config.fetch_settings())
                    .await
                {
                    Ok(record) => record,
                    Err(err) => {
                        dq_error!("Extraction failed: {:#}", err);
                        return Err(err);
                    }
                };
            println!("{}", extract::render(&record, json)?);
            Ok(())
        }
    }
}
