//! The `lore` binary: retrieval-augmented question answering from the
//! terminal.

use lore::cli::commands;
use lore::cli::output::Output;
use lore::cli::{Cli, Commands};
use lore::config::LoreConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // .env is optional; missing file is not an error
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "lore=debug" } else { "lore=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let out = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &out).await {
        out.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, out: &Output) -> lore::Result<()> {
    let config = LoreConfig::load(&cli.config)?;

    match cli.command {
        Commands::Index { dir, extensions } => {
            commands::index(&config, out, &dir, extensions).await
        }
        Commands::Ask {
            question,
            stream,
            top_k,
            show_sources,
        } => commands::ask(&config, out, &question, stream, top_k, show_sources).await,
        Commands::Chat => commands::chat(&config, out).await,
    }
}
