//! PrepEase AI service - main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prepease::cli::{Args, Commands};
use prepease::config::Config;
use prepease::extract;
use prepease::models::registry::{spawn_loading, ModelRegistry};
use prepease::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity().log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply_overrides(&mut config);

    match args.command() {
        Commands::Serve => run_server(config).await?,
        Commands::Extract { file } => extract_file(&file)?,
        Commands::Config { save } => show_config(&config, args.config.as_deref(), save)?,
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    let registry = Arc::new(ModelRegistry::new());
    let state = AppState::new(&config, registry.clone()).context("Invalid configuration")?;

    info!(
        embedder = ?config.models.embedder,
        generation = config.models.generation_enabled,
        "starting model loading in the background"
    );
    // Requests before loading finishes get 503
    let _loading = spawn_loading(registry, config.models.clone(), config.generation.clone());

    server::serve(&config.server.bind, state).await
}

fn extract_file(path: &Path) -> Result<()> {
    let text = extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;
    println!("{}", text);
    Ok(())
}

fn show_config(config: &Config, explicit: Option<&Path>, save: bool) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Config::config_path().ok(),
    };
    match &path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no home directory)"),
    }
    println!("{}", rendered);

    if save {
        let path = path.context("Could not determine config file location")?;
        config.save_to(&path)?;
        info!("configuration written to {}", path.display());
    }
    Ok(())
}
