use anyhow::Result;
use legalitea::cli::{Args, ConfigDiscovery, ExecutionMode, execute};
use legalitea::{AssistantConfig, DocumentAssistant, env};
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let (mut config, source) = ConfigDiscovery::load(args.config.as_deref())?;
    args.overrides().apply(&mut config);
    info!(config = ?source, "Starting legalitea");

    if mode == ExecutionMode::ShowConfig {
        return show_config(config, source.as_deref());
    }

    let assistant = DocumentAssistant::new(config);
    let output = execute(&assistant, mode).await?;
    println!("{}", output.to_json(args.verbose)?);
    Ok(())
}

fn show_config(config: AssistantConfig, source: Option<&Path>) -> Result<()> {
    ConfigDiscovery::show_discovery_info();
    if let Some(source) = source {
        println!("Loaded from: {:?}", source);
    }
    println!();

    let status = DocumentAssistant::new(config).status();

    println!("Provider chain (language: {}, offline: {}):", status.language, status.offline);
    for provider in &status.providers {
        let state = if provider.available {
            "✓ AVAILABLE"
        } else {
            "✗ UNAVAILABLE"
        };
        println!(
            "  {}. {} ({}) - {}",
            provider.priority, provider.name, provider.model, state
        );
    }
    Ok(())
}
