use std::path::PathBuf;

use clap::Parser;

use url_redirect::config::{apply_overrides, load_config, RedirectConfig};
use url_redirect::lifecycle::{startup, wait_for_signal, Shutdown};
use url_redirect::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "url-redirect")]
#[command(about = "Redirects known paths to URLs held in an embedded store", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the store file path
    #[arg(short, long)]
    store: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RedirectConfig::default(),
    };
    let config = apply_overrides(config, cli.bind, cli.store)?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = %config.store.path,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    if let Err(e) = startup::run(config, receiver).await {
        tracing::error!(error = %e, "Service stopped with an error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
