use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kiosk_gateway::client::CommandInvoker;
use kiosk_gateway::{Bridge, Config, Dispatcher, KioskClient, KioskRegistry};

/// Kioskd - MQTT control bridge for Fully Kiosk Browser fleets
#[derive(Parser)]
#[command(name = "kioskd", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "KIOSKD_CONFIG", default_value = "kioskd.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,kiosk_gateway=info",
        1 => "info,kiosk_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;
    tracing::info!(path = %cli.config.display(), "loaded configuration");

    let registry = Arc::new(KioskRegistry::new());
    let client: Arc<dyn CommandInvoker> = Arc::new(KioskClient::with_port(
        config.kiosk.admin_password.clone(),
        config.kiosk.admin_port,
    )?);

    let dispatchers = config
        .control_topics
        .iter()
        .map(|(name, control)| {
            tracing::info!(
                name,
                topic = %control.topic,
                commands = control.commands.len(),
                "binding control topic"
            );
            Dispatcher::new(
                control.topic.clone(),
                control.commands.clone(),
                Arc::clone(&registry),
                Arc::clone(&client),
            )
        })
        .collect();

    let bridge = Bridge::new(
        &config.mqtt,
        config.kiosk.announce_topic.clone(),
        registry,
        dispatchers,
    );

    tracing::info!(
        broker = %config.mqtt.host,
        port = config.mqtt.port,
        "kiosk gateway starting"
    );

    tokio::select! {
        result = bridge.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}
