use anyhow::Context;
use clap::Parser;
use ticketline_cli::{session, Cli, Commands, Overrides};
use ticketline_core::BookingId;
use ticketline_tracker::TrackerOutcome;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketline_cli=info,ticketline_tracker=info,ticketline_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ticketline_store::Config::load_from(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Track { booking_id, realtime_origin, api_origin, wait_timeout, open_browser } => {
            Overrides { realtime_origin, api_origin, wait_timeout, open_browser }.apply(&mut config);
            tracing::info!("Realtime server {}, API {}", config.realtime.origin, config.api.origin);

            let outcome = session::track(&config, BookingId::from(booking_id)).await?;
            if let TrackerOutcome::Failed { .. } = outcome {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
