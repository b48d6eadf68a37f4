//! trustgraph: check "does source follow someone who follows target?"
//!
//! Asks the trustgraph ranking API for the path, then pulls profiles and
//! follow-lists from the configured relays and checks every link.

mod config;
mod render;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trustgraph::{PathSummary, TrustPathSession, TrustgraphConfig};

use config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for the result.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("trustgraph={},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("config: {e}");
            std::process::exit(2);
        }
    };

    info!("Ranking API: {}", config.ranking_endpoint);
    for relay in &config.relays {
        info!("Relay: {}", relay);
    }

    let summary = match run(&args, &config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(kind = e.kind().as_str(), "Request failed: {}", e);
            eprintln!("{}: {}", e.kind().as_str(), e);
            std::process::exit(1);
        }
    };

    print!("{}", render::render(&summary, args.json)?);
    Ok(())
}

async fn run(args: &Args, config: &TrustgraphConfig) -> trustgraph::Result<PathSummary> {
    let (source, target) = args.identities()?;

    let mut session = TrustPathSession::from_config(config)?;
    session.calculate(source, target, args.all).await?;

    if !args.no_verify {
        session.verify_follows().await?;
    }

    session.summary()
}
