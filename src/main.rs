use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use channel_watch::checks::{self, CheckOptions};
use channel_watch::config::Config;
use channel_watch::notifier::Notifier;
use channel_watch::source::ga4::Ga4Source;
use channel_watch::source::simulated::{Scenario, SimulatedSource};
use channel_watch::source::{ChannelSource, StaticToken};

#[derive(Parser, Debug)]
#[command(name = "channel-watch", about = "Analytics channel traffic watcher")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/channel-watch/config.toml")]
    config: String,

    /// Validate config and exit
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect anomalies in the unassigned channel share
    Unassigned {
        /// Use simulated data instead of the analytics API
        #[arg(long)]
        test: bool,
        /// Simulate a rising unassigned share (with --test)
        #[arg(long)]
        spike: bool,
        /// Send notifications even in test mode
        #[arg(long)]
        send_email: bool,
        /// Window length in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Daily organic traffic report
    Organic {
        /// Use simulated data instead of the analytics API
        #[arg(long)]
        test: bool,
        /// Simulate zero organic sessions (with --test)
        #[arg(long)]
        no_organic: bool,
        /// Send notifications even in test mode
        #[arg(long)]
        send_email: bool,
        /// Window length in days
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    if cli.check {
        println!("Configuration is valid.");
        return Ok(());
    }

    // Initialize logging
    init_logging(&config)?;

    let Some(command) = cli.command else {
        anyhow::bail!("no command given, expected `unassigned` or `organic`");
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Starting channel-watch");

    if let Err(e) = run(command, config).await {
        error!(error = %e, "Check failed");
        print_json(&serde_json::json!({ "error": e.to_string() }))?;
        return Err(e);
    }

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(&config.agent.log_level)
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn make_source(config: &Config, test: bool, scenario: Scenario) -> Result<Box<dyn ChannelSource>> {
    if test {
        info!(?scenario, "Test mode, using simulated data");
        let today = chrono::Local::now().date_naive();
        return Ok(Box::new(SimulatedSource::new(scenario, today)));
    }
    let tokens = StaticToken::new(config.source.access_token.clone());
    Ok(Box::new(Ga4Source::new(&config.source, Box::new(tokens))?))
}

async fn run(command: Command, config: Config) -> Result<()> {
    let notifier = Notifier::new(&config.alerting)?;
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Unassigned { test, spike, send_email, days } => {
            let scenario = if spike { Scenario::UnassignedSpike } else { Scenario::Normal };
            let source = make_source(&config, test, scenario)?;
            let opts = CheckOptions { is_test: test, send_in_test: send_email, window_days: days };
            let outcome =
                checks::run_unassigned_check(source.as_ref(), &notifier, &config, opts, today).await?;
            info!(status = %outcome.status, email_sent = outcome.email_sent, "Unassigned check done");
            print_json(&outcome)?;
        }
        Command::Organic { test, no_organic, send_email, days } => {
            let scenario = if no_organic { Scenario::NoOrganic } else { Scenario::Normal };
            let source = make_source(&config, test, scenario)?;
            let opts = CheckOptions { is_test: test, send_in_test: send_email, window_days: days };
            let outcome =
                checks::run_organic_check(source.as_ref(), &notifier, &config, opts, today).await?;
            info!(status = %outcome.status, email_sent = outcome.email_sent, "Organic check done");
            print_json(&outcome)?;
        }
    }

    Ok(())
}
