mod alert;
mod chain;
mod cli;
mod config;
mod error;
mod monitor;
mod ui;
mod watcher;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use alert::DiscordClient;
use chain::{ChainReader, RpcChainReader};
use cli::{Cli, Command};
use config::MonitorConfig;
use error::JobwatchError;
use monitor::{LivenessEvaluator, SubscriptionManager, resolve_active_network};
use ui::Spinner;
use watcher::{CheckReport, Watcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = MonitorConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(threshold) = cli.threshold {
        config.inactivity_threshold_blocks = threshold;
    }
    if let Some(interval) = cli.interval {
        config.check_interval_secs = interval;
    }
    config.validate()?;

    match cli.command {
        Command::Run => run(&config).await,
        Command::Check { since, notify } => check(&config, since, notify).await,
        Command::Networks => networks(&config).await,
    }
}

async fn connect_reader(config: &MonitorConfig) -> anyhow::Result<RpcChainReader> {
    let reader = RpcChainReader::connect(
        &config.provider_url,
        config.sequencer()?,
        &config.work_event_signatures,
    )
    .await
    .context("failed to connect to chain endpoint")?;
    Ok(reader)
}

fn discord_client(config: &MonitorConfig) -> Result<DiscordClient, JobwatchError> {
    config.require_discord()?;
    Ok(DiscordClient::with_base_url(
        config.discord_bot_token.clone(),
        config.discord_channel_id.clone(),
        config.discord_api_url.clone(),
    )?)
}

/// Both endpoints must answer before the monitor starts. Returns the head.
async fn verify_endpoints(
    reader: &RpcChainReader,
    discord: &DiscordClient,
) -> Result<u64, JobwatchError> {
    let head = reader.current_block_number().await?;
    discord.verify().await?;
    Ok(head)
}

async fn run(config: &MonitorConfig) -> anyhow::Result<()> {
    let discord = discord_client(config)?;
    let reader = connect_reader(config).await?;
    let head = verify_endpoints(&reader, &discord)
        .await
        .context("startup verification failed")?;
    info!(
        head,
        sequencer = %reader.sequencer(),
        threshold = config.inactivity_threshold_blocks,
        window_mode = %config.window_mode,
        "endpoints verified"
    );

    let mut watcher = Watcher::new(&reader, &discord, config.watch_settings());
    let mut subscriptions = SubscriptionManager::new(config.max_block_range);
    watcher
        .attach_subscriptions(&mut subscriptions)
        .await
        .context("failed to load job roster")?;

    let (tx, rx) = mpsc::channel(config.event_queue_capacity);
    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    let check_interval = Duration::from_secs(config.check_interval_secs);

    tokio::select! {
        _ = subscriptions.run(&reader, tx, poll_interval) => warn!("subscriptions stopped"),
        _ = watcher.run(rx, check_interval) => warn!("watcher stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("shutting down");
        }
    }
    info!(jobs = watcher.tracker().len(), "monitor stopped");
    Ok(())
}

async fn check(config: &MonitorConfig, since: Option<u64>, notify: bool) -> anyhow::Result<()> {
    let discord = if notify {
        Some(discord_client(config)?)
    } else {
        None
    };
    let reader = connect_reader(config).await?;

    let spinner = Spinner::start("reading sequencer roster");
    let report = evaluate_once(config, &reader, &spinner, since).await;
    spinner.finish();
    let mut report = report?;

    if let Some(discord) = &discord {
        let (delivered, failed) = watcher::deliver_alerts(discord, &report.jobs).await;
        report.delivered = delivered;
        report.delivery_failures = failed;
    }

    ui::print_check_report(&report, config.inactivity_threshold_blocks);
    Ok(())
}

async fn evaluate_once(
    config: &MonitorConfig,
    reader: &RpcChainReader,
    spinner: &Spinner,
    since: Option<u64>,
) -> Result<CheckReport, JobwatchError> {
    if let Some(since) = since {
        spinner.set_message(&format!("replaying logs of the last {since} blocks"));
    }
    let tracker = watcher::seed_tracker(reader, since, config.max_block_range).await?;

    spinner.set_message(&format!("evaluating {} job(s)", tracker.len()));
    let current_block = reader.current_block_number().await?;
    let evaluator = LivenessEvaluator::new(reader, config.window_mode, config.workable_policy);
    let jobs = watcher::evaluate_jobs(
        &evaluator,
        &tracker,
        current_block,
        config.inactivity_threshold_blocks,
    )
    .await;

    Ok(CheckReport {
        current_block,
        jobs,
        ..CheckReport::default()
    })
}

async fn networks(config: &MonitorConfig) -> anyhow::Result<()> {
    let reader = connect_reader(config).await?;

    let spinner = Spinner::start("reading sequencer networks");
    let result = async {
        let head = reader.current_block_number().await?;
        let networks = reader.list_networks_with_windows().await?;
        Ok::<_, JobwatchError>((head, networks))
    }
    .await;
    spinner.finish();
    let (head, networks) = result?;

    let active = resolve_active_network(head, &networks, config.window_mode);
    ui::print_networks(head, &networks, config.window_mode, active);
    Ok(())
}
