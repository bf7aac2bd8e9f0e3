//! queuewatch binary entry point.
//!
//! Loads configuration, wires the SQS client and Zabbix sender into the
//! scheduler, and runs until a fatal error or an external kill.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use queuewatch::config::{AppConfig, ConfigOverrides};
use queuewatch::{IntervalTicker, Scheduler, SqsClient, ZabbixSender};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// queuewatch - push SQS queue depths to Zabbix
#[derive(Parser, Debug)]
#[command(name = "queuewatch", version, about, long_about = None)]
struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, env = "QUEUEWATCH_CONFIG")]
    config: Option<String>,

    /// Queue service endpoint URL
    #[arg(long, env = "QUEUE_ENDPOINT")]
    queue_endpoint: Option<String>,

    /// Zabbix server or proxy host
    #[arg(long, env = "ZABBIX_HOST")]
    zabbix_host: Option<String>,

    /// Zabbix trapper port
    #[arg(long, env = "ZABBIX_PORT")]
    zabbix_port: Option<u16>,

    /// Host name the items belong to in Zabbix
    #[arg(long, env = "ZABBIX_TARGET_HOST")]
    zabbix_target_host: Option<String>,

    /// Low-level discovery rule key
    #[arg(long, env = "ZABBIX_AUTO_DISCOVERY_KEY_NAME")]
    discovery_key: Option<String>,

    /// Item key prefix
    #[arg(long, env = "ZABBIX_ITEM_KEY_NAME")]
    item_key: Option<String>,

    /// Polling interval in seconds
    #[arg(long, env = "INTERVAL")]
    interval: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            queue_endpoint: self.queue_endpoint.clone(),
            zabbix_host: self.zabbix_host.clone(),
            zabbix_port: self.zabbix_port,
            zabbix_target_host: self.zabbix_target_host.clone(),
            discovery_key: self.discovery_key.clone(),
            item_key: self.item_key.clone(),
            interval_secs: self.interval,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,queuewatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    config.apply(cli.overrides());
    config.validate()?;

    tracing::info!(
        "Queue service: {}, Zabbix: {}:{} (target host '{}'), interval: {}",
        config.queue.endpoint,
        config.zabbix.host,
        config.zabbix.port,
        config.zabbix.target_host,
        humantime::format_duration(config.interval),
    );

    let service = Arc::new(SqsClient::new(&config.queue)?);
    let sender = Arc::new(
        ZabbixSender::new(&config.zabbix.host, config.zabbix.port)
            .with_timeout(config.zabbix.timeout),
    );
    let ticker = IntervalTicker::new(config.interval);

    let mut scheduler = Scheduler::new(service, sender, ticker, config.report_target());
    scheduler.run().await?;

    Ok(())
}
