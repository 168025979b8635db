//! Prometheus exporter for RabbitMQ.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use rabbitmq_exporter::config::LogFormat;
use rabbitmq_exporter::{
    ExporterConfig, ExporterRegistry, HttpServer, ManagementClient, ScrapeDriver,
};

/// Prometheus exporter for RabbitMQ.
#[derive(Parser, Debug)]
#[command(name = "rabbitmq-exporter")]
#[command(about = "Export RabbitMQ management API statistics as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Management API base URL (overrides config).
    #[arg(long, env = "RABBIT_URL")]
    rabbit_url: Option<String>,

    /// Management API user (overrides config).
    #[arg(long, env = "RABBIT_USER")]
    rabbit_user: Option<String>,

    /// Management API password (overrides config).
    #[arg(long, env = "RABBIT_PASSWORD", hide_env_values = true)]
    rabbit_password: Option<String>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Apply CLI overrides
    if let Some(listen) = args.listen {
        config.prometheus.listen = listen;
    }
    if let Some(url) = args.rabbit_url {
        config.rabbit.url = url;
    }
    if let Some(user) = args.rabbit_user {
        config.rabbit.user = user;
    }
    if let Some(password) = args.rabbit_password {
        config.rabbit.password = password;
    }
    config.validate()?;

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level)
        .parse()
        .unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("rabbitmq_exporter={}", log_level).parse()?)
        .add_directive(format!("hyper={}", Level::WARN).parse()?)
        .add_directive(format!("reqwest={}", Level::WARN).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!(url = %config.rabbit.url, "Starting RabbitMQ exporter");

    // Build exporters
    let client = ManagementClient::new(&config.rabbit)
        .map_err(|e| anyhow::anyhow!("Failed to create management API client: {}", e))?;
    let mut registry = ExporterRegistry::builtin(Arc::new(client));
    registry.retain_enabled(&config.exporters.enabled)?;

    let driver = Arc::new(ScrapeDriver::new(
        registry.instantiate_all(),
        config.prometheus.prefix.clone(),
    )?);
    info!(exporters = ?driver.exporter_names(), "Exporters enabled");

    // Parse listen address
    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(driver.clone(), listen_addr, config.prometheus.path.clone());
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    let stats = driver.stats();
    info!(
        scrapes = stats.scrapes,
        exporter_failures = stats.exporter_failures,
        "Final statistics"
    );

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
