use clap::Parser;
use ferrous_nftset_domain::CliOverrides;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "ferrous-nftset")]
#[command(version)]
#[command(about = "Ferrous NftSet - DNS forwarder that mirrors resolved addresses into nftables sets")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver (ip:port)
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Answer clients before applying nftables rules
    #[arg(long = "async")]
    async_mode: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        upstream: cli.upstream.clone(),
        log_level: cli.log_level.clone(),
        async_mode: cli.async_mode.then_some(true),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging)?;
    bootstrap::describe_metrics();

    info!("Starting Ferrous NftSet v{}", env!("CARGO_PKG_VERSION"));

    let config_arc = Arc::new(RwLock::new(config.clone()));
    let services = di::Services::new(&config, config_arc)?;

    let shutdown = CancellationToken::new();

    let dns_addr = config.server.listen_address()?;
    let mut dns_server = tokio::spawn(server::start_dns_server(
        dns_addr,
        Arc::clone(&services.handler),
        shutdown.clone(),
    ));

    let reload_watcher = tokio::spawn(server::watch_reload_signal(
        Arc::clone(&services.reload),
        cli.config.clone(),
        shutdown.clone(),
    ));

    let server_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
            shutdown.cancel();
            dns_server.await
        }
        finished = &mut dns_server => {
            shutdown.cancel();
            finished
        }
    };

    match server_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "DNS server error"),
        Err(e) => error!(error = %e, "DNS server task panicked"),
    }
    server::join_reload_watcher(reload_watcher).await;

    services.mirror.wait_background().await;
    let cleared = services.pool.clear();
    services.pool.wait_for_teardowns().await;

    info!(connections = cleared, "Server shutdown complete");
    Ok(())
}
