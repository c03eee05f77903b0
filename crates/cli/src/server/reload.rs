use ferrous_nftset_application::use_cases::ReloadConfigUseCase;
use ferrous_nftset_domain::Config;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Reload the configuration file on SIGHUP until `shutdown` fires.
#[cfg(unix)]
pub async fn watch_reload_signal(
    reload: Arc<ReloadConfigUseCase>,
    config_path: Option<String>,
    shutdown: CancellationToken,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            error!(error = %e, "Failed to install SIGHUP handler");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            received = hangup.recv() => {
                if received.is_none() {
                    return;
                }
            }
        }

        let Some(path) = config_path.clone().or_else(Config::get_config_path) else {
            warn!("SIGHUP received but no configuration file is in use");
            continue;
        };

        info!(path = %path, "SIGHUP received, reloading configuration");
        if let Err(e) = reload.execute(&path).await {
            error!(error = %e, "Configuration reload failed, keeping previous settings");
        }
    }
}

#[cfg(not(unix))]
pub async fn watch_reload_signal(
    _reload: Arc<ReloadConfigUseCase>,
    _config_path: Option<String>,
    shutdown: CancellationToken,
) {
    shutdown.cancelled().await;
}

/// Await the watcher task, logging a panic instead of dropping it.
/// Returns `true` when the task finished cleanly.
pub async fn join_reload_watcher(watcher: JoinHandle<()>) -> bool {
    match watcher.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Reload watcher task panicked");
            false
        }
    }
}
