use super::dispatch_answers::DispatchAnswersUseCase;
use super::mirror_response::MirrorResponseUseCase;
use crate::services::{PoolSettings, RuleTable};
use ferrous_nftset_domain::{CliOverrides, Config, DomainError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Re-reads the configuration file and pushes the nftables part of it into
/// the running dispatcher. Listener settings only take effect on restart.
pub struct ReloadConfigUseCase {
    config: Arc<RwLock<Config>>,
    dispatcher: Arc<DispatchAnswersUseCase>,
    mirror: Arc<MirrorResponseUseCase>,
}

impl ReloadConfigUseCase {
    pub fn new(
        config: Arc<RwLock<Config>>,
        dispatcher: Arc<DispatchAnswersUseCase>,
        mirror: Arc<MirrorResponseUseCase>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            mirror,
        }
    }

    pub async fn execute(&self, config_path: &str) -> Result<Config, DomainError> {
        let new_config = Config::load(Some(config_path), CliOverrides::default())
            .map_err(|e| DomainError::ConfigError(format!("Config load error: {}", e)))?;

        new_config
            .validate()
            .map_err(|e| DomainError::ConfigError(format!("Config validation error: {}", e)))?;

        let nftables = &new_config.nftables;
        self.dispatcher
            .replace_rules(RuleTable::from_config(&nftables.rules));
        let cleared = self
            .dispatcher
            .pool()
            .reconfigure(PoolSettings::from_config(nftables));
        self.mirror.set_mode(nftables.dispatch_mode());

        {
            let mut config = self.config.write().await;
            *config = new_config.clone();
        }

        info!(
            rules = nftables.rules.len(),
            cleared,
            "Configuration reloaded successfully from: {}",
            config_path
        );

        Ok(new_config)
    }
}
