use ferrous_nftset_application::services::{ConnectionPool, PoolSettings, RuleTable};
use ferrous_nftset_application::use_cases::{
    DispatchAnswersUseCase, MirrorResponseUseCase, ReloadConfigUseCase,
};
use ferrous_nftset_domain::Config;
use ferrous_nftset_infrastructure::dns::{DnsServerHandler, UdpForwarder};
use ferrous_nftset_infrastructure::nftables::NftCommandEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

pub struct Services {
    pub pool: Arc<ConnectionPool>,
    pub mirror: Arc<MirrorResponseUseCase>,
    pub reload: Arc<ReloadConfigUseCase>,
    pub handler: Arc<DnsServerHandler>,
}

impl Services {
    pub fn new(config: &Config, config_arc: Arc<RwLock<Config>>) -> anyhow::Result<Self> {
        let nftables = &config.nftables;
        info!(
            nft_binary = %nftables.nft_binary,
            rules = nftables.rules.len(),
            mode = ?nftables.dispatch_mode(),
            "Initializing nftables services"
        );

        let engine = Arc::new(NftCommandEngine::with_binary(&nftables.nft_binary));
        let pool = Arc::new(ConnectionPool::new(
            engine,
            PoolSettings::from_config(nftables),
        ));
        let dispatcher = Arc::new(DispatchAnswersUseCase::new(
            Arc::clone(&pool),
            RuleTable::from_config(&nftables.rules),
        ));
        let mirror = Arc::new(MirrorResponseUseCase::new(
            Arc::clone(&dispatcher),
            nftables.dispatch_mode(),
        ));
        let reload = Arc::new(ReloadConfigUseCase::new(
            config_arc,
            dispatcher,
            Arc::clone(&mirror),
        ));

        let upstream: SocketAddr = config.server.upstream.parse()?;
        let forwarder = UdpForwarder::new(
            upstream,
            Duration::from_millis(config.server.query_timeout_ms),
        );
        let handler = Arc::new(DnsServerHandler::new(forwarder, Arc::clone(&mirror)));

        Ok(Self {
            pool,
            mirror,
            reload,
            handler,
        })
    }
}
