use super::metadata_cache::{MetadataCache, TableHandle};
use super::recency_cache::{RecencyCache, RecencySettings};
use crate::ports::{FirewallEngine, FirewallSession};
use ferrous_nftset_domain::{DomainError, NftablesConfig, TableFamily};
use metrics::counter;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Max age of a connection before it is torn down instead of reused.
    pub ttl: Duration,
    pub recency: RecencySettings,
}

impl PoolSettings {
    pub fn from_config(config: &NftablesConfig) -> Self {
        Self {
            ttl: config.connection_timeout(),
            recency: RecencySettings::from_config(config),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::from_config(&NftablesConfig::default())
    }
}

/// A packet filter session bundled with the caches that belong to it.
///
/// Owned by exactly one dispatch pass between `acquire` and `release`, so
/// nothing in here needs locking.
pub struct PooledConnection {
    id: u64,
    generation: u64,
    session: Box<dyn FirewallSession>,
    created_at: Instant,
    metadata: MetadataCache,
    recency: RecencyCache,
    unhealthy: bool,
}

impl PooledConnection {
    fn new(session: Box<dyn FirewallSession>, recency: RecencySettings, generation: u64) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            generation,
            session,
            created_at: Instant::now(),
            metadata: MetadataCache::new(),
            recency: RecencyCache::new(recency),
            unhealthy: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_unhealthy(&self) -> bool {
        self.unhealthy
    }

    /// The connection will be torn down on release instead of pooled.
    pub fn mark_unhealthy(&mut self) {
        self.unhealthy = true;
    }

    pub fn recency(&self) -> &RecencyCache {
        &self.recency
    }

    pub fn recency_mut(&mut self) -> &mut RecencyCache {
        &mut self.recency
    }

    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    pub fn session_mut(&mut self) -> &mut dyn FirewallSession {
        self.session.as_mut()
    }

    /// Session and metadata cache borrowed together, for lookups that
    /// need to talk to the packet filter on a cache miss.
    pub fn parts_mut(&mut self) -> (&mut dyn FirewallSession, &mut MetadataCache) {
        (self.session.as_mut(), &mut self.metadata)
    }

    pub async fn resolve_table(
        &mut self,
        family: TableFamily,
        name: &str,
    ) -> Result<&mut TableHandle, DomainError> {
        self.metadata
            .resolve_table(self.session.as_mut(), family, name)
            .await
    }

    async fn close(self) -> Result<(), DomainError> {
        self.session.close().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscardReason {
    Expired,
    Unhealthy,
    Stale,
    Cleared,
}

impl DiscardReason {
    fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::Expired => "expired",
            DiscardReason::Unhealthy => "unhealthy",
            DiscardReason::Stale => "stale",
            DiscardReason::Cleared => "cleared",
        }
    }
}

struct PoolState {
    queue: VecDeque<PooledConnection>,
    settings: PoolSettings,
    /// Bumped on clear/reconfigure; connections from older generations are
    /// not taken back.
    generation: u64,
}

/// FIFO pool of packet filter connections with TTL-based recycling.
///
/// Only queue bookkeeping happens under the mutex; connecting, flushing and
/// closing always run outside of it. Discarded connections are closed on
/// detached tasks.
pub struct ConnectionPool {
    engine: Arc<dyn FirewallEngine>,
    state: Mutex<PoolState>,
    teardowns: TaskTracker,
    total_created: AtomicU64,
    total_reused: AtomicU64,
    total_discarded: AtomicU64,
}

impl ConnectionPool {
    pub fn new(engine: Arc<dyn FirewallEngine>, settings: PoolSettings) -> Self {
        info!(
            ttl_secs = settings.ttl.as_secs(),
            recency_capacity = settings.recency.capacity,
            "Initializing nftables connection pool"
        );

        Self {
            engine,
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                settings,
                generation: 0,
            }),
            teardowns: TaskTracker::new(),
            total_created: AtomicU64::new(0),
            total_reused: AtomicU64::new(0),
            total_discarded: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> PoolSettings {
        self.lock_state().settings
    }

    /// Take the oldest connection still within its TTL, or open a new one.
    pub async fn acquire(&self) -> Result<PooledConnection, DomainError> {
        let (reused, recency, generation) = {
            let mut state = self.lock_state();
            let ttl = state.settings.ttl;
            let mut reused = None;
            while let Some(conn) = state.queue.pop_front() {
                if conn.age() > ttl {
                    self.discard(conn, DiscardReason::Expired);
                    continue;
                }
                reused = Some(conn);
                break;
            }
            (reused, state.settings.recency, state.generation)
        };

        if let Some(mut conn) = reused {
            let evicted = conn.recency_mut().garbage_collect();
            self.total_reused.fetch_add(1, Ordering::Relaxed);
            debug!(connection = conn.id(), evicted, "Nftables connection selected from pool");
            return Ok(conn);
        }

        let session = self.engine.connect().await.map_err(|e| {
            error!(error = %e, "Nftables connection failed");
            e
        })?;

        let conn = PooledConnection::new(session, recency, generation);
        self.total_created.fetch_add(1, Ordering::Relaxed);
        counter!("nftset_pool_connections_created_total").increment(1);
        info!(connection = conn.id(), "Nftables created new pooled connection");
        Ok(conn)
    }

    /// Flush pending mutations and hand the connection back.
    ///
    /// `failure` marks the connection unhealthy; so does a failed flush.
    /// Unhealthy, expired or stale connections are torn down, everything
    /// else goes to the back of the queue.
    pub async fn release(&self, mut conn: PooledConnection, failure: Option<&DomainError>) {
        if let Some(e) = failure {
            warn!(connection = conn.id(), error = %e, "Nftables connection released with error");
            conn.mark_unhealthy();
        }

        if let Err(e) = conn.session_mut().flush().await {
            error!(connection = conn.id(), error = %e, "Nftables flush connection failed");
            conn.mark_unhealthy();
        }

        let mut state = self.lock_state();
        let reason = if conn.is_unhealthy() {
            Some(DiscardReason::Unhealthy)
        } else if conn.age() > state.settings.ttl {
            Some(DiscardReason::Expired)
        } else if conn.generation != state.generation {
            Some(DiscardReason::Stale)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                drop(state);
                self.discard(conn, reason);
            }
            None => {
                debug!(
                    connection = conn.id(),
                    pooled = state.queue.len() + 1,
                    "Nftables connection added to pool"
                );
                state.queue.push_back(conn);
            }
        }
    }

    /// Drain every pooled connection and tear them down in the background.
    /// Connections currently checked out are dropped when released.
    pub fn clear(&self) -> usize {
        let drained: Vec<PooledConnection> = {
            let mut state = self.lock_state();
            state.generation += 1;
            state.queue.drain(..).collect()
        };

        let count = drained.len();
        for conn in drained {
            self.discard(conn, DiscardReason::Cleared);
        }
        info!(count, "Cleared nftables connection pool");
        count
    }

    /// Swap in new settings; existing connections are cleared since their
    /// caches were sized for the old ones.
    pub fn reconfigure(&self, settings: PoolSettings) -> usize {
        self.lock_state().settings = settings;
        info!(ttl_secs = settings.ttl.as_secs(), "Nftables connection pool reconfigured");
        self.clear()
    }

    /// Wait until every teardown spawned so far has finished.
    pub async fn wait_for_teardowns(&self) {
        self.teardowns.close();
        self.teardowns.wait().await;
        self.teardowns.reopen();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pooled: self.lock_state().queue.len(),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            total_discarded: self.total_discarded.load(Ordering::Relaxed),
        }
    }

    fn discard(&self, conn: PooledConnection, reason: DiscardReason) {
        self.total_discarded.fetch_add(1, Ordering::Relaxed);
        counter!("nftset_pool_connections_discarded_total", "reason" => reason.as_str())
            .increment(1);

        let id = conn.id();
        debug!(connection = id, reason = reason.as_str(), "Nftables connection discarded");

        self.teardowns.spawn(async move {
            info!(connection = id, "Nftables connection start to destroy");
            if let Err(e) = conn.close().await {
                warn!(connection = id, error = %e, "Nftables connection teardown failed");
            }
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub pooled: usize,
    pub total_created: u64,
    pub total_reused: u64,
    pub total_discarded: u64,
}
