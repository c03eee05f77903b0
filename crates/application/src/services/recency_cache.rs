use ferrous_nftset_domain::NftablesConfig;
use lru::LruCache;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Upper bound for entry lifetimes so `now + ttl` can never overflow.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencySettings {
    pub ttl: Duration,
    /// 0 disables the cache entirely.
    pub capacity: usize,
    pub max_retries: u64,
}

impl RecencySettings {
    pub fn from_config(config: &NftablesConfig) -> Self {
        Self {
            ttl: config.set_lru_timeout(),
            capacity: config.set_lru_max_count,
            max_retries: config.set_lru_max_retry_times,
        }
    }
}

impl Default for RecencySettings {
    fn default() -> Self {
        Self::from_config(&NftablesConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyEntry {
    pub expire_at: Instant,
    pub attempt_count: u64,
}

/// Addresses recently pushed through one pooled connection.
///
/// Acts as a soft circuit breaker: an address keeps being dispatched until it
/// has been seen `max_retries` times within its lifetime. Entries are never
/// refreshed after creation; expiry is reclaimed lazily from the LRU end.
pub struct RecencyCache {
    entries: Option<LruCache<IpAddr, RecencyEntry>>,
    ttl: Duration,
    max_retries: u64,
}

impl RecencyCache {
    pub fn new(settings: RecencySettings) -> Self {
        Self {
            entries: NonZeroUsize::new(settings.capacity).map(LruCache::new),
            ttl: settings.ttl.min(MAX_TTL),
            max_retries: settings.max_retries,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn should_ignore(&mut self, address: &IpAddr) -> bool {
        let Some(entries) = self.entries.as_mut() else {
            return false;
        };

        entries
            .get(address)
            .is_some_and(|entry| entry.attempt_count >= self.max_retries)
    }

    /// Count one completed dispatch pass for `address`.
    ///
    /// `applied` is informational only; the counter always moves by one.
    pub fn record_apply(&mut self, address: IpAddr, applied: usize) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        if let Some(entry) = entries.get_mut(&address) {
            entry.attempt_count += 1;
            debug!(address = %address, applied, attempts = entry.attempt_count, "Recency entry updated");
            return;
        }

        entries.put(
            address,
            RecencyEntry {
                expire_at: Instant::now() + self.ttl,
                attempt_count: 1,
            },
        );
        debug!(address = %address, applied, "Recency entry created");
    }

    /// Evict expired entries from the least-recently-used end, stopping at
    /// the first live one. Returns the number of evicted entries.
    pub fn garbage_collect(&mut self) -> usize {
        let Some(entries) = self.entries.as_mut() else {
            return 0;
        };

        let now = Instant::now();
        let mut evicted = 0;
        while let Some((_, entry)) = entries.peek_lru() {
            if entry.expire_at > now {
                break;
            }
            entries.pop_lru();
            evicted += 1;
        }
        evicted
    }

    /// Entry for `address` without touching its recency.
    pub fn peek(&self, address: &IpAddr) -> Option<&RecencyEntry> {
        self.entries.as_ref().and_then(|entries| entries.peek(address))
    }

    pub fn attempt_count(&self, address: &IpAddr) -> Option<u64> {
        self.peek(address).map(|entry| entry.attempt_count)
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.cap().get())
    }
}
