use crate::{SetKeyType, TableFamily};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether rule application finishes before or after the client gets its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Sync,
    Async,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NftablesConfig {
    /// Max age of a pooled packet filter connection before it is discarded.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// How long an address stays in the per-connection recency cache.
    #[serde(default = "default_set_lru_timeout_secs")]
    pub set_lru_timeout_secs: u64,

    /// Capacity of the recency cache; 0 disables it.
    #[serde(default = "default_set_lru_max_count")]
    pub set_lru_max_count: usize,

    /// Dispatch passes after which an address is no longer pushed.
    #[serde(default = "default_set_lru_max_retry_times")]
    pub set_lru_max_retry_times: u64,

    #[serde(default)]
    pub async_mode: bool,

    /// Path of the `nft` binary.
    #[serde(default = "default_nft_binary")]
    pub nft_binary: String,

    #[serde(default)]
    pub rules: Vec<SetRuleConfig>,
}

impl NftablesConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn set_lru_timeout(&self) -> Duration {
        Duration::from_secs(self.set_lru_timeout_secs)
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.async_mode {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        }
    }
}

impl Default for NftablesConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout_secs(),
            set_lru_timeout_secs: default_set_lru_timeout_secs(),
            set_lru_max_count: default_set_lru_max_count(),
            set_lru_max_retry_times: default_set_lru_max_retry_times(),
            async_mode: false,
            nft_binary: default_nft_binary(),
            rules: Vec::new(),
        }
    }
}

/// One "add resolved address to set" rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SetRuleConfig {
    pub family: TableFamily,

    pub table: String,

    pub set: String,

    #[serde(default)]
    pub key_type: Option<SetKeyType>,

    /// Per-element timeout; elements live forever when unset.
    #[serde(default)]
    pub element_timeout_secs: Option<u64>,

    #[serde(default = "default_true")]
    pub auto_create_set: bool,

    #[serde(default)]
    pub interval: bool,
}

impl SetRuleConfig {
    pub fn new(family: TableFamily, table: &str, set: &str) -> Self {
        Self {
            family,
            table: table.to_string(),
            set: set.to_string(),
            key_type: None,
            element_timeout_secs: None,
            auto_create_set: true,
            interval: false,
        }
    }

    pub fn effective_key_type(&self) -> SetKeyType {
        self.key_type
            .unwrap_or_else(|| SetKeyType::default_for(self.family))
    }

    pub fn element_timeout(&self) -> Option<Duration> {
        self.element_timeout_secs.map(Duration::from_secs)
    }
}

/// nft identifiers: a letter followed by letters, digits, `_`, `-` or `.`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn default_connection_timeout_secs() -> u64 {
    300
}

fn default_set_lru_timeout_secs() -> u64 {
    720 * 3600
}

fn default_set_lru_max_count() -> usize {
    10_000
}

fn default_set_lru_max_retry_times() -> u64 {
    2_147_483_647
}

fn default_nft_binary() -> String {
    "nft".to_string()
}

fn default_true() -> bool {
    true
}
