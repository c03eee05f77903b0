pub mod connection_pool;
pub mod metadata_cache;
pub mod recency_cache;
pub mod rule_table;
pub mod set_element_rule;

pub use connection_pool::{ConnectionPool, PoolSettings, PoolStats, PooledConnection};
pub use metadata_cache::{MetadataCache, TableHandle};
pub use recency_cache::{RecencyCache, RecencyEntry, RecencySettings};
pub use rule_table::RuleTable;
pub use set_element_rule::SetElementRule;
