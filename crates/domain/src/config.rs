pub mod errors;
pub mod logging;
pub mod nftables;
pub mod root;
pub mod server;

pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use nftables::{DispatchMode, NftablesConfig, SetRuleConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
