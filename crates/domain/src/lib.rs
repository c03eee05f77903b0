//! Ferrous NftSet Domain Layer
pub mod answer;
pub mod config;
pub mod errors;
pub mod firewall;
pub mod table_family;

pub use answer::{AnswerData, AnswerRecord};
pub use config::{
    CliOverrides, Config, ConfigError, DispatchMode, LogFormat, LoggingConfig, NftablesConfig,
    ServerConfig, SetRuleConfig,
};
pub use errors::DomainError;
pub use firewall::{SetDescriptor, SetElement, SetFlags, SetKeyType, Table};
pub use table_family::TableFamily;
