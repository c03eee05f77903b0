use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Failed to connect to packet filter engine: {0}")]
    EngineConnect(String),

    #[error("Packet filter command failed: {0}")]
    EngineCommand(String),

    #[error("Failed to flush packet filter batch: {0}")]
    EngineFlush(String),

    #[error("Unexpected packet filter output: {0}")]
    InvalidEngineResponse(String),

    #[error("Set {family} {table} {set} not found")]
    SetNotFound {
        family: String,
        table: String,
        set: String,
    },

    #[error("Unknown table family: {0}")]
    UnknownTableFamily(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
