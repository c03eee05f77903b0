mod config;
mod logging;
mod metrics;

pub use config::load_config;
pub use logging::init_logging;
pub use metrics::describe_metrics;
