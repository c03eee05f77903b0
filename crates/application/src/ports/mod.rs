mod firewall_engine;
mod response_writer;
mod rule_applier;

pub use firewall_engine::{FirewallEngine, FirewallSession};
pub use response_writer::ResponseWriter;
pub use rule_applier::{ApplyOutcome, RuleApplier};

// Re-export for convenience
pub use ferrous_nftset_domain::{AnswerRecord, TableFamily};
