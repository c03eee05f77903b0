use crate::services::PooledConnection;
use async_trait::async_trait;
use ferrous_nftset_domain::{AnswerRecord, DomainError, TableFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The rule chose not to act on this record; not an error.
    Ignored,
}

/// Performs one mutation against one packet filter set.
///
/// Must be safe to call repeatedly for the same address.
#[async_trait]
pub trait RuleApplier: Send + Sync {
    fn table_name(&self) -> &str;

    fn set_name(&self) -> &str;

    async fn apply(
        &self,
        conn: &mut PooledConnection,
        family: TableFamily,
        record: &AnswerRecord,
    ) -> Result<ApplyOutcome, DomainError>;
}
