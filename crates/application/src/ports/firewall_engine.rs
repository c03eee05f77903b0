use async_trait::async_trait;
use ferrous_nftset_domain::{DomainError, SetDescriptor, SetElement, Table, TableFamily};

/// Port for opening sessions against the packet filter.
#[async_trait]
pub trait FirewallEngine: Send + Sync {
    /// Establish a new session. Expensive; callers pool the result.
    async fn connect(&self) -> Result<Box<dyn FirewallSession>, DomainError>;
}

/// One session with the packet filter.
///
/// Mutations (`add_*`) may be batched by the implementation and only reach
/// the kernel on `flush`. All "add" operations must be idempotent: adding an
/// object that already exists succeeds.
#[async_trait]
pub trait FirewallSession: Send {
    async fn list_tables(&mut self, family: TableFamily) -> Result<Vec<Table>, DomainError>;

    async fn add_table(&mut self, table: Table) -> Result<Table, DomainError>;

    async fn list_sets(&mut self, table: &Table) -> Result<Vec<SetDescriptor>, DomainError>;

    async fn add_set(&mut self, set: SetDescriptor) -> Result<SetDescriptor, DomainError>;

    async fn add_set_elements(
        &mut self,
        set: &SetDescriptor,
        elements: &[SetElement],
    ) -> Result<(), DomainError>;

    /// Push every pending mutation to the packet filter.
    async fn flush(&mut self) -> Result<(), DomainError>;

    async fn close(self: Box<Self>) -> Result<(), DomainError>;
}
