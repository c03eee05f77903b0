use super::executor::{NftExecutor, ProcessExecutor};
use super::{json, script};
use async_trait::async_trait;
use ferrous_nftset_application::ports::{FirewallEngine, FirewallSession};
use ferrous_nftset_domain::{DomainError, SetDescriptor, SetElement, Table, TableFamily};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the packet filter through the `nft` command line tool.
pub struct NftCommandEngine {
    executor: Arc<dyn NftExecutor>,
}

impl NftCommandEngine {
    pub fn new(executor: Arc<dyn NftExecutor>) -> Self {
        Self { executor }
    }

    pub fn with_binary(binary: &str) -> Self {
        Self::new(Arc::new(ProcessExecutor::new(binary)))
    }
}

#[async_trait]
impl FirewallEngine for NftCommandEngine {
    async fn connect(&self) -> Result<Box<dyn FirewallSession>, DomainError> {
        let version = self
            .executor
            .run(&["--version"], None)
            .await
            .map_err(|e| match e {
                DomainError::EngineCommand(msg) => DomainError::EngineConnect(msg),
                other => other,
            })?;
        debug!(version = version.trim(), "Nftables session opened");

        Ok(Box::new(NftSession {
            executor: Arc::clone(&self.executor),
            pending: Vec::new(),
        }))
    }
}

/// One logical connection: reads go straight to `nft`, mutations are
/// batched and applied atomically on `flush`.
pub struct NftSession {
    executor: Arc<dyn NftExecutor>,
    pending: Vec<String>,
}

#[async_trait]
impl FirewallSession for NftSession {
    async fn list_tables(&mut self, family: TableFamily) -> Result<Vec<Table>, DomainError> {
        let output = self
            .executor
            .run(&["-j", "list", "tables", family.as_str()], None)
            .await?;
        json::parse_tables(&output, family)
    }

    async fn add_table(&mut self, table: Table) -> Result<Table, DomainError> {
        self.pending.push(script::add_table(&table));
        Ok(table)
    }

    async fn list_sets(&mut self, table: &Table) -> Result<Vec<SetDescriptor>, DomainError> {
        let output = self
            .executor
            .run(
                &["-j", "-t", "list", "table", table.family.as_str(), &table.name],
                None,
            )
            .await?;
        json::parse_sets(&output, table)
    }

    async fn add_set(&mut self, set: SetDescriptor) -> Result<SetDescriptor, DomainError> {
        self.pending.push(script::add_set(&set));
        Ok(set)
    }

    async fn add_set_elements(
        &mut self,
        set: &SetDescriptor,
        elements: &[SetElement],
    ) -> Result<(), DomainError> {
        if let Some(statement) = script::add_elements(set, elements) {
            self.pending.push(statement);
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DomainError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let statements = std::mem::take(&mut self.pending);
        let batch = script::batch(&statements);
        self.executor
            .run(&["-f", "-"], Some(&batch))
            .await
            .map_err(|e| DomainError::EngineFlush(e.to_string()))?;

        info!(statements = statements.len(), "Nftables batch applied");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DomainError> {
        if !self.pending.is_empty() {
            warn!(
                statements = self.pending.len(),
                "Nftables session closed with unflushed statements"
            );
        }
        Ok(())
    }
}
