use super::connection_pool::PooledConnection;
use crate::ports::{ApplyOutcome, RuleApplier};
use async_trait::async_trait;
use ferrous_nftset_domain::{
    AnswerRecord, DomainError, SetDescriptor, SetElement, SetFlags, SetKeyType, SetRuleConfig,
    TableFamily,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Adds every resolved address of a matching kind to one named set.
#[derive(Debug, Clone)]
pub struct SetElementRule {
    table: String,
    set: String,
    key_type: SetKeyType,
    element_timeout: Option<Duration>,
    auto_create_set: bool,
    interval: bool,
}

impl SetElementRule {
    pub fn new(table: &str, set: &str, key_type: SetKeyType) -> Self {
        Self {
            table: table.to_string(),
            set: set.to_string(),
            key_type,
            element_timeout: None,
            auto_create_set: true,
            interval: false,
        }
    }

    pub fn from_config(config: &SetRuleConfig) -> Self {
        Self {
            table: config.table.clone(),
            set: config.set.clone(),
            key_type: config.effective_key_type(),
            element_timeout: config.element_timeout(),
            auto_create_set: config.auto_create_set,
            interval: config.interval,
        }
    }

    pub fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = Some(timeout);
        self
    }

    pub fn without_auto_create(mut self) -> Self {
        self.auto_create_set = false;
        self
    }

    pub fn key_type(&self) -> SetKeyType {
        self.key_type
    }

    /// Find the target set through the connection's metadata cache, listing
    /// the table's sets once and creating the set when allowed.
    async fn resolve_set(
        &self,
        conn: &mut PooledConnection,
        family: TableFamily,
    ) -> Result<SetDescriptor, DomainError> {
        let (session, metadata) = conn.parts_mut();
        let table = metadata.resolve_table(session, family, &self.table).await?;

        if let Some(set) = table.set(&self.set) {
            return Ok(set.clone());
        }

        if !table.sets_listed() {
            // Listed at most once, failed or not. A table added by this
            // session has nothing to list yet.
            if !table.is_created() {
                match session.list_sets(&table.table).await {
                    Ok(sets) => {
                        debug!(table = %table.table, count = sets.len(), "Nftables set(s) found");
                        for set in sets {
                            table.insert_set(set);
                        }
                    }
                    Err(e) => {
                        warn!(table = %table.table, error = %e, "Nftables list sets failed");
                    }
                }
            }
            table.mark_sets_listed();

            if let Some(set) = table.set(&self.set) {
                return Ok(set.clone());
            }
        }

        if !self.auto_create_set {
            return Err(DomainError::SetNotFound {
                family: family.to_string(),
                table: self.table.clone(),
                set: self.set.clone(),
            });
        }

        debug!(table = %table.table, set = %self.set, "Nftables try to create set");
        let created = session
            .add_set(SetDescriptor {
                table: table.table.clone(),
                name: self.set.clone(),
                key_type: self.key_type,
                flags: SetFlags {
                    timeout: self.element_timeout.is_some(),
                    interval: self.interval,
                },
            })
            .await?;

        Ok(table.insert_set(created).clone())
    }
}

#[async_trait]
impl RuleApplier for SetElementRule {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn set_name(&self) -> &str {
        &self.set
    }

    async fn apply(
        &self,
        conn: &mut PooledConnection,
        family: TableFamily,
        record: &AnswerRecord,
    ) -> Result<ApplyOutcome, DomainError> {
        let Some(address) = record.address() else {
            return Ok(ApplyOutcome::Ignored);
        };

        if !self.key_type.accepts(&address) {
            return Ok(ApplyOutcome::Ignored);
        }

        let set = self.resolve_set(conn, family).await?;
        if !set.key_type.accepts(&address) {
            debug!(
                address = %address,
                set = %set,
                key_type = set.key_type.as_str(),
                "Nftables set key type does not fit address"
            );
            return Ok(ApplyOutcome::Ignored);
        }

        let element = SetElement::new(address).with_timeout(self.element_timeout);
        if let Err(e) = conn
            .session_mut()
            .add_set_elements(&set, std::slice::from_ref(&element))
            .await
        {
            conn.mark_unhealthy();
            return Err(e);
        }

        debug!(address = %address, name = %record.name, set = %set, "Nftables element queued");
        Ok(ApplyOutcome::Applied)
    }
}
