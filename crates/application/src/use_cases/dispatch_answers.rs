use crate::ports::ApplyOutcome;
use crate::services::{ConnectionPool, PooledConnection, RuleTable};
use arc_swap::ArcSwap;
use ferrous_nftset_domain::{AnswerRecord, DomainError, TableFamily};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// What happened to the address records of one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Records fanned out to the rule appliers.
    pub dispatched: usize,
    /// Records skipped by the recency cache.
    pub ignored: usize,
    /// Dispatched records whose pass succeeded and were recorded.
    pub recorded: usize,
    /// Dispatched records with at least one failed applier.
    pub failed: usize,
}

/// Mirrors the A/AAAA answers of one response into the packet filter.
pub struct DispatchAnswersUseCase {
    pool: Arc<ConnectionPool>,
    rules: ArcSwap<RuleTable>,
}

impl DispatchAnswersUseCase {
    pub fn new(pool: Arc<ConnectionPool>, rules: RuleTable) -> Self {
        info!(rules = rules.len(), "Nftables dispatcher ready");
        Self {
            pool,
            rules: ArcSwap::from_pointee(rules),
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn rules(&self) -> Arc<RuleTable> {
        self.rules.load_full()
    }

    /// Atomically replace the rule table; passes already running keep the old one.
    pub fn replace_rules(&self, rules: RuleTable) {
        info!(rules = rules.len(), "Nftables rule table replaced");
        self.rules.store(Arc::new(rules));
    }

    /// Run one dispatch pass. `server` labels the metrics.
    pub async fn execute(
        &self,
        answers: &[AnswerRecord],
        server: &str,
    ) -> Result<DispatchSummary, DomainError> {
        let mut conn = self.pool.acquire().await?;
        let start = Instant::now();
        let rules = self.rules.load_full();
        let mut summary = DispatchSummary::default();

        for record in answers {
            dispatch_record(&mut conn, &rules, record, server, &mut summary).await;
        }

        self.pool.release(conn, None).await;

        histogram!("nftset_dispatch_duration_us", "server" => server.to_string())
            .record(start.elapsed().as_micros() as f64);

        Ok(summary)
    }
}

async fn dispatch_record(
    conn: &mut PooledConnection,
    rules: &RuleTable,
    record: &AnswerRecord,
    server: &str,
    summary: &mut DispatchSummary,
) {
    let Some(address) = record.address() else {
        return;
    };

    // Read once: this record's own update must not suppress its sibling families.
    if conn.recency_mut().should_ignore(&address) {
        debug!(
            address = %address,
            name = %record.name,
            "Ignore element because recency max retry times exceeded"
        );
        summary.ignored += 1;
        return;
    }

    counter!("nftset_record_total", "server" => server.to_string()).increment(1);
    summary.dispatched += 1;

    let mut has_error = false;
    let mut applied = 0usize;

    for &family in TableFamily::for_address(&address) {
        for rule in rules.appliers(family) {
            match rule.apply(conn, family, record).await {
                Ok(ApplyOutcome::Applied) => applied += 1,
                Ok(ApplyOutcome::Ignored) => {}
                Err(e) => {
                    has_error = true;
                    error!(
                        address = %address,
                        name = %record.name,
                        family = %family,
                        table = rule.table_name(),
                        set = rule.set_name(),
                        error = %e,
                        "Add element failed"
                    );
                }
            }
        }
    }

    if has_error {
        summary.failed += 1;
        return;
    }

    info!(address = %address, name = %record.name, applied, "Nftables apply rule(s) done");
    conn.recency_mut().record_apply(address, applied);
    summary.recorded += 1;
}
