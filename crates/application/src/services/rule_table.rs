use super::set_element_rule::SetElementRule;
use crate::ports::RuleApplier;
use ferrous_nftset_domain::{SetRuleConfig, TableFamily};
use std::collections::HashMap;
use std::sync::Arc;

/// Rule appliers grouped by the table family they act on, in configuration order.
#[derive(Default, Clone)]
pub struct RuleTable {
    rules: HashMap<TableFamily, Vec<Arc<dyn RuleApplier>>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(rules: &[SetRuleConfig]) -> Self {
        let mut table = Self::new();
        for rule in rules {
            table.push(rule.family, Arc::new(SetElementRule::from_config(rule)));
        }
        table
    }

    pub fn with_rule(mut self, family: TableFamily, rule: Arc<dyn RuleApplier>) -> Self {
        self.push(family, rule);
        self
    }

    pub fn push(&mut self, family: TableFamily, rule: Arc<dyn RuleApplier>) {
        self.rules.entry(family).or_default().push(rule);
    }

    pub fn appliers(&self, family: TableFamily) -> &[Arc<dyn RuleApplier>] {
        self.rules.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
