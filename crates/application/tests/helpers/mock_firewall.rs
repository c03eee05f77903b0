#![allow(dead_code)]

use async_trait::async_trait;
use ferrous_nftset_application::ports::{FirewallEngine, FirewallSession, ResponseWriter};
use ferrous_nftset_domain::{
    AnswerRecord, DomainError, SetDescriptor, SetElement, Table, TableFamily,
};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything the mock packet filter saw, shared by all sessions it opened.
#[derive(Default)]
pub struct MockFirewallState {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub flushes: AtomicUsize,
    pub list_tables_calls: AtomicUsize,
    pub list_sets_calls: AtomicUsize,
    pub add_table_calls: AtomicUsize,
    pub add_set_calls: AtomicUsize,
    pub add_element_calls: AtomicUsize,

    pub fail_connect: AtomicBool,
    pub fail_list_tables: AtomicBool,
    pub fail_list_sets: AtomicBool,
    pub fail_add_elements: AtomicBool,
    pub fail_flush: AtomicBool,

    tables: Mutex<Vec<Table>>,
    sets: Mutex<Vec<SetDescriptor>>,
    committed: Mutex<Vec<(TableFamily, String, String, IpAddr)>>,
    events: Arc<Mutex<Vec<String>>>,
    element_delay: Mutex<Option<Duration>>,
}

#[derive(Clone, Default)]
pub struct MockFirewallEngine {
    pub state: Arc<MockFirewallState>,
}

impl MockFirewallEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, family: TableFamily, name: &str) -> Self {
        self.state.tables.lock().unwrap().push(Table::new(family, name));
        self
    }

    pub fn with_set(self, set: SetDescriptor) -> Self {
        self.state.sets.lock().unwrap().push(set);
        self
    }

    pub fn set_element_delay(&self, delay: Duration) {
        *self.state.element_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_list_tables(&self, fail: bool) {
        self.state.fail_list_tables.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_list_sets(&self, fail: bool) {
        self.state.fail_list_sets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_add_elements(&self, fail: bool) {
        self.state.fail_add_elements.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_flush(&self, fail: bool) {
        self.state.fail_flush.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.state.flushes.load(Ordering::SeqCst)
    }

    pub fn list_tables_calls(&self) -> usize {
        self.state.list_tables_calls.load(Ordering::SeqCst)
    }

    pub fn list_sets_calls(&self) -> usize {
        self.state.list_sets_calls.load(Ordering::SeqCst)
    }

    pub fn add_table_calls(&self) -> usize {
        self.state.add_table_calls.load(Ordering::SeqCst)
    }

    pub fn add_set_calls(&self) -> usize {
        self.state.add_set_calls.load(Ordering::SeqCst)
    }

    pub fn add_element_calls(&self) -> usize {
        self.state.add_element_calls.load(Ordering::SeqCst)
    }

    /// Elements that made it through a flush, as (family, table, set, address).
    pub fn committed(&self) -> Vec<(TableFamily, String, String, IpAddr)> {
        self.state.committed.lock().unwrap().clone()
    }

    pub fn committed_in(&self, family: TableFamily, table: &str, set: &str) -> Vec<IpAddr> {
        self.committed()
            .into_iter()
            .filter(|(f, t, s, _)| *f == family && t == table && s == set)
            .map(|(_, _, _, addr)| addr)
            .collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.state.events.lock().unwrap().clone()
    }

    pub fn event_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.state.events)
    }

    fn record(&self, event: impl Into<String>) {
        self.state.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl FirewallEngine for MockFirewallEngine {
    async fn connect(&self) -> Result<Box<dyn FirewallSession>, DomainError> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(DomainError::EngineConnect("mock connect failure".to_string()));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.record("connect");
        Ok(Box::new(MockSession {
            engine: self.clone(),
            pending: Vec::new(),
        }))
    }
}

pub struct MockSession {
    engine: MockFirewallEngine,
    pending: Vec<(TableFamily, String, String, IpAddr)>,
}

#[async_trait]
impl FirewallSession for MockSession {
    async fn list_tables(&mut self, family: TableFamily) -> Result<Vec<Table>, DomainError> {
        let state = &self.engine.state;
        state.list_tables_calls.fetch_add(1, Ordering::SeqCst);
        if state.fail_list_tables.load(Ordering::SeqCst) {
            return Err(DomainError::EngineCommand("mock list tables failure".to_string()));
        }
        Ok(state
            .tables
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.family == family)
            .cloned()
            .collect())
    }

    async fn add_table(&mut self, table: Table) -> Result<Table, DomainError> {
        let state = &self.engine.state;
        state.add_table_calls.fetch_add(1, Ordering::SeqCst);
        state.tables.lock().unwrap().push(table.clone());
        Ok(table)
    }

    async fn list_sets(&mut self, table: &Table) -> Result<Vec<SetDescriptor>, DomainError> {
        let state = &self.engine.state;
        state.list_sets_calls.fetch_add(1, Ordering::SeqCst);
        if state.fail_list_sets.load(Ordering::SeqCst) {
            return Err(DomainError::EngineCommand("mock list sets failure".to_string()));
        }
        Ok(state
            .sets
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.table.family == table.family && s.table.name == table.name)
            .cloned()
            .collect())
    }

    async fn add_set(&mut self, set: SetDescriptor) -> Result<SetDescriptor, DomainError> {
        let state = &self.engine.state;
        state.add_set_calls.fetch_add(1, Ordering::SeqCst);
        state.sets.lock().unwrap().push(set.clone());
        Ok(set)
    }

    async fn add_set_elements(
        &mut self,
        set: &SetDescriptor,
        elements: &[SetElement],
    ) -> Result<(), DomainError> {
        let delay = *self.engine.state.element_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = &self.engine.state;
        state.add_element_calls.fetch_add(1, Ordering::SeqCst);
        if state.fail_add_elements.load(Ordering::SeqCst) {
            return Err(DomainError::EngineCommand("mock add element failure".to_string()));
        }
        for element in elements {
            self.pending.push((
                set.table.family,
                set.table.name.clone(),
                set.name.clone(),
                element.address,
            ));
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DomainError> {
        let state = &self.engine.state;
        state.flushes.fetch_add(1, Ordering::SeqCst);
        if state.fail_flush.load(Ordering::SeqCst) {
            self.pending.clear();
            return Err(DomainError::EngineFlush("mock flush failure".to_string()));
        }
        let pending = std::mem::take(&mut self.pending);
        state.committed.lock().unwrap().extend(pending);
        self.engine.record("flush");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DomainError> {
        self.engine.state.closes.fetch_add(1, Ordering::SeqCst);
        self.engine.record("close");
        Ok(())
    }
}

/// Records each write into the shared event log so tests can check ordering
/// against flushes.
pub struct MockResponseWriter {
    events: Arc<Mutex<Vec<String>>>,
    writes: Arc<AtomicUsize>,
    fail: bool,
}

impl MockResponseWriter {
    pub fn new(events: Arc<Mutex<Vec<String>>>) -> (Self, Arc<AtomicUsize>) {
        let writes = Arc::new(AtomicUsize::new(0));
        (
            Self {
                events,
                writes: Arc::clone(&writes),
                fail: false,
            },
            writes,
        )
    }

    pub fn failing(events: Arc<Mutex<Vec<String>>>) -> (Self, Arc<AtomicUsize>) {
        let (mut writer, writes) = Self::new(events);
        writer.fail = true;
        (writer, writes)
    }
}

#[async_trait]
impl ResponseWriter for MockResponseWriter {
    async fn write_response(&mut self) -> Result<(), DomainError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push("write".to_string());
        if self.fail {
            return Err(DomainError::IoError("mock write failure".to_string()));
        }
        Ok(())
    }
}

pub fn a(name: &str, addr: &str) -> AnswerRecord {
    AnswerRecord::a(name, addr.parse().unwrap())
}

pub fn aaaa(name: &str, addr: &str) -> AnswerRecord {
    AnswerRecord::aaaa(name, addr.parse().unwrap())
}

pub fn ip(addr: &str) -> IpAddr {
    addr.parse().unwrap()
}
