mod helpers;

use ferrous_nftset_application::services::{
    ConnectionPool, PoolSettings, RuleTable, SetElementRule,
};
use ferrous_nftset_application::use_cases::{
    DispatchAnswersUseCase, MirrorOutcome, MirrorResponseUseCase,
};
use ferrous_nftset_domain::{AnswerData, AnswerRecord, DispatchMode, SetKeyType, TableFamily};
use helpers::{a, ip, MockFirewallEngine, MockResponseWriter};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn make_mirror(engine: &MockFirewallEngine, mode: DispatchMode) -> MirrorResponseUseCase {
    let pool = Arc::new(ConnectionPool::new(
        Arc::new(engine.clone()),
        PoolSettings::default(),
    ));
    let rules = RuleTable::new().with_rule(
        TableFamily::Inet,
        Arc::new(SetElementRule::new("filter", "resolved", SetKeyType::Ipv4Addr)),
    );
    MirrorResponseUseCase::new(Arc::new(DispatchAnswersUseCase::new(pool, rules)), mode)
}

fn server() -> Arc<str> {
    Arc::from("upstream")
}

/// Writes and flushes, in the order they happened.
fn write_flush_order(engine: &MockFirewallEngine) -> Vec<String> {
    engine
        .events()
        .into_iter()
        .filter(|e| e == "write" || e == "flush")
        .collect()
}

// ── pass-through ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_response_without_addresses_is_written_directly() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Sync);
    let (writer, writes) = MockResponseWriter::new(engine.event_log());

    let answers = vec![AnswerRecord::new("example.com", AnswerData::Other(16))];
    let outcome = mirror.execute(answers, server(), writer).await.unwrap();

    assert_eq!(outcome, MirrorOutcome::PassedThrough);
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(engine.connects(), 0);
}

#[tokio::test]
async fn test_empty_answer_section_is_written_directly() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Async);
    let (writer, writes) = MockResponseWriter::new(engine.event_log());

    let outcome = mirror.execute(Vec::new(), server(), writer).await.unwrap();

    assert_eq!(outcome, MirrorOutcome::PassedThrough);
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.background_len(), 0);
}

// ── sync mode ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sync_mode_flushes_before_writing() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Sync);
    let (writer, writes) = MockResponseWriter::new(engine.event_log());

    let outcome = mirror
        .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
        .await
        .unwrap();

    assert_eq!(outcome, MirrorOutcome::Dispatched);
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(write_flush_order(&engine), vec!["flush", "write"]);
    assert_eq!(
        engine.committed_in(TableFamily::Inet, "filter", "resolved"),
        vec![ip("1.2.3.4")]
    );
}

#[tokio::test]
async fn test_sync_mode_writes_even_when_dispatch_fails() {
    let engine = MockFirewallEngine::new();
    engine.set_fail_connect(true);
    let mirror = make_mirror(&engine, DispatchMode::Sync);
    let (writer, writes) = MockResponseWriter::new(engine.event_log());

    let outcome = mirror
        .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
        .await
        .unwrap();

    assert_eq!(outcome, MirrorOutcome::Dispatched);
    assert_eq!(writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sync_mode_returns_write_error() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Sync);
    let (writer, _) = MockResponseWriter::failing(engine.event_log());

    let result = mirror
        .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
        .await;

    assert!(result.is_err());
    // Rules were applied before the write was attempted.
    assert_eq!(engine.committed().len(), 1);
}

// ── async mode ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_async_mode_writes_before_flushing() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Async);
    let (writer, writes) = MockResponseWriter::new(engine.event_log());

    let outcome = mirror
        .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
        .await
        .unwrap();
    assert_eq!(outcome, MirrorOutcome::Deferred);
    assert_eq!(writes.load(Ordering::SeqCst), 1);

    mirror.wait_background().await;

    assert_eq!(write_flush_order(&engine), vec!["write", "flush"]);
    assert_eq!(
        engine.committed_in(TableFamily::Inet, "filter", "resolved"),
        vec![ip("1.2.3.4")]
    );
}

#[tokio::test]
async fn test_async_mode_dispatches_even_when_write_fails() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Async);
    let (writer, _) = MockResponseWriter::failing(engine.event_log());

    let result = mirror
        .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
        .await;
    assert!(result.is_err());

    mirror.wait_background().await;
    assert_eq!(engine.committed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_async_dispatch_outlives_request_task() {
    let engine = MockFirewallEngine::new();
    engine.set_element_delay(Duration::from_millis(50));
    let mirror = Arc::new(make_mirror(&engine, DispatchMode::Async));
    let (writer, writes) = MockResponseWriter::new(engine.event_log());

    let request = {
        let mirror = Arc::clone(&mirror);
        tokio::spawn(async move {
            mirror
                .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
                .await
        })
    };
    let outcome = request.await.unwrap().unwrap();
    assert_eq!(outcome, MirrorOutcome::Deferred);
    assert_eq!(writes.load(Ordering::SeqCst), 1);

    mirror.wait_background().await;
    assert_eq!(engine.committed().len(), 1);
}

#[tokio::test]
async fn test_set_mode_switches_dispatch_order() {
    let engine = MockFirewallEngine::new();
    let mirror = make_mirror(&engine, DispatchMode::Sync);
    assert_eq!(mirror.mode(), DispatchMode::Sync);

    mirror.set_mode(DispatchMode::Async);
    assert_eq!(mirror.mode(), DispatchMode::Async);

    let (writer, _) = MockResponseWriter::new(engine.event_log());
    let outcome = mirror
        .execute(vec![a("example.com", "1.2.3.4")], server(), writer)
        .await
        .unwrap();
    assert_eq!(outcome, MirrorOutcome::Deferred);
    mirror.wait_background().await;
}
