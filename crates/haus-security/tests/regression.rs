#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Regression tests for haus-security: SafetyPolicy, JsonlEventSink,
//! MemoryEventSink.

use haus_core::{
    ActivityKind, ActivityRecord, HausError, TransactionKind, TransactionRecord, TransactionStatus,
};
use haus_security::{EventSink, JsonlEventSink, MemoryEventSink, SafetyPolicy, SpendIntent};

const DEST: &str = "0x2222222222222222222222222222222222222222";

fn record(hash: &str) -> TransactionRecord {
    TransactionRecord {
        hash: hash.into(),
        kind: TransactionKind::Send,
        status: TransactionStatus::Pending,
        description: "Sent 1 CELO".into(),
        amount: Some(1.0),
        currency: Some("CELO".into()),
        to: Some(DEST.into()),
    }
}

// --- SafetyPolicy ---

#[test]
fn test_running_total_across_commits() {
    let mut policy = SafetyPolicy::new(10.0, 6.0);
    let intent = SpendIntent::new(4.0, "CELO").to(DEST);

    policy.check(&intent).unwrap();
    policy.commit(4.0);
    policy.check(&intent).unwrap();
    policy.commit(4.0);

    let err = policy.check(&intent).unwrap_err();
    assert!(matches!(err, HausError::Safety(_)));
    assert!((policy.remaining() - 2.0).abs() < 1e-9);
}

#[test]
fn test_exact_limit_is_allowed() {
    let mut policy = SafetyPolicy::new(0.3, 0.3);
    policy.commit(0.1);
    policy.commit(0.1);
    assert!(policy.check(&SpendIntent::new(0.1, "CELO")).is_ok());
}

#[test]
fn test_blocklist_wins_over_amount() {
    let policy = SafetyPolicy::default().with_blocked([DEST.to_uppercase().replace("0X", "0x")]);
    let err = policy
        .check(&SpendIntent::new(0.0, "CELO").to(DEST))
        .unwrap_err();
    assert!(err.to_string().contains("blocked"));
}

#[test]
fn test_policy_from_toml_fills_defaults() {
    let policy: SafetyPolicy = toml::from_str("spending_used = 12.5").unwrap();
    assert_eq!(policy.spending_used, 12.5);
    assert_eq!(policy.spending_limit, 100.0);
    assert_eq!(policy.max_transaction_amount, 50.0);
    assert!(!policy.require_confirmation);
    assert_eq!(policy.blocked_addresses().count(), 0);
}

#[test]
fn test_with_confirmation_keeps_limits() {
    let policy = SafetyPolicy::new(20.0, 5.0)
        .with_blocked([DEST])
        .with_confirmation(true);
    assert!(policy.require_confirmation);
    assert_eq!(policy.spending_limit, 20.0);
    assert!(policy.is_blocked(DEST));
    assert!(!policy.with_confirmation(false).require_confirmation);
}

// --- JsonlEventSink ---

#[tokio::test]
async fn test_jsonl_sink_writes_events() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("activity");
    let sink = JsonlEventSink::new(log_dir.clone());

    sink.record_transaction("agent-7", record("0xfeed"));
    sink.log_activity(
        "agent-7",
        ActivityRecord::new(
            ActivityKind::Action,
            "Sent 1 CELO",
            serde_json::json!({"txHash": "0xfeed"}),
        ),
    );

    // Give the background task time to write
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let contents = tokio::fs::read_to_string(log_dir.join("activity.jsonl"))
        .await
        .unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "transaction");
    assert_eq!(lines[0]["agent_id"], "agent-7");
    assert_eq!(lines[0]["record"]["hash"], "0xfeed");
    assert_eq!(lines[1]["event"], "activity");
    assert_eq!(lines[1]["record"]["kind"], "action");
}

#[tokio::test]
async fn test_jsonl_sink_appends() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().to_path_buf();

    let first = JsonlEventSink::new(log_dir.clone());
    first.record_transaction("a", record("0x01"));
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let second = JsonlEventSink::new(log_dir.clone());
    second.record_transaction("a", record("0x02"));
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let contents = tokio::fs::read_to_string(log_dir.join("activity.jsonl"))
        .await
        .unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("0x01"));
    assert!(contents.contains("0x02"));
}

// --- MemoryEventSink ---

#[test]
fn test_memory_sink_splits_events() {
    let sink = MemoryEventSink::new();
    sink.record_transaction("a", record("0x01"));
    sink.log_activity(
        "a",
        ActivityRecord::new(ActivityKind::Info, "hello", serde_json::Value::Null),
    );

    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.transactions()[0].hash, "0x01");
    assert_eq!(sink.activities()[0].message, "hello");
}
