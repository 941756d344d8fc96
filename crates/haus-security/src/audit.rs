use chrono::{DateTime, Utc};
use haus_core::{ActivityRecord, TransactionRecord};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One event handed to a sink, tagged with the agent it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    /// A transaction submitted by a mutating skill.
    Transaction {
        /// Agent that submitted it.
        agent_id: String,
        /// When the sink received it.
        recorded_at: DateTime<Utc>,
        /// The transaction.
        record: TransactionRecord,
    },
    /// An activity feed line.
    Activity {
        /// Agent the line belongs to.
        agent_id: String,
        /// The line.
        record: ActivityRecord,
    },
}

/// Receiver for persistence events emitted after a mutating command runs.
///
/// Implementations must not block: the dispatcher calls these inline.
pub trait EventSink: Send + Sync {
    /// Stores a submitted transaction.
    fn record_transaction(&self, agent_id: &str, record: TransactionRecord);

    /// Appends a line to the agent's activity feed.
    fn log_activity(&self, agent_id: &str, record: ActivityRecord);
}

/// Append-only sink that writes one JSON object per line to
/// `<log_dir>/activity.jsonl` from a background task.
pub struct JsonlEventSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl JsonlEventSink {
    /// Must be called from within a tokio runtime.
    pub fn new(log_dir: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SinkEvent>();

        tokio::spawn(async move {
            if let Err(e) = tokio::fs::create_dir_all(&log_dir).await {
                warn!(error = %e, dir = %log_dir.display(), "Cannot create activity log dir");
                return;
            }
            let log_file = log_dir.join("activity.jsonl");
            let mut file = match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .await
            {
                Ok(f) => f,
                Err(e) => {
                    warn!(error = %e, file = %log_file.display(), "Cannot open activity log");
                    return;
                }
            };

            while let Some(event) = rx.recv().await {
                let Ok(line) = serde_json::to_string(&event) else {
                    continue;
                };
                let line = format!("{line}\n");
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    warn!(error = %e, "Activity log write failed");
                    continue;
                }
                let _ = file.flush().await;
            }
        });

        Self { tx }
    }

    fn send(&self, event: SinkEvent) {
        let _ = self.tx.send(event);
    }
}

impl EventSink for JsonlEventSink {
    fn record_transaction(&self, agent_id: &str, record: TransactionRecord) {
        info!(
            agent_id = %agent_id,
            tx_hash = %record.hash,
            kind = ?record.kind,
            status = ?record.status,
            "transaction recorded"
        );
        self.send(SinkEvent::Transaction {
            agent_id: agent_id.to_string(),
            recorded_at: Utc::now(),
            record,
        });
    }

    fn log_activity(&self, agent_id: &str, record: ActivityRecord) {
        info!(
            agent_id = %agent_id,
            kind = ?record.kind,
            message = %record.message,
            "activity logged"
        );
        self.send(SinkEvent::Activity {
            agent_id: agent_id.to_string(),
            record,
        });
    }
}

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemoryEventSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event so far, in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// Recorded transactions only.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Transaction { record, .. } => Some(record.clone()),
                SinkEvent::Activity { .. } => None,
            })
            .collect()
    }

    /// Activity lines only.
    pub fn activities(&self) -> Vec<ActivityRecord> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Activity { record, .. } => Some(record.clone()),
                SinkEvent::Transaction { .. } => None,
            })
            .collect()
    }
}

impl EventSink for MemoryEventSink {
    fn record_transaction(&self, agent_id: &str, record: TransactionRecord) {
        self.events.lock().push(SinkEvent::Transaction {
            agent_id: agent_id.to_string(),
            recorded_at: Utc::now(),
            record,
        });
    }

    fn log_activity(&self, agent_id: &str, record: ActivityRecord) {
        self.events.lock().push(SinkEvent::Activity {
            agent_id: agent_id.to_string(),
            record,
        });
    }
}
