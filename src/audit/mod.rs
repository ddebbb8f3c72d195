//! Audit trail side channel. Services emit events synchronously; a background
//! worker persists them. A failed write is logged and never reaches the caller.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::audit_log::AuditEvent;

/// Receives audit events. Emission never blocks and never fails the caller.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Durable destination for audit events.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    async fn write(&self, event: &AuditEvent) -> Result<(), DatabaseError>;
}

pub struct PgAuditWriter {
    db: DatabaseManager,
}

impl PgAuditWriter {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditWriter for PgAuditWriter {
    async fn write(&self, event: &AuditEvent) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (user_id, action, table_name, record_id, old_values, new_values, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.actor_id)
        .bind(event.action.as_str())
        .bind(&event.table_name)
        .bind(event.record_id)
        .bind(&event.old_values)
        .bind(&event.new_values)
        .bind(&event.ip)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

/// Writes each event to the `kmci_api::audit` log target instead of a table.
pub struct LogAuditWriter;

#[async_trait]
impl AuditWriter for LogAuditWriter {
    async fn write(&self, event: &AuditEvent) -> Result<(), DatabaseError> {
        info!(
            target: "kmci_api::audit",
            action = event.action.as_str(),
            table = %event.table_name,
            record_id = ?event.record_id,
            actor = ?event.actor_id,
            ip = ?event.ip,
            "audit event"
        );
        Ok(())
    }
}

/// Queues events on an unbounded channel drained by a spawned worker.
pub struct ChannelAuditSink {
    sender: mpsc::UnboundedSender<AuditEvent>,
}

impl ChannelAuditSink {
    /// Starts the worker. It exits once every sender has been dropped and the
    /// queue is drained.
    pub fn spawn(writer: Arc<dyn AuditWriter>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AuditEvent>();

        let worker = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let Err(err) = writer.write(&event).await {
                    error!(
                        action = event.action.as_str(),
                        table = %event.table_name,
                        record_id = ?event.record_id,
                        error = %err,
                        "failed to write audit event"
                    );
                }
            }
            debug!("audit worker stopped");
        });

        (Self { sender }, worker)
    }
}

impl AuditSink for ChannelAuditSink {
    fn emit(&self, event: AuditEvent) {
        if let Err(err) = self.sender.send(event) {
            error!(action = err.0.action.as_str(), "audit worker is gone; event dropped");
        }
    }
}

/// Drops every event. Used when audit logging is switched off.
pub struct DisabledAuditSink;

impl AuditSink for DisabledAuditSink {
    fn emit(&self, event: AuditEvent) {
        debug!(action = event.action.as_str(), table = %event.table_name, "audit logging disabled");
    }
}

/// Keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::audit_log::{AuditAction, AuditActor};
    use uuid::Uuid;

    struct RecordingWriter {
        fail: bool,
        written: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditWriter for RecordingWriter {
        async fn write(&self, event: &AuditEvent) -> Result<(), DatabaseError> {
            if self.fail {
                return Err(DatabaseError::QueryError("audit_logs unavailable".to_string()));
            }
            self.written.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn event() -> AuditEvent {
        AuditEvent::new(&AuditActor::user(Uuid::new_v4()), AuditAction::Delete, "products", Some(Uuid::new_v4()))
    }

    #[tokio::test]
    async fn worker_drains_queue_into_writer() {
        let writer = Arc::new(RecordingWriter { fail: false, written: Mutex::new(vec![]) });
        let (sink, worker) = ChannelAuditSink::spawn(writer.clone());
        sink.emit(event());
        sink.emit(event());
        drop(sink);
        worker.await.unwrap();
        assert_eq!(writer.written.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn writer_failures_stay_inside_the_worker() {
        let writer = Arc::new(RecordingWriter { fail: true, written: Mutex::new(vec![]) });
        let (sink, worker) = ChannelAuditSink::spawn(writer);
        sink.emit(event());
        drop(sink);
        assert!(worker.await.is_ok());
    }

    #[tokio::test]
    async fn log_writer_accepts_every_event() {
        let (sink, worker) = ChannelAuditSink::spawn(Arc::new(LogAuditWriter));
        for _ in 0..3 {
            sink.emit(event());
        }
        drop(sink);
        assert!(worker.await.is_ok());
    }

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemoryAuditSink::new();
        let first = event();
        sink.emit(first.clone());
        sink.emit(event());
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], first);
    }
}
