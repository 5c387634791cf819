//! # Audit Trail
//!
//! Append-only log of every mutating action performed by the engine.
//!
//! The [`ResourceActor`](crate::framework::ResourceActor) appends exactly one entry per
//! successful create, update or action, *before* the new state is committed and before the
//! caller is acknowledged. Reads and rejected mutations never produce an entry.
//!
//! The sink is synchronous: the actor replies only after `append` returned. [`InMemoryAuditLog`]
//! is the default sink; a database-backed sink only has to implement [`AuditSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::framework::TenantId;

/// An audit event as emitted by an actor, before the sink stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor: String,
    pub tenant_id: TenantId,
    /// Dotted action name, e.g. `delivery.start`.
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub before: Value,
    pub after: Value,
    pub metadata: Value,
}

/// A stored audit entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: AuditRecord,
}

/// Errors raised by an audit sink.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuditError {
    #[error("Audit log unavailable: {0}")]
    Unavailable(String),
}

/// Receives audit events. Implementations must persist the record before returning `Ok`.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, AuditError>;
}

/// In-memory, append-only audit log.
///
/// Sequence numbers start at 1. `recorded_at` never goes backwards even if the wall clock
/// does, so entries for one entity are totally ordered by server timestamp.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Entries for a single entity, oldest first.
    pub fn entries_for(&self, entity_type: &str, entity_id: &str) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.record.entity_type == entity_type && e.record.entity_id == entity_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, AuditError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?;

        let now = Utc::now();
        let recorded_at = match entries.last() {
            Some(last) if last.recorded_at > now => last.recorded_at,
            _ => now,
        };
        let entry = AuditEntry {
            sequence: entries.len() as u64 + 1,
            recorded_at,
            record,
        };
        debug!(
            sequence = entry.sequence,
            action = %entry.record.action,
            entity_id = %entry.record.entity_id,
            "Audit entry appended"
        );
        entries.push(entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(entity_id: &str, action: &str) -> AuditRecord {
        AuditRecord {
            actor: "driver-7".to_string(),
            tenant_id: TenantId::new("kitchen-north"),
            action: action.to_string(),
            entity_type: "Delivery".to_string(),
            entity_id: entity_id.to_string(),
            before: json!({ "status": "ASSIGNED" }),
            after: json!({ "status": "DEPARTED" }),
            metadata: Value::Null,
        }
    }

    #[test]
    fn test_sequence_and_timestamps_are_monotonic() {
        let log = InMemoryAuditLog::new();
        let first = log.append(record("d1", "delivery.start")).unwrap();
        let second = log.append(record("d2", "delivery.start")).unwrap();
        let third = log.append(record("d1", "delivery.arrive")).unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(third.sequence, 3);
        assert!(first.recorded_at <= second.recorded_at);
        assert!(second.recorded_at <= third.recorded_at);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_entries_for_filters_by_entity() {
        let log = InMemoryAuditLog::new();
        log.append(record("d1", "delivery.start")).unwrap();
        log.append(record("d2", "delivery.start")).unwrap();
        log.append(record("d1", "delivery.arrive")).unwrap();

        let actions: Vec<String> = log
            .entries_for("Delivery", "d1")
            .into_iter()
            .map(|e| e.record.action)
            .collect();
        assert_eq!(actions, vec!["delivery.start", "delivery.arrive"]);
        assert!(log.entries_for("Execution", "d1").is_empty());
    }
}
