//! Observability capabilities: metrics, structured log, decision receipts.
//!
//! The engine performs no batching or deferred flushing; each emission is a
//! single synchronous call. Sinks are assumed individually thread-safe at
//! the collaborator boundary.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use memory::{InMemoryLogger, InMemoryMetrics, InMemoryReceipts};

/// Monotonic counters keyed by `"{entity_id}:{status_or_mode}"` labels.
pub trait Metrics: Send + Sync {
    fn increment_counter(&self, name: &str, label: &str);
    fn get_counter(&self, name: &str, label: &str) -> u64;
}

/// One structured log entry: operation plus outcome, nothing more imposed.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub operation: String,
    pub outcome: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(
        at: DateTime<Utc>,
        operation: impl Into<String>,
        outcome: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            at,
            operation: operation.into(),
            outcome: outcome.into(),
            message: message.into(),
        }
    }
}

/// Append-only structured log sink.
pub trait Logger: Send + Sync {
    fn log(&self, entry: LogEntry);
}

/// Decision types for which receipts are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    BackupCompleted,
    RestoreCompleted,
    DrScenarioRegistered,
    DrDrillCompleted,
    FailoverCompleted,
}

impl DecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::BackupCompleted => "backup_completed",
            DecisionType::RestoreCompleted => "restore_completed",
            DecisionType::DrScenarioRegistered => "dr_scenario_registered",
            DecisionType::DrDrillCompleted => "dr_drill_completed",
            DecisionType::FailoverCompleted => "failover_completed",
        }
    }
}

/// Outcome recorded on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionResult {
    Success,
    Failure,
}

impl DecisionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionResult::Success => "SUCCESS",
            DecisionResult::Failure => "FAILURE",
        }
    }
}

/// Audit record of one engine decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionReceipt {
    pub receipt_id: Uuid,
    pub decision_type: DecisionType,
    pub result: DecisionResult,
    pub metadata: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}

/// Evidence/receipt ledger.
///
/// One receipt per externally visible operation outcome, success or
/// failure, never omitted. Signing and persistence are ledger concerns.
pub trait Receipts: Send + Sync {
    fn emit(
        &self,
        decision_type: DecisionType,
        result: DecisionResult,
        metadata: serde_json::Value,
    ) -> DecisionReceipt;
}
