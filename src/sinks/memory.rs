//! In-memory sink implementations for tests and local development.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::sinks::{
    DecisionReceipt, DecisionResult, DecisionType, LogEntry, Logger, Metrics, Receipts,
};

/// Counter sink backed by a map keyed on `(name, label)`.
#[derive(Default)]
pub struct InMemoryMetrics {
    counters: RwLock<HashMap<(String, String), u64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metrics for InMemoryMetrics {
    fn increment_counter(&self, name: &str, label: &str) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        *counters
            .entry((name.to_string(), label.to_string()))
            .or_insert(0) += 1;
    }

    fn get_counter(&self, name: &str, label: &str) -> u64 {
        self.counters
            .read()
            .expect("metrics lock poisoned")
            .get(&(name.to_string(), label.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

/// Append-only log sink.
#[derive(Default)]
pub struct InMemoryLogger {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().expect("logger lock poisoned").clone()
    }
}

impl Logger for InMemoryLogger {
    fn log(&self, entry: LogEntry) {
        self.entries.write().expect("logger lock poisoned").push(entry);
    }
}

/// Append-only receipt ledger.
#[derive(Default)]
pub struct InMemoryReceipts {
    receipts: RwLock<Vec<DecisionReceipt>>,
}

impl InMemoryReceipts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipts(&self) -> Vec<DecisionReceipt> {
        self.receipts.read().expect("receipts lock poisoned").clone()
    }

    /// Receipts of one decision type, in emission order.
    pub fn of_type(&self, decision_type: DecisionType) -> Vec<DecisionReceipt> {
        self.receipts
            .read()
            .expect("receipts lock poisoned")
            .iter()
            .filter(|r| r.decision_type == decision_type)
            .cloned()
            .collect()
    }
}

impl Receipts for InMemoryReceipts {
    fn emit(
        &self,
        decision_type: DecisionType,
        result: DecisionResult,
        metadata: serde_json::Value,
    ) -> DecisionReceipt {
        let receipt = DecisionReceipt {
            receipt_id: Uuid::new_v4(),
            decision_type,
            result,
            metadata,
            emitted_at: Utc::now(),
        };
        self.receipts
            .write()
            .expect("receipts lock poisoned")
            .push(receipt.clone());
        receipt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_label() {
        let metrics = InMemoryMetrics::new();
        metrics.increment_counter("bdr_backup_runs", "bp_a:success");
        metrics.increment_counter("bdr_backup_runs", "bp_a:success");
        metrics.increment_counter("bdr_backup_runs", "bp_a:failure");

        assert_eq!(metrics.get_counter("bdr_backup_runs", "bp_a:success"), 2);
        assert_eq!(metrics.get_counter("bdr_backup_runs", "bp_a:failure"), 1);
        assert_eq!(metrics.get_counter("bdr_backup_runs", "bp_b:success"), 0);
    }

    #[test]
    fn receipts_are_append_only() {
        let receipts = InMemoryReceipts::new();
        receipts.emit(
            DecisionType::BackupCompleted,
            DecisionResult::Success,
            serde_json::json!({"plan_id": "bp_a"}),
        );
        receipts.emit(
            DecisionType::RestoreCompleted,
            DecisionResult::Failure,
            serde_json::json!({}),
        );

        assert_eq!(receipts.receipts().len(), 2);
        let backups = receipts.of_type(DecisionType::BackupCompleted);
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].result, DecisionResult::Success);
    }
}
