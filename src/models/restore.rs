//! Restore request, restore point, and outcome models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How restored data lands in the target environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMode {
    InPlace,
    SideBySide,
}

impl RestoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreMode::InPlace => "in_place",
            RestoreMode::SideBySide => "side_by_side",
        }
    }
}

/// A symbolic pointer into backup history, resolved against the catalog
/// into a concrete backup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RestorePoint {
    /// Most recent successful run for the dataset's plan
    Latest,
    /// Most recent successful run completed strictly before the timestamp
    LatestBefore { timestamp: DateTime<Utc> },
    /// An explicit backup run id
    BackupId { backup_id: String },
}

/// A restore ask covering one or more datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreRequest {
    pub dataset_ids: Vec<String>,
    pub target_env: String,
    pub mode: RestoreMode,
    pub restore_point: RestorePoint,
    /// Caller-supplied evidence-ledger handles, threaded into the receipt
    #[serde(default)]
    pub evidence_handles: Vec<String>,
}

/// Status of an executed restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreStatus {
    Success,
    Failure,
}

impl RestoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreStatus::Success => "success",
            RestoreStatus::Failure => "failure",
        }
    }
}

/// Result of executing a restore. Produced once per request; the engine
/// does not persist it.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub status: RestoreStatus,
    pub restored_locations: Vec<String>,
    /// Backup run ids the request resolved to, in request order, deduplicated
    pub resolved_backups: Vec<String>,
    pub target_env: String,
    pub mode: RestoreMode,
    /// Hash of the policy bundle the resolution ran against
    pub policy_hash: String,
}
