//! Backup run and artifact models.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Backup type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupType {
    Full,
    Incremental,
}

impl BackupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupType::Full => "full",
            BackupType::Incremental => "incremental",
        }
    }
}

/// Terminal status of a backup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
        }
    }
}

/// Integrity verification state of a recorded run.
///
/// `Suspect` means verification never completed (e.g. the run itself
/// failed); `Failed` means a checksum mismatch was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Verified,
    Suspect,
    Failed,
}

/// One completed (or failed) backup execution.
///
/// Immutable once recorded in the catalog; retention and deletion are
/// external concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupRun {
    pub backup_id: String,
    pub plan_id: String,
    pub dataset_ids: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub backup_type: BackupType,
    pub status: RunStatus,
    pub storage_locations: Vec<String>,
    /// dataset_id -> sha-256 hex digest of the captured payload
    pub checksums: HashMap<String, String>,
    pub verification: VerificationStatus,
}

/// A per-dataset payload handle inside a backup run.
///
/// Exists only if storage confirmed the dataset was captured in that run.
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    pub dataset_id: String,
    pub location: String,
    pub payload: Bytes,
}
