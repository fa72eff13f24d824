//! Backup catalog.
//!
//! Append-only index of completed backup runs and their per-dataset
//! artifacts. Answers "what can I restore from?" queries; never rewrites or
//! removes prior entries. Queries are pure reads over recorded state.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{BackupArtifact, BackupRun, RunStatus};

#[derive(Default)]
struct CatalogState {
    runs: Vec<BackupRun>,
    by_id: HashMap<String, usize>,
    /// (backup_id, dataset_id) -> artifact
    artifacts: HashMap<(String, String), BackupArtifact>,
}

/// Append-only backup run index.
///
/// The write path is serialized per plan by the service's advisory locks;
/// the lock here only guards the map structure itself and is never held
/// across an await point.
#[derive(Default)]
pub struct BackupCatalog {
    state: RwLock<CatalogState>,
}

impl BackupCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run and its artifacts.
    pub fn record_run(&self, run: BackupRun, artifacts: Vec<BackupArtifact>) {
        let mut state = self.state.write().expect("catalog lock poisoned");
        let backup_id = run.backup_id.clone();
        for artifact in artifacts {
            state
                .artifacts
                .insert((backup_id.clone(), artifact.dataset_id.clone()), artifact);
        }
        let index = state.runs.len();
        state.runs.push(run);
        state.by_id.insert(backup_id, index);
    }

    /// Most recent `SUCCESS` run for the plan, or none.
    pub fn latest_successful(&self, plan_id: &str) -> Option<BackupRun> {
        let state = self.state.read().expect("catalog lock poisoned");
        state
            .runs
            .iter()
            .filter(|r| r.plan_id == plan_id && r.status == RunStatus::Success)
            .max_by_key(|r| r.finished_at)
            .cloned()
    }

    /// Most recent `SUCCESS` run completed strictly before `timestamp`,
    /// or none (including when `timestamp` precedes every run).
    pub fn latest_before(&self, plan_id: &str, timestamp: DateTime<Utc>) -> Option<BackupRun> {
        let state = self.state.read().expect("catalog lock poisoned");
        state
            .runs
            .iter()
            .filter(|r| {
                r.plan_id == plan_id
                    && r.status == RunStatus::Success
                    && r.finished_at < timestamp
            })
            .max_by_key(|r| r.finished_at)
            .cloned()
    }

    /// Exact run lookup, independent of plan.
    pub fn by_backup_id(&self, backup_id: &str) -> Option<BackupRun> {
        let state = self.state.read().expect("catalog lock poisoned");
        state
            .by_id
            .get(backup_id)
            .and_then(|&i| state.runs.get(i))
            .cloned()
    }

    /// Artifact for a dataset within a run; none if the run exists but
    /// never captured that dataset.
    pub fn artifacts_for(&self, backup_id: &str, dataset_id: &str) -> Option<BackupArtifact> {
        let state = self.state.read().expect("catalog lock poisoned");
        state
            .artifacts
            .get(&(backup_id.to_string(), dataset_id.to_string()))
            .cloned()
    }

    /// All runs recorded for a plan, in append order.
    pub fn runs_for_plan(&self, plan_id: &str) -> Vec<BackupRun> {
        let state = self.state.read().expect("catalog lock poisoned");
        state
            .runs
            .iter()
            .filter(|r| r.plan_id == plan_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("catalog lock poisoned").runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackupType, VerificationStatus};
    use bytes::Bytes;
    use chrono::{Duration, TimeZone};

    fn run(backup_id: &str, plan_id: &str, finished_at: DateTime<Utc>, status: RunStatus) -> BackupRun {
        BackupRun {
            backup_id: backup_id.to_string(),
            plan_id: plan_id.to_string(),
            dataset_ids: vec!["ds_a".into()],
            started_at: finished_at - Duration::minutes(1),
            finished_at,
            backup_type: BackupType::Full,
            status,
            storage_locations: vec![],
            checksums: HashMap::new(),
            verification: VerificationStatus::Verified,
        }
    }

    fn artifact(dataset_id: &str) -> BackupArtifact {
        BackupArtifact {
            dataset_id: dataset_id.to_string(),
            location: format!("backups/x/{dataset_id}"),
            payload: Bytes::from_static(b"data"),
        }
    }

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn latest_successful_skips_failures() {
        let catalog = BackupCatalog::new();
        catalog.record_run(run("b1", "bp_a", t(0), RunStatus::Success), vec![]);
        catalog.record_run(run("b2", "bp_a", t(10), RunStatus::Failure), vec![]);

        let latest = catalog.latest_successful("bp_a").unwrap();
        assert_eq!(latest.backup_id, "b1");
        assert!(catalog.latest_successful("bp_b").is_none());
    }

    #[test]
    fn latest_before_is_strict() {
        let catalog = BackupCatalog::new();
        catalog.record_run(run("b1", "bp_a", t(0), RunStatus::Success), vec![]);
        catalog.record_run(run("b2", "bp_a", t(20), RunStatus::Success), vec![]);

        // Before every run: none
        assert!(catalog.latest_before("bp_a", t(0) - Duration::minutes(5)).is_none());
        // Exactly at a completion time: excluded
        assert_eq!(catalog.latest_before("bp_a", t(0)), None);
        // Between runs: earlier one
        assert_eq!(catalog.latest_before("bp_a", t(10)).unwrap().backup_id, "b1");
        // After every run: latest
        assert_eq!(catalog.latest_before("bp_a", t(30)).unwrap().backup_id, "b2");
    }

    #[test]
    fn by_backup_id_is_plan_independent() {
        let catalog = BackupCatalog::new();
        catalog.record_run(run("b1", "bp_a", t(0), RunStatus::Success), vec![]);

        assert_eq!(catalog.by_backup_id("b1").unwrap().plan_id, "bp_a");
        assert!(catalog.by_backup_id("nope").is_none());
    }

    #[test]
    fn artifacts_for_missing_dataset_is_none() {
        let catalog = BackupCatalog::new();
        catalog.record_run(
            run("b1", "bp_a", t(0), RunStatus::Success),
            vec![artifact("ds_a")],
        );

        assert!(catalog.artifacts_for("b1", "ds_a").is_some());
        assert!(catalog.artifacts_for("b1", "ds_b").is_none());
        assert!(catalog.artifacts_for("b2", "ds_a").is_none());
    }

    #[test]
    fn record_run_appends_without_rewriting() {
        let catalog = BackupCatalog::new();
        catalog.record_run(run("b1", "bp_a", t(0), RunStatus::Success), vec![]);
        catalog.record_run(run("b2", "bp_a", t(10), RunStatus::Success), vec![]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.runs_for_plan("bp_a").len(), 2);
        assert_eq!(catalog.by_backup_id("b1").unwrap().finished_at, t(0));
    }
}
