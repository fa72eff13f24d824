//! Restore executor.
//!
//! Resolves a restore request against the catalog and invokes storage only
//! once every requested dataset has a verified artifact. Resolution failure
//! for any dataset aborts the whole request before any storage I/O, so an
//! environment is never left partially restored.

use std::sync::Arc;

use crate::error::EngineError;
use crate::models::{
    BackupArtifact, BackupRun, RestoreOutcome, RestorePoint, RestoreRequest, RestoreStatus,
    RunStatus, VerificationStatus,
};
use crate::services::catalog_service::BackupCatalog;
use crate::services::policy_service::PolicyBundle;
use crate::storage::Storage;

pub struct RestoreExecutor {
    bundle: Arc<PolicyBundle>,
    catalog: Arc<BackupCatalog>,
    storage: Arc<dyn Storage>,
}

impl RestoreExecutor {
    pub fn new(
        bundle: Arc<PolicyBundle>,
        catalog: Arc<BackupCatalog>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            bundle,
            catalog,
            storage,
        }
    }

    /// Execute a restore request.
    ///
    /// Datasets spanning multiple plans resolve per-plan independently; all
    /// must succeed before the single storage call. The outcome's status
    /// mirrors the storage call; storage errors propagate.
    pub async fn restore(
        &self,
        request: &RestoreRequest,
        policy_hash: &str,
    ) -> Result<RestoreOutcome, EngineError> {
        let mut artifacts: Vec<BackupArtifact> = Vec::with_capacity(request.dataset_ids.len());
        let mut resolved_backups: Vec<String> = Vec::new();

        for dataset_id in &request.dataset_ids {
            let (run, artifact) = self.resolve_dataset(dataset_id, &request.restore_point)?;
            if !resolved_backups.contains(&run.backup_id) {
                resolved_backups.push(run.backup_id.clone());
            }
            artifacts.push(artifact);
        }

        // Every dataset resolved; storage I/O may begin.
        let restored_locations = self
            .storage
            .restore(&artifacts, request.mode, &request.target_env)
            .await?;

        tracing::debug!(
            target_env = %request.target_env,
            datasets = request.dataset_ids.len(),
            backups = resolved_backups.len(),
            "restore completed"
        );

        Ok(RestoreOutcome {
            status: RestoreStatus::Success,
            restored_locations,
            resolved_backups,
            target_env: request.target_env.clone(),
            mode: request.mode,
            policy_hash: policy_hash.to_string(),
        })
    }

    /// Resolve one dataset to a concrete run and artifact.
    fn resolve_dataset(
        &self,
        dataset_id: &str,
        restore_point: &RestorePoint,
    ) -> Result<(BackupRun, BackupArtifact), EngineError> {
        let plan_id = self
            .bundle
            .plan_for_dataset(dataset_id)
            .ok_or_else(|| EngineError::UnmappedDataset(dataset_id.to_string()))?;

        let run = match restore_point {
            RestorePoint::Latest => self.catalog.latest_successful(plan_id),
            RestorePoint::LatestBefore { timestamp } => {
                self.catalog.latest_before(plan_id, *timestamp)
            }
            RestorePoint::BackupId { backup_id } => self
                .catalog
                .by_backup_id(backup_id)
                .filter(|r| r.status == RunStatus::Success && r.plan_id == plan_id),
        }
        .ok_or_else(|| EngineError::NoEligibleBackup {
            dataset_id: dataset_id.to_string(),
            plan_id: plan_id.to_string(),
        })?;

        if run.verification == VerificationStatus::Failed {
            return Err(EngineError::VerificationFailed(run.backup_id));
        }

        let artifact = self
            .catalog
            .artifacts_for(&run.backup_id, dataset_id)
            .ok_or_else(|| EngineError::MissingArtifact {
                backup_id: run.backup_id.clone(),
                dataset_id: dataset_id.to_string(),
            })?;

        Ok((run, artifact))
    }
}
