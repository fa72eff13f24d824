//! BDR service facade.
//!
//! Composes the policy bundle, backup catalog, restore executor, and DR
//! scenario catalog with authorization checks, schedule evaluation, and
//! metric/receipt/log emission.
//!
//! The error model is deliberately asymmetric: backups are background,
//! remediable operations and fail soft (a storage outage becomes a
//! `FAILURE` run plus a receipt, never an error to the caller), while
//! restores and DR cutovers are synchronous safety-critical operations and
//! fail hard.

use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{BdrServiceError, Result};
use crate::models::iam::scopes;
use crate::models::{
    BackupRun, BackupType, Dataset, DrScenario, DrillOutcome, FailoverOutcome, IamContext,
    RestoreMode, RestoreOutcome, RestorePoint, RestoreRequest, RunStatus, VerificationStatus,
};
use crate::services::catalog_service::BackupCatalog;
use crate::services::dr_service::DrScenarioCatalog;
use crate::services::policy_service::PolicyBundle;
use crate::services::restore_service::RestoreExecutor;
use crate::sinks::{DecisionResult, DecisionType, LogEntry, Logger, Metrics, Receipts};
use crate::storage::Storage;

pub const METRIC_BACKUP_RUNS: &str = "bdr_backup_runs";
pub const METRIC_RESTORE_RUNS: &str = "bdr_restore_runs";
pub const METRIC_DR_DRILLS: &str = "bdr_dr_drills";
pub const METRIC_DR_EVENTS: &str = "bdr_dr_events";

/// Staleness reporting thresholds.
#[derive(Debug, Clone)]
pub struct StalenessConfig {
    /// A plan is stale once its last successful run is older than
    /// `multiplier x schedule_interval`.
    pub multiplier: i32,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self { multiplier: 2 }
    }
}

pub struct BdrService {
    bundle: RwLock<Option<Arc<PolicyBundle>>>,
    catalog: Arc<BackupCatalog>,
    scenarios: DrScenarioCatalog,
    storage: Arc<dyn Storage>,
    metrics: Arc<dyn Metrics>,
    logger: Arc<dyn Logger>,
    receipts: Arc<dyn Receipts>,
    clock: Arc<dyn Clock>,
    /// Advisory per-plan locks serializing backup executions.
    plan_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    staleness: StalenessConfig,
}

impl BdrService {
    pub fn new(
        bundle: PolicyBundle,
        storage: Arc<dyn Storage>,
        metrics: Arc<dyn Metrics>,
        logger: Arc<dyn Logger>,
        receipts: Arc<dyn Receipts>,
    ) -> Self {
        Self {
            bundle: RwLock::new(Some(Arc::new(bundle))),
            catalog: Arc::new(BackupCatalog::new()),
            scenarios: DrScenarioCatalog::new(),
            storage,
            metrics,
            logger,
            receipts,
            clock: Arc::new(SystemClock),
            plan_locks: StdMutex::new(HashMap::new()),
            staleness: StalenessConfig::default(),
        }
    }

    /// Replace the system clock (tests, replay tooling).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_staleness(mut self, staleness: StalenessConfig) -> Self {
        self.staleness = staleness;
        self
    }

    /// Read access to the catalog for observability collaborators.
    pub fn catalog(&self) -> &BackupCatalog {
        &self.catalog
    }

    /// Drop the loaded bundle. Every subsequent operation fails with
    /// `BundleNotLoaded` until a new service is constructed; exists for
    /// test isolation.
    pub fn clear_bundle(&self) {
        *self.bundle.write().expect("bundle lock poisoned") = None;
    }

    /// Execute a backup for one plan.
    ///
    /// Storage failures do not raise: they are recorded as a `FAILURE` run
    /// and surfaced through metrics and receipts, so a scheduling loop is
    /// never taken down by a single plan's outage. Returns the recorded
    /// run either way.
    pub async fn run_backup(&self, ctx: &IamContext, plan_id: &str) -> Result<BackupRun> {
        self.require_scope(ctx, scopes::BACKUP_RUN)?;
        let bundle = self.require_bundle()?;
        let plan = bundle
            .plan(plan_id)
            .ok_or_else(|| BdrServiceError::UnknownPlan(plan_id.to_string()))?;

        // Serialize executions per plan; concurrent calls for distinct
        // plans proceed independently.
        let lock = self.plan_lock(plan_id);
        let _guard = lock.lock().await;

        let datasets: Vec<Dataset> = plan
            .dataset_ids
            .iter()
            .filter_map(|id| bundle.dataset(id).cloned())
            .collect();

        let started_at = self.clock.now();
        let backup_id = Uuid::new_v4().to_string();
        let backup_type = BackupType::Full;

        match self
            .storage
            .create_backup(plan, &datasets, backup_type)
            .await
        {
            Ok(artifacts) => {
                let finished_at = self.clock.now();
                let run = BackupRun {
                    backup_id: backup_id.clone(),
                    plan_id: plan.plan_id.clone(),
                    dataset_ids: plan.dataset_ids.clone(),
                    started_at,
                    finished_at,
                    backup_type,
                    status: RunStatus::Success,
                    storage_locations: artifacts.iter().map(|a| a.location.clone()).collect(),
                    checksums: artifacts
                        .iter()
                        .map(|a| (a.dataset_id.clone(), checksum(&a.payload)))
                        .collect(),
                    verification: VerificationStatus::Verified,
                };
                self.catalog.record_run(run.clone(), artifacts);

                self.metrics
                    .increment_counter(METRIC_BACKUP_RUNS, &format!("{plan_id}:success"));
                self.receipts.emit(
                    DecisionType::BackupCompleted,
                    DecisionResult::Success,
                    json!({
                        "actor": ctx.actor,
                        "plan_id": plan_id,
                        "backup_id": backup_id,
                        "backup_type": backup_type.as_str(),
                        "datasets": run.dataset_ids,
                    }),
                );
                self.logger.log(LogEntry::new(
                    finished_at,
                    "run_backup",
                    "success",
                    format!("backup {backup_id} completed for plan {plan_id}"),
                ));
                tracing::info!(plan_id, backup_id = %backup_id, "backup completed");
                Ok(run)
            }
            Err(e) => {
                let finished_at = self.clock.now();
                let run = BackupRun {
                    backup_id: backup_id.clone(),
                    plan_id: plan.plan_id.clone(),
                    dataset_ids: plan.dataset_ids.clone(),
                    started_at,
                    finished_at,
                    backup_type,
                    status: RunStatus::Failure,
                    storage_locations: vec![],
                    checksums: HashMap::new(),
                    verification: VerificationStatus::Suspect,
                };
                self.catalog.record_run(run.clone(), vec![]);

                self.metrics
                    .increment_counter(METRIC_BACKUP_RUNS, &format!("{plan_id}:failure"));
                self.receipts.emit(
                    DecisionType::BackupCompleted,
                    DecisionResult::Failure,
                    json!({
                        "actor": ctx.actor,
                        "plan_id": plan_id,
                        "backup_id": backup_id,
                        "error": e.to_string(),
                    }),
                );
                self.logger.log(LogEntry::new(
                    finished_at,
                    "run_backup",
                    "failure",
                    format!("backup for plan {plan_id} failed: {e}"),
                ));
                tracing::warn!(plan_id, error = %e, "backup failed");
                Ok(run)
            }
        }
    }

    /// Execute a restore request.
    ///
    /// Fails hard: any resolution or storage failure raises after the
    /// failure has been logged and receipted.
    pub async fn request_restore(
        &self,
        ctx: &IamContext,
        request: &RestoreRequest,
    ) -> Result<RestoreOutcome> {
        self.require_scope(ctx, scopes::RESTORE_EXECUTE)?;
        let bundle = self.require_bundle()?;

        let executor =
            RestoreExecutor::new(bundle.clone(), self.catalog.clone(), self.storage.clone());

        match executor.restore(request, bundle.policy_hash()).await {
            Ok(outcome) => {
                self.metrics.increment_counter(
                    METRIC_RESTORE_RUNS,
                    &format!("success:{}", request.mode.as_str()),
                );
                self.receipts.emit(
                    DecisionType::RestoreCompleted,
                    DecisionResult::Success,
                    json!({
                        "actor": ctx.actor,
                        "datasets": request.dataset_ids,
                        "target_env": request.target_env,
                        "mode": request.mode.as_str(),
                        "resolved_backups": outcome.resolved_backups,
                        "policy_hash": outcome.policy_hash,
                        "evidence_handles": request.evidence_handles,
                    }),
                );
                self.logger.log(LogEntry::new(
                    self.clock.now(),
                    "request_restore",
                    "success",
                    format!(
                        "restored {} dataset(s) into {}",
                        request.dataset_ids.len(),
                        request.target_env
                    ),
                ));
                Ok(outcome)
            }
            Err(e) => {
                self.metrics.increment_counter(
                    METRIC_RESTORE_RUNS,
                    &format!("failure:{}", request.mode.as_str()),
                );
                self.logger.log(LogEntry::new(
                    self.clock.now(),
                    "request_restore",
                    "failure",
                    format!("restore into {} failed: {e}", request.target_env),
                ));
                self.receipts.emit(
                    DecisionType::RestoreCompleted,
                    DecisionResult::Failure,
                    json!({
                        "actor": ctx.actor,
                        "datasets": request.dataset_ids,
                        "target_env": request.target_env,
                        "mode": request.mode.as_str(),
                        "policy_hash": bundle.policy_hash(),
                        "evidence_handles": request.evidence_handles,
                        "error": e.to_string(),
                    }),
                );
                tracing::warn!(target_env = %request.target_env, error = %e, "restore failed");
                Err(e.into())
            }
        }
    }

    /// Execute every plan that is due at `now`.
    ///
    /// A plan is due if it has never successfully run, or if the time since
    /// its last successful run has reached its schedule interval. Returns
    /// the plans executed; a soft-failed backup still counts as executed.
    pub async fn run_scheduled_backups(
        &self,
        ctx: &IamContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        self.require_scope(ctx, scopes::BACKUP_RUN)?;
        let bundle = self.require_bundle()?;

        let due: Vec<String> = bundle
            .plans()
            .iter()
            .filter(|plan| match self.catalog.latest_successful(&plan.plan_id) {
                Some(run) => now - run.finished_at >= plan.schedule_interval,
                None => true,
            })
            .map(|plan| plan.plan_id.clone())
            .collect();

        let mut executed = Vec::with_capacity(due.len());
        for plan_id in due {
            self.run_backup(ctx, &plan_id).await?;
            executed.push(plan_id);
        }

        tracing::debug!(executed = executed.len(), "scheduled backup sweep complete");
        Ok(executed)
    }

    /// Register (or replace) a disaster-recovery scenario.
    pub fn register_dr_scenario(&self, ctx: &IamContext, scenario: DrScenario) -> Result<()> {
        self.require_scope(ctx, scopes::DR_MANAGE)?;
        self.require_bundle()?;

        let scenario_id = scenario.scenario_id.clone();
        self.scenarios.register(scenario);
        self.receipts.emit(
            DecisionType::DrScenarioRegistered,
            DecisionResult::Success,
            json!({ "actor": ctx.actor, "scenario_id": scenario_id }),
        );
        self.logger.log(LogEntry::new(
            self.clock.now(),
            "register_dr_scenario",
            "success",
            format!("registered DR scenario {scenario_id}"),
        ));
        Ok(())
    }

    /// Evaluate a DR drill against the scenario's RPO/RTO targets.
    ///
    /// A failed evaluation does not raise; drills are measurement
    /// exercises and their outcome is data. Unknown scenarios and
    /// malformed durations do raise.
    pub fn execute_dr_drill(
        &self,
        ctx: &IamContext,
        scenario_id: &str,
        involved_plans: &[String],
        achieved_rpo: &str,
        achieved_rto: &str,
    ) -> Result<DrillOutcome> {
        self.require_scope(ctx, scopes::DR_EXECUTE)?;
        self.require_bundle()?;

        let evaluation = self
            .scenarios
            .evaluate_drill(scenario_id, achieved_rpo, achieved_rto)
            .map_err(BdrServiceError::Engine)?;

        let success = evaluation.passed();
        let label = if success { "success" } else { "failure" };
        self.metrics
            .increment_counter(METRIC_DR_DRILLS, &format!("{scenario_id}:{label}"));
        self.receipts.emit(
            DecisionType::DrDrillCompleted,
            if success {
                DecisionResult::Success
            } else {
                DecisionResult::Failure
            },
            json!({
                "actor": ctx.actor,
                "scenario_id": scenario_id,
                "involved_plans": involved_plans,
                "achieved_rpo": achieved_rpo,
                "achieved_rto": achieved_rto,
                "rpo_met": evaluation.rpo_met,
                "rto_met": evaluation.rto_met,
            }),
        );
        self.logger.log(LogEntry::new(
            self.clock.now(),
            "execute_dr_drill",
            label,
            format!("drill for scenario {scenario_id} evaluated: {label}"),
        ));

        Ok(DrillOutcome {
            scenario_id: scenario_id.to_string(),
            success,
            rpo_met: evaluation.rpo_met,
            rto_met: evaluation.rto_met,
            involved_plans: involved_plans.to_vec(),
        })
    }

    /// Drive an actual cutover: restore the latest backup of every dataset
    /// in the bundle into the target environment.
    ///
    /// Follows restore semantics: a failed cutover raises, after the
    /// failure has been counted and receipted.
    pub async fn run_failover(
        &self,
        ctx: &IamContext,
        scenario_id: &str,
        target_env: &str,
    ) -> Result<FailoverOutcome> {
        self.require_scope(ctx, scopes::DR_EXECUTE)?;
        let bundle = self.require_bundle()?;

        let scenario = self
            .scenarios
            .get(scenario_id)
            .ok_or_else(|| BdrServiceError::Engine(crate::error::EngineError::UnknownScenario(
                scenario_id.to_string(),
            )))?;

        let dataset_ids: Vec<String> = bundle
            .plans()
            .iter()
            .flat_map(|plan| plan.dataset_ids.iter().cloned())
            .collect();
        let request = RestoreRequest {
            dataset_ids,
            target_env: target_env.to_string(),
            mode: RestoreMode::InPlace,
            restore_point: RestorePoint::Latest,
            evidence_handles: vec![],
        };

        let executor =
            RestoreExecutor::new(bundle.clone(), self.catalog.clone(), self.storage.clone());

        match executor.restore(&request, bundle.policy_hash()).await {
            Ok(outcome) => {
                self.metrics
                    .increment_counter(METRIC_DR_EVENTS, &format!("{scenario_id}:success"));
                self.receipts.emit(
                    DecisionType::FailoverCompleted,
                    DecisionResult::Success,
                    json!({
                        "actor": ctx.actor,
                        "scenario_id": scenario_id,
                        "strategy": scenario.strategy,
                        "target_env": target_env,
                        "resolved_backups": outcome.resolved_backups,
                    }),
                );
                self.logger.log(LogEntry::new(
                    self.clock.now(),
                    "run_failover",
                    "success",
                    format!("failover for scenario {scenario_id} cut over to {target_env}"),
                ));
                tracing::info!(scenario_id, target_env, "failover completed");
                Ok(FailoverOutcome {
                    scenario_id: scenario_id.to_string(),
                    target_env: target_env.to_string(),
                    restore: outcome,
                })
            }
            Err(e) => {
                self.metrics
                    .increment_counter(METRIC_DR_EVENTS, &format!("{scenario_id}:failure"));
                self.receipts.emit(
                    DecisionType::FailoverCompleted,
                    DecisionResult::Failure,
                    json!({
                        "actor": ctx.actor,
                        "scenario_id": scenario_id,
                        "target_env": target_env,
                        "error": e.to_string(),
                    }),
                );
                self.logger.log(LogEntry::new(
                    self.clock.now(),
                    "run_failover",
                    "failure",
                    format!("failover for scenario {scenario_id} failed: {e}"),
                ));
                tracing::warn!(scenario_id, target_env, error = %e, "failover failed");
                Err(e.into())
            }
        }
    }

    /// Plans whose most recent successful run is older than the staleness
    /// threshold (multiplier x schedule interval), including plans that
    /// have never run. Never raises; an unloaded bundle reports nothing.
    pub fn stale_plans(&self, now: DateTime<Utc>) -> Vec<String> {
        let bundle = match self.bundle.read().expect("bundle lock poisoned").clone() {
            Some(bundle) => bundle,
            None => {
                tracing::warn!("stale_plans called with no bundle loaded");
                return Vec::new();
            }
        };

        bundle
            .plans()
            .iter()
            .filter(|plan| {
                let threshold = plan.schedule_interval * self.staleness.multiplier;
                match self.catalog.latest_successful(&plan.plan_id) {
                    Some(run) => now - run.finished_at > threshold,
                    None => true,
                }
            })
            .map(|plan| plan.plan_id.clone())
            .collect()
    }

    fn require_scope(&self, ctx: &IamContext, scope: &str) -> Result<()> {
        if ctx.has_scope(scope) {
            Ok(())
        } else {
            Err(BdrServiceError::Authorization(scope.to_string()))
        }
    }

    /// Guard called first by every operation: no operation may read
    /// partially-initialized state.
    fn require_bundle(&self) -> Result<Arc<PolicyBundle>> {
        self.bundle
            .read()
            .expect("bundle lock poisoned")
            .clone()
            .ok_or(BdrServiceError::BundleNotLoaded)
    }

    fn plan_lock(&self, plan_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.plan_locks.lock().expect("plan lock map poisoned");
        locks
            .entry(plan_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// SHA-256 hex digest of an artifact payload.
fn checksum(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatasetDef, PlanDef};
    use crate::sinks::{InMemoryLogger, InMemoryMetrics, InMemoryReceipts};
    use crate::storage::InMemoryStorage;

    fn service() -> BdrService {
        let bundle = PolicyBundle::load(
            vec![DatasetDef { dataset_id: "ds_a".into() }],
            vec![PlanDef {
                plan_id: "bp_a".into(),
                dataset_ids: vec!["ds_a".into()],
                schedule_interval: "PT30M".into(),
            }],
        )
        .unwrap();
        BdrService::new(
            bundle,
            Arc::new(InMemoryStorage::new()),
            Arc::new(InMemoryMetrics::new()),
            Arc::new(InMemoryLogger::new()),
            Arc::new(InMemoryReceipts::new()),
        )
    }

    #[tokio::test]
    async fn missing_scope_is_denied() {
        let svc = service();
        let ctx = IamContext::new("nobody");
        let err = svc.run_backup(&ctx, "bp_a").await.unwrap_err();
        assert!(matches!(err, BdrServiceError::Authorization(_)));
        assert!(svc.catalog().is_empty());
    }

    #[tokio::test]
    async fn cleared_bundle_blocks_every_operation() {
        let svc = service();
        svc.clear_bundle();
        let ctx = IamContext::new("ops").with_scopes(vec![scopes::BACKUP_RUN.into()]);

        let err = svc.run_backup(&ctx, "bp_a").await.unwrap_err();
        assert!(matches!(err, BdrServiceError::BundleNotLoaded));
        assert!(svc.stale_plans(Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn unknown_plan_is_rejected() {
        let svc = service();
        let ctx = IamContext::new("ops").with_scopes(vec![scopes::BACKUP_RUN.into()]);
        let err = svc.run_backup(&ctx, "bp_missing").await.unwrap_err();
        assert!(matches!(err, BdrServiceError::UnknownPlan(_)));
    }
}
