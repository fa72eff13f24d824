//! Common test harness: a BDR service wired to in-memory collaborators
//! with a manually-driven clock.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bdr_engine::clock::FixedClock;
use bdr_engine::error::StorageError;
use bdr_engine::models::iam::scopes;
use bdr_engine::models::{
    BackupArtifact, BackupPlan, BackupType, Dataset, DatasetDef, IamContext, PlanDef, RestoreMode,
};
use bdr_engine::sinks::{InMemoryLogger, InMemoryMetrics, InMemoryReceipts};
use bdr_engine::storage::{InMemoryStorage, Storage};
use bdr_engine::{BdrService, PolicyBundle};

/// Fixed origin for deterministic schedule arithmetic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn dataset(id: &str) -> DatasetDef {
    DatasetDef {
        dataset_id: id.to_string(),
    }
}

pub fn plan(id: &str, datasets: &[&str], interval: &str) -> PlanDef {
    PlanDef {
        plan_id: id.to_string(),
        dataset_ids: datasets.iter().map(|s| s.to_string()).collect(),
        schedule_interval: interval.to_string(),
    }
}

/// Caller holding every BDR scope.
pub fn admin() -> IamContext {
    IamContext::new("ops@test.local")
        .with_roles(vec!["bdr-admin".into()])
        .with_scopes(vec![
            scopes::BACKUP_RUN.into(),
            scopes::RESTORE_EXECUTE.into(),
            scopes::DR_MANAGE.into(),
            scopes::DR_EXECUTE.into(),
        ])
}

/// Storage wrapper whose failure modes can be toggled per operation,
/// delegating to the in-memory backend otherwise.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: InMemoryStorage,
    pub fail_backups: AtomicBool,
    pub fail_restores: AtomicBool,
}

impl FlakyStorage {
    pub fn set_fail_backups(&self, fail: bool) {
        self.fail_backups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_restores(&self, fail: bool) {
        self.fail_restores.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn create_backup(
        &self,
        plan: &BackupPlan,
        datasets: &[Dataset],
        backup_type: BackupType,
    ) -> Result<Vec<BackupArtifact>, StorageError> {
        if self.fail_backups.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("simulated backup outage".into()));
        }
        self.inner.create_backup(plan, datasets, backup_type).await
    }

    async fn restore(
        &self,
        artifacts: &[BackupArtifact],
        mode: RestoreMode,
        target_env: &str,
    ) -> Result<Vec<String>, StorageError> {
        if self.fail_restores.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("simulated restore outage".into()));
        }
        self.inner.restore(artifacts, mode, target_env).await
    }
}

pub struct Harness {
    pub service: BdrService,
    pub storage: Arc<FlakyStorage>,
    pub metrics: Arc<InMemoryMetrics>,
    pub logger: Arc<InMemoryLogger>,
    pub receipts: Arc<InMemoryReceipts>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new(dataset_defs: Vec<DatasetDef>, plan_defs: Vec<PlanDef>) -> Self {
        bdr_engine::telemetry::init_tracing();

        let bundle =
            PolicyBundle::load(dataset_defs, plan_defs).expect("test bundle must be valid");
        let storage = Arc::new(FlakyStorage::default());
        let metrics = Arc::new(InMemoryMetrics::new());
        let logger = Arc::new(InMemoryLogger::new());
        let receipts = Arc::new(InMemoryReceipts::new());
        let clock = Arc::new(FixedClock::new(t0()));

        let service = BdrService::new(
            bundle,
            storage.clone(),
            metrics.clone(),
            logger.clone(),
            receipts.clone(),
        )
        .with_clock(clock.clone());

        Self {
            service,
            storage,
            metrics,
            logger,
            receipts,
            clock,
        }
    }

    /// One plan `bp_a` owning dataset `ds_a` on a 30-minute schedule.
    pub fn single_plan() -> Self {
        Self::new(vec![dataset("ds_a")], vec![plan("bp_a", &["ds_a"], "PT30M")])
    }
}
