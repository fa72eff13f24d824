//! Policy bundle loading and queries.
//!
//! Validates dataset/plan definitions into an immutable, queryable bundle.
//! Validation is fail-fast and all-or-nothing: ambiguous ownership, unknown
//! dataset references, or malformed schedules reject the whole bundle and
//! construct nothing.

use chrono::Duration;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::PolicyLoadError;
use crate::models::dr::parse_iso8601_duration;
use crate::models::{BackupPlan, Dataset, DatasetDef, PlanDef};

/// Validated, immutable snapshot of plans and datasets.
///
/// Built once at service construction; reload means a new service instance.
/// All accessors are read-only for the lifetime of the bundle.
#[derive(Debug)]
pub struct PolicyBundle {
    plans: Vec<BackupPlan>,
    datasets: HashMap<String, Dataset>,
    dataset_plan_index: HashMap<String, String>,
    policy_hash: String,
}

impl PolicyBundle {
    /// Validate definitions into a bundle.
    pub fn load(
        dataset_defs: Vec<DatasetDef>,
        plan_defs: Vec<PlanDef>,
    ) -> Result<Self, PolicyLoadError> {
        let datasets: HashMap<String, Dataset> = dataset_defs
            .into_iter()
            .map(|def| {
                (
                    def.dataset_id.clone(),
                    Dataset {
                        dataset_id: def.dataset_id,
                    },
                )
            })
            .collect();

        let mut dataset_plan_index: HashMap<String, String> = HashMap::new();
        let mut plans = Vec::with_capacity(plan_defs.len());

        for def in plan_defs {
            let schedule_interval: Duration = parse_iso8601_duration(&def.schedule_interval)
                .map_err(|_| PolicyLoadError::InvalidSchedule {
                    plan_id: def.plan_id.clone(),
                    interval: def.schedule_interval.clone(),
                })?;

            for dataset_id in &def.dataset_ids {
                if !datasets.contains_key(dataset_id) {
                    return Err(PolicyLoadError::UnknownDataset {
                        plan_id: def.plan_id.clone(),
                        dataset_id: dataset_id.clone(),
                    });
                }
                if let Some(first_plan) = dataset_plan_index.get(dataset_id) {
                    return Err(PolicyLoadError::DuplicateDatasetOwner {
                        dataset_id: dataset_id.clone(),
                        first_plan: first_plan.clone(),
                        second_plan: def.plan_id.clone(),
                    });
                }
                dataset_plan_index.insert(dataset_id.clone(), def.plan_id.clone());
            }

            plans.push(BackupPlan {
                plan_id: def.plan_id,
                dataset_ids: def.dataset_ids,
                schedule_interval,
            });
        }

        let policy_hash = Self::compute_hash(&plans);

        Ok(Self {
            plans,
            datasets,
            dataset_plan_index,
            policy_hash,
        })
    }

    /// Hash of the canonical plan list, stamped onto restore outcomes and
    /// receipts so audits can pin a decision to a policy revision.
    fn compute_hash(plans: &[BackupPlan]) -> String {
        let mut hasher = Sha256::new();
        for plan in plans {
            hasher.update(plan.plan_id.as_bytes());
            hasher.update(b"|");
            hasher.update(plan.schedule_interval.num_seconds().to_le_bytes());
            for dataset_id in &plan.dataset_ids {
                hasher.update(b"|");
                hasher.update(dataset_id.as_bytes());
            }
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn plan(&self, plan_id: &str) -> Option<&BackupPlan> {
        self.plans.iter().find(|p| p.plan_id == plan_id)
    }

    /// Plans in declaration order.
    pub fn plans(&self) -> &[BackupPlan] {
        &self.plans
    }

    pub fn dataset(&self, dataset_id: &str) -> Option<&Dataset> {
        self.datasets.get(dataset_id)
    }

    /// Owning plan id for a dataset, if any.
    pub fn plan_for_dataset(&self, dataset_id: &str) -> Option<&str> {
        self.dataset_plan_index.get(dataset_id).map(String::as_str)
    }

    pub fn dataset_plan_index(&self) -> &HashMap<String, String> {
        &self.dataset_plan_index
    }

    pub fn policy_hash(&self) -> &str {
        &self.policy_hash
    }
}
