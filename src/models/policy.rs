//! Policy definitions: datasets, backup plans, and their raw input forms.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Raw dataset definition as supplied by policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDef {
    pub dataset_id: String,
}

/// Raw backup plan definition as supplied by policy configuration.
///
/// `schedule_interval` is an ISO-8601 duration string (e.g. `PT30M`) and is
/// parsed during bundle load; an unparseable interval rejects the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDef {
    pub plan_id: String,
    pub dataset_ids: Vec<String>,
    pub schedule_interval: String,
}

/// A unit of data subject to backup. Belongs to exactly one plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset_id: String,
}

/// Validated backup plan with a parsed schedule interval.
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub plan_id: String,
    pub dataset_ids: Vec<String>,
    pub schedule_interval: Duration,
}
