//! Data models for the BDR engine.

pub mod backup;
pub mod dr;
pub mod iam;
pub mod policy;
pub mod restore;

pub use backup::{BackupArtifact, BackupRun, BackupType, RunStatus, VerificationStatus};
pub use dr::{DrRunbookStep, DrScenario, DrillOutcome, FailoverOutcome};
pub use iam::IamContext;
pub use policy::{BackupPlan, Dataset, DatasetDef, PlanDef};
pub use restore::{RestoreMode, RestoreOutcome, RestorePoint, RestoreRequest, RestoreStatus};
