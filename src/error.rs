//! Engine error types and result alias.

use thiserror::Error;

/// Service-level result type alias
pub type Result<T> = std::result::Result<T, BdrServiceError>;

/// Errors raised while validating a policy bundle.
///
/// These are fatal at construction time: a service must never come up
/// holding a half-valid bundle.
#[derive(Error, Debug)]
pub enum PolicyLoadError {
    /// A dataset is claimed by more than one backup plan
    #[error("dataset '{dataset_id}' is claimed by plans '{first_plan}' and '{second_plan}'")]
    DuplicateDatasetOwner {
        dataset_id: String,
        first_plan: String,
        second_plan: String,
    },

    /// A plan references a dataset that was never declared
    #[error("plan '{plan_id}' references unknown dataset '{dataset_id}'")]
    UnknownDataset { plan_id: String, dataset_id: String },

    /// A plan's schedule interval is not a valid ISO-8601 duration
    #[error("plan '{plan_id}' has invalid schedule interval '{interval}'")]
    InvalidSchedule { plan_id: String, interval: String },
}

/// Errors raised by the storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-side failure (network, snapshot driver, object store)
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A referenced object does not exist in the backend
    #[error("storage object not found: {0}")]
    NotFound(String),
}

/// Errors raised by restore resolution and the DR scenario catalog.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The requested dataset is not owned by any plan in the bundle
    #[error("dataset '{0}' is not mapped to any backup plan")]
    UnmappedDataset(String),

    /// No backup run satisfies the restore point for this dataset
    #[error("no eligible backup for dataset '{dataset_id}' in plan '{plan_id}'")]
    NoEligibleBackup { dataset_id: String, plan_id: String },

    /// The resolved run never captured the requested dataset
    #[error("backup run '{backup_id}' has no artifact for dataset '{dataset_id}'")]
    MissingArtifact {
        backup_id: String,
        dataset_id: String,
    },

    /// The resolved run failed integrity verification
    #[error("backup run '{0}' failed integrity verification")]
    VerificationFailed(String),

    /// Drill or failover references a scenario that was never registered
    #[error("unknown DR scenario '{0}'")]
    UnknownScenario(String),

    /// A duration string is not valid ISO-8601
    #[error("invalid ISO-8601 duration '{0}'")]
    InvalidDuration(String),

    /// Storage-level restore failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised at the BDR service boundary.
#[derive(Error, Debug)]
pub enum BdrServiceError {
    /// Caller lacks a required capability scope
    #[error("access denied: missing scope '{0}'")]
    Authorization(String),

    /// Operation names a plan the bundle does not know
    #[error("unknown backup plan '{0}'")]
    UnknownPlan(String),

    /// No policy bundle is loaded; no operation may proceed
    #[error("policy bundle is not loaded")]
    BundleNotLoaded,

    /// Wrapped engine failure (restore resolution, DR catalog, storage restore)
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
