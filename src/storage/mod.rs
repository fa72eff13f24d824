//! Storage capability.
//!
//! The engine never touches a physical snapshot backend directly; it calls
//! this narrow trait. Production adapters (object store, DB snapshot
//! driver) live outside the engine; an in-memory reference backend ships
//! here for tests and local development.

pub mod memory;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{BackupArtifact, BackupPlan, BackupType, Dataset, RestoreMode};

pub use memory::InMemoryStorage;

/// Storage backend trait.
///
/// These are the engine's only suspension points; callers own timeouts and
/// cancellation for both operations.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Capture every dataset of a plan, returning one artifact per dataset
    /// that storage confirmed captured.
    async fn create_backup(
        &self,
        plan: &BackupPlan,
        datasets: &[Dataset],
        backup_type: BackupType,
    ) -> Result<Vec<BackupArtifact>, StorageError>;

    /// Materialize the given artifacts into the target environment.
    /// Returns the locations written.
    async fn restore(
        &self,
        artifacts: &[BackupArtifact],
        mode: RestoreMode,
        target_env: &str,
    ) -> Result<Vec<String>, StorageError>;
}
