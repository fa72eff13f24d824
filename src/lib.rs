//! BDR Engine - Backup & Disaster-Recovery Orchestration
//!
//! Turns a declarative policy (datasets, backup plans, schedules) into
//! backup executions, resolves symbolic restore points against a catalog of
//! prior runs, and drives disaster-recovery drills and failovers against
//! measurable RPO/RTO targets.
//!
//! Storage, metrics, logging, receipts, and the clock are consumed as
//! capability traits; in-memory reference implementations ship in-crate.

pub mod clock;
pub mod error;
pub mod models;
pub mod services;
pub mod sinks;
pub mod storage;
pub mod telemetry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BdrServiceError, EngineError, PolicyLoadError, Result, StorageError};
pub use services::bdr_service::{BdrService, StalenessConfig};
pub use services::catalog_service::BackupCatalog;
pub use services::dr_service::DrScenarioCatalog;
pub use services::policy_service::PolicyBundle;
pub use services::restore_service::RestoreExecutor;
pub use storage::Storage;
