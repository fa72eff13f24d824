//! In-memory storage backend.
//!
//! Reference implementation of the `Storage` capability: datasets are
//! seeded with payload bytes, `create_backup` snapshots them under a
//! per-run prefix, and `restore` materializes payloads into the target
//! environment (`{env}/{dataset}` in place, `{env}/{dataset}.restored`
//! side by side).

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{BackupArtifact, BackupPlan, BackupType, Dataset, RestoreMode};
use crate::storage::Storage;

#[derive(Default)]
pub struct InMemoryStorage {
    /// Live dataset contents, keyed by dataset id
    seeds: RwLock<HashMap<String, Bytes>>,
    /// Every object ever written (backup snapshots and restore targets)
    objects: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the live contents of a dataset. Subsequent backups snapshot
    /// whatever was last seeded; unseeded datasets capture as empty.
    pub fn seed_dataset(&self, dataset_id: impl Into<String>, payload: impl Into<Bytes>) {
        self.seeds
            .write()
            .expect("storage lock poisoned")
            .insert(dataset_id.into(), payload.into());
    }

    /// Read back an object by location (for assertions and debugging).
    pub fn object(&self, location: &str) -> Option<Bytes> {
        self.objects
            .read()
            .expect("storage lock poisoned")
            .get(location)
            .cloned()
    }

    /// Number of objects written so far.
    pub fn object_count(&self) -> usize {
        self.objects.read().expect("storage lock poisoned").len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_backup(
        &self,
        plan: &BackupPlan,
        datasets: &[Dataset],
        _backup_type: BackupType,
    ) -> Result<Vec<BackupArtifact>, StorageError> {
        let batch = Uuid::new_v4();
        let seeds = self.seeds.read().expect("storage lock poisoned");
        let mut objects = self.objects.write().expect("storage lock poisoned");

        let mut artifacts = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            let payload = seeds
                .get(&dataset.dataset_id)
                .cloned()
                .unwrap_or_else(Bytes::new);
            let location = format!("backups/{}/{}/{}", plan.plan_id, batch, dataset.dataset_id);
            objects.insert(location.clone(), payload.clone());
            artifacts.push(BackupArtifact {
                dataset_id: dataset.dataset_id.clone(),
                location,
                payload,
            });
        }

        Ok(artifacts)
    }

    async fn restore(
        &self,
        artifacts: &[BackupArtifact],
        mode: RestoreMode,
        target_env: &str,
    ) -> Result<Vec<String>, StorageError> {
        let mut objects = self.objects.write().expect("storage lock poisoned");

        let mut restored = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let target = match mode {
                RestoreMode::InPlace => format!("{}/{}", target_env, artifact.dataset_id),
                RestoreMode::SideBySide => {
                    format!("{}/{}.restored", target_env, artifact.dataset_id)
                }
            };
            objects.insert(target.clone(), artifact.payload.clone());
            restored.push(target);
        }

        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn plan() -> BackupPlan {
        BackupPlan {
            plan_id: "bp_a".into(),
            dataset_ids: vec!["ds_a".into()],
            schedule_interval: Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn backup_snapshots_seeded_payloads() {
        let storage = InMemoryStorage::new();
        storage.seed_dataset("ds_a", &b"v1"[..]);

        let artifacts = storage
            .create_backup(&plan(), &[Dataset { dataset_id: "ds_a".into() }], BackupType::Full)
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].payload, Bytes::from_static(b"v1"));
        assert_eq!(storage.object(&artifacts[0].location).unwrap(), artifacts[0].payload);

        // Later seeds do not rewrite the snapshot
        storage.seed_dataset("ds_a", &b"v2"[..]);
        assert_eq!(storage.object(&artifacts[0].location).unwrap(), Bytes::from_static(b"v1"));
    }

    #[tokio::test]
    async fn restore_materializes_per_mode() {
        let storage = InMemoryStorage::new();
        let artifact = BackupArtifact {
            dataset_id: "ds_a".into(),
            location: "backups/bp_a/x/ds_a".into(),
            payload: Bytes::from_static(b"v1"),
        };

        let in_place = storage
            .restore(std::slice::from_ref(&artifact), RestoreMode::InPlace, "prod")
            .await
            .unwrap();
        assert_eq!(in_place, vec!["prod/ds_a".to_string()]);

        let side = storage
            .restore(&[artifact], RestoreMode::SideBySide, "prod")
            .await
            .unwrap();
        assert_eq!(side, vec!["prod/ds_a.restored".to_string()]);
        assert_eq!(storage.object("prod/ds_a").unwrap(), Bytes::from_static(b"v1"));
    }
}
