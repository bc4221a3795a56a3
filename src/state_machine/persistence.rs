use super::errors::{PersistenceError, PersistenceResult};
use crate::models::{InformationPackage, NewInformationPackage};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Information package store
///
/// `save` is a compare-and-swap on `version`: the stored record must still
/// carry the version the caller loaded, otherwise the save is rejected with
/// [`PersistenceError::ConcurrentModification`] and nothing is written.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Load a package by primary key
    async fn get(&self, package_id: i64) -> PersistenceResult<Option<InformationPackage>>;

    /// Register a new package and return the stored record
    async fn insert(&self, new_package: NewInformationPackage)
        -> PersistenceResult<InformationPackage>;

    /// Persist `record` atomically, returning it with its bumped version
    async fn save(&self, record: &InformationPackage) -> PersistenceResult<InformationPackage>;
}

/// In-process store used by tests and single-node deployments
#[derive(Debug, Default)]
pub struct InMemoryPackageStore {
    records: DashMap<i64, InformationPackage>,
    next_id: AtomicI64,
}

impl InMemoryPackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored packages
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl PackageStore for InMemoryPackageStore {
    async fn get(&self, package_id: i64) -> PersistenceResult<Option<InformationPackage>> {
        Ok(self.records.get(&package_id).map(|entry| entry.clone()))
    }

    async fn insert(
        &self,
        new_package: NewInformationPackage,
    ) -> PersistenceResult<InformationPackage> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = InformationPackage {
            id,
            uuid: String::new(),
            identifier: String::new(),
            packagename: String::new(),
            path: new_package.path,
            statusprocess: new_package.statusprocess,
            version: 0,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn save(&self, record: &InformationPackage) -> PersistenceResult<InformationPackage> {
        let mut stored = self
            .records
            .get_mut(&record.id)
            .ok_or(PersistenceError::NotFound {
                package_id: record.id,
            })?;

        if stored.version != record.version {
            return Err(PersistenceError::ConcurrentModification {
                package_id: record.id,
                expected_version: record.version,
            });
        }

        let mut saved = record.clone();
        saved.version = record.version + 1;
        *stored = saved.clone();
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryPackageStore::new();
        let first = store.insert(NewInformationPackage::new("/a.tar")).await.unwrap();
        let second = store.insert(NewInformationPackage::new("/b.tar")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.get(first.id).await.unwrap(), Some(first));
        assert_eq!(store.get(999).await.unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let store = InMemoryPackageStore::new();
        let mut record = store.insert(NewInformationPackage::new("/a.tar")).await.unwrap();
        record.statusprocess = 100;

        let saved = store.save(&record).await.unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(store.get(record.id).await.unwrap().unwrap().statusprocess, 100);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let store = InMemoryPackageStore::new();
        let original = store.insert(NewInformationPackage::new("/a.tar")).await.unwrap();

        let mut first_writer = original.clone();
        first_writer.statusprocess = 100;
        store.save(&first_writer).await.unwrap();

        let mut second_writer = original.clone();
        second_writer.statusprocess = 190;
        let err = store.save(&second_writer).await.unwrap_err();
        assert!(err.is_conflict());

        // The first write survives
        assert_eq!(store.get(original.id).await.unwrap().unwrap().statusprocess, 100);
    }

    #[tokio::test]
    async fn test_save_unknown_record() {
        let store = InMemoryPackageStore::new();
        let ghost = InformationPackage {
            id: 5,
            uuid: String::new(),
            identifier: String::new(),
            packagename: String::new(),
            path: "/ghost.tar".to_string(),
            statusprocess: 0,
            version: 0,
        };
        assert!(matches!(
            store.save(&ghost).await,
            Err(PersistenceError::NotFound { package_id: 5 })
        ));
    }
}
