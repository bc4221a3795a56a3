//! PostgreSQL-backed [`PackageStore`].

use crate::models::{InformationPackage, NewInformationPackage};
use crate::state_machine::persistence::PackageStore;
use crate::state_machine::{PersistenceError, PersistenceResult};
use async_trait::async_trait;
use sqlx::PgPool;

const COLUMNS: &str = "id, uuid, identifier, packagename, path, statusprocess, version";

#[derive(Debug, Clone)]
pub struct PgPackageStore {
    pool: PgPool,
}

impl PgPackageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Records currently at `statusprocess`, oldest first
    pub async fn list_by_status(
        &self,
        statusprocess: i32,
    ) -> PersistenceResult<Vec<InformationPackage>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM information_packages WHERE statusprocess = $1 ORDER BY id"
        );
        Ok(sqlx::query_as::<_, InformationPackage>(&sql)
            .bind(statusprocess)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl PackageStore for PgPackageStore {
    async fn get(&self, package_id: i64) -> PersistenceResult<Option<InformationPackage>> {
        let sql = format!("SELECT {COLUMNS} FROM information_packages WHERE id = $1");
        Ok(sqlx::query_as::<_, InformationPackage>(&sql)
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(
        &self,
        new_package: NewInformationPackage,
    ) -> PersistenceResult<InformationPackage> {
        let sql = format!(
            "INSERT INTO information_packages (path, statusprocess) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, InformationPackage>(&sql)
            .bind(&new_package.path)
            .bind(new_package.statusprocess)
            .fetch_one(&self.pool)
            .await?;
        crate::log_package!(debug, "Record inserted", package_id: record.id, path: record.path.clone());
        Ok(record)
    }

    async fn save(&self, record: &InformationPackage) -> PersistenceResult<InformationPackage> {
        let sql = format!(
            "UPDATE information_packages \
             SET uuid = $3, identifier = $4, packagename = $5, path = $6, statusprocess = $7, \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $2 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, InformationPackage>(&sql)
            .bind(record.id)
            .bind(record.version)
            .bind(&record.uuid)
            .bind(&record.identifier)
            .bind(&record.packagename)
            .bind(&record.path)
            .bind(record.statusprocess)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(saved) => Ok(saved),
            // No row matched: either the record is gone or its version moved on
            None => match self.get(record.id).await? {
                Some(_) => Err(PersistenceError::ConcurrentModification {
                    package_id: record.id,
                    expected_version: record.version,
                }),
                None => Err(PersistenceError::NotFound {
                    package_id: record.id,
                }),
            },
        }
    }
}
