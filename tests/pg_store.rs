//! PostgreSQL package store. Requires `DATABASE_URL`; run with `--ignored`.

use ingest_core::constants::status_codes;
use ingest_core::database::PgPackageStore;
use ingest_core::models::NewInformationPackage;
use ingest_core::state_machine::{PackageStore, PersistenceError};
use sqlx::PgPool;

#[sqlx::test(migrator = "ingest_core::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_insert_and_load(pool: PgPool) -> sqlx::Result<()> {
    let store = PgPackageStore::new(pool);
    let record = store
        .insert(NewInformationPackage::new("/data/reception/SIP-PG1.tar"))
        .await
        .unwrap();

    assert_eq!(record.statusprocess, status_codes::NEW);
    assert_eq!(record.version, 0);
    assert!(record.uuid.is_empty());

    let loaded = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(loaded, record);
    assert!(store.get(record.id + 1000).await.unwrap().is_none());
    Ok(())
}

#[sqlx::test(migrator = "ingest_core::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_save_bumps_version_and_rejects_stale_writes(pool: PgPool) -> sqlx::Result<()> {
    let store = PgPackageStore::new(pool);
    let record = store
        .insert(NewInformationPackage::new("/data/reception/SIP-PG2.tar"))
        .await
        .unwrap();

    let mut first = record.clone();
    first.statusprocess = status_codes::DELIVERY_VALIDATED;
    first.packagename = "SIP-PG2".to_string();
    let saved = store.save(&first).await.unwrap();
    assert_eq!(saved.version, record.version + 1);
    assert_eq!(saved.statusprocess, status_codes::DELIVERY_VALIDATED);

    let mut stale = record.clone();
    stale.statusprocess = status_codes::DELIVERY_VALIDATION_FAILED;
    let error = store.save(&stale).await.unwrap_err();
    assert!(matches!(error, PersistenceError::ConcurrentModification { .. }));

    let loaded = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(loaded.statusprocess, status_codes::DELIVERY_VALIDATED);

    let by_status = store
        .list_by_status(status_codes::DELIVERY_VALIDATED)
        .await
        .unwrap();
    assert_eq!(by_status.len(), 1);
    Ok(())
}

#[sqlx::test(migrator = "ingest_core::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_save_of_unknown_package(pool: PgPool) -> sqlx::Result<()> {
    let store = PgPackageStore::new(pool);
    let mut record = store
        .insert(NewInformationPackage::new("/data/reception/SIP-PG3.tar"))
        .await
        .unwrap();
    record.id += 1000;

    let error = store.save(&record).await.unwrap_err();
    assert!(matches!(error, PersistenceError::NotFound { .. }));
    Ok(())
}
