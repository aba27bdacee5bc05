use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tollgate_application::GrantRepository;
use tollgate_domain::{BundleGrant, BundleId};

use super::PostgresCatalogGrantRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres catalog grant tests: {error}");
    }

    Some(pool)
}

fn unique(prefix: &str) -> String {
    format!(
        "{prefix}-{}",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn bundle_id(value: String) -> BundleId {
    match BundleId::new(value) {
        Ok(bundle_id) => bundle_id,
        Err(error) => panic!("{error}"),
    }
}

#[tokio::test]
async fn put_replaces_grants_in_one_write() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresCatalogGrantRepository::new(pool);
    let subject = unique("alice");
    let granted_at = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_default();
    let first = BundleGrant::new(bundle_id(unique("test")), NaiveDate::from_ymd_opt(2025, 1, 31))
        .with_qualifiers(BTreeMap::from([("transactionId".to_owned(), json!("tx-1"))]))
        .with_granted_at(granted_at);
    let second = BundleGrant::new(bundle_id(unique("guest")), None);

    assert!(
        repository
            .put_grants(subject.as_str(), vec![first.clone(), second.clone()])
            .await
            .is_ok()
    );
    let listed = repository.list_grants(subject.as_str()).await.unwrap_or_default();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&first));
    assert!(listed.contains(&second));

    assert!(
        repository
            .put_grants(subject.as_str(), vec![second.clone()])
            .await
            .is_ok()
    );
    assert_eq!(
        repository.list_grants(subject.as_str()).await.ok(),
        Some(vec![second])
    );
}

#[tokio::test]
async fn counts_distinct_unexpired_holders() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresCatalogGrantRepository::new(pool);
    let capped = bundle_id(unique("day-guest"));
    let holders = [
        (unique("alice"), NaiveDate::from_ymd_opt(2025, 3, 11)),
        (unique("bob"), NaiveDate::from_ymd_opt(2025, 3, 2)),
        (unique("carol"), None),
    ];

    for (subject, expiry) in &holders {
        let stored = repository
            .put_grants(subject.as_str(), vec![BundleGrant::new(capped.clone(), *expiry)])
            .await;
        assert!(stored.is_ok());
    }

    let as_of = Utc
        .with_ymd_and_hms(2025, 3, 10, 12, 0, 0)
        .single()
        .unwrap_or_default();
    assert_eq!(repository.count_holders(&capped, as_of).await.ok(), Some(2));
}
