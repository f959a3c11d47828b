//! Postgres-backed tests for order reconciliation and webhook registration.
//!
//! Ignored by default; run with `TEST_DATABASE_URL` set and `--include-ignored`.

#![allow(clippy::unwrap_used)]

use casecrafters_core::{CaseColor, CaseFinish, CaseMaterial, PhoneModel, PriceTable, UserId};
use casecrafters_integration_tests::test_database_url;
use casecrafters_storefront::db::{
    CheckoutRepository, ConfigurationRepository, NewConfiguration, NewWebhook, WebhookRepository,
};
use casecrafters_storefront::models::{Configuration, CurrentUser};
use casecrafters_storefront::services::CheckoutError;
use casecrafters_storefront::services::checkout::reconcile_order;
use futures::future::join_all;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let pool = PgPool::connect(&test_database_url()).await.unwrap();
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .unwrap();
    pool
}

fn shopper() -> CurrentUser {
    CurrentUser {
        id: UserId::new(format!("kp_{}", Uuid::new_v4().simple())),
        email: Some("asha@example.com".to_string()),
        given_name: Some("Asha".to_string()),
        family_name: None,
    }
}

async fn configuration(pool: &PgPool, finish: Option<CaseFinish>) -> Configuration {
    ConfigurationRepository::new(pool)
        .create(&NewConfiguration {
            width: 1080,
            height: 1920,
            image_url: "https://cdn.example.com/u/original.png".to_string(),
            cropped_image_url: None,
            color: Some(CaseColor::Blue),
            model: Some(PhoneModel::Iphone15),
            material: Some(CaseMaterial::Polycarbonate),
            finish,
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_checkouts_share_one_order() {
    let pool = pool().await;
    let configuration = configuration(&pool, Some(CaseFinish::Textured)).await;
    let identity = shopper();
    let prices = PriceTable::default();
    let store = CheckoutRepository::new(&pool);

    let results = join_all(
        (0..8).map(|_| reconcile_order(&store, &prices, configuration.id, &identity)),
    )
    .await;

    let orders: Vec<_> = results.into_iter().map(|r| r.unwrap().0).collect();
    let first = orders[0].order.id;
    assert!(orders.iter().all(|r| r.order.id == first));
    assert_eq!(orders.iter().filter(|r| r.created).count(), 1);
    assert_eq!(orders[0].order.amount.minor(), 28_500);
    assert_eq!(orders[0].user.email, "asha@example.com");

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.users WHERE id = $1")
        .bind(&identity.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_paid_order_is_not_reused() {
    let pool = pool().await;
    let configuration = configuration(&pool, Some(CaseFinish::Smooth)).await;
    let identity = shopper();
    let prices = PriceTable::default();
    let store = CheckoutRepository::new(&pool);

    let (first, _) = reconcile_order(&store, &prices, configuration.id, &identity)
        .await
        .unwrap();
    // Payment confirmation is recorded by the provider side, outside this codebase.
    sqlx::query("UPDATE storefront.orders SET is_paid = TRUE WHERE id = $1")
        .bind(first.order.id)
        .execute(&pool)
        .await
        .unwrap();

    let (second, _) = reconcile_order(&store, &prices, configuration.id, &identity)
        .await
        .unwrap();
    assert!(second.created);
    assert_ne!(second.order.id, first.order.id);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_incomplete_configuration_creates_nothing() {
    let pool = pool().await;
    let configuration = configuration(&pool, None).await;
    let identity = shopper();
    let store = CheckoutRepository::new(&pool);

    let result = reconcile_order(&store, &PriceTable::default(), configuration.id, &identity).await;
    assert!(matches!(result, Err(CheckoutError::InvalidConfiguration(_))));

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM storefront.orders WHERE configuration_id = $1",
    )
    .bind(configuration.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_webhook_registration_is_persisted() {
    let pool = pool().await;

    let webhook = WebhookRepository::new(&pool)
        .create(&NewWebhook {
            event_type: "order.paid".to_string(),
            url: "https://hooks.example.com/cc".to_string(),
            secret: "whsec_example".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(webhook.event_type, "order.paid");
    let json = serde_json::to_value(&webhook).unwrap();
    assert!(json.get("createdAt").is_some());
    assert!(json.get("eventType").is_some());
}
