//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration
//! ```

use std::sync::Arc;

use common::{OrderId, UserId, Version};
use domain::{Item, Money, Order, OrderStatus, Payment, PaymentMethod};
use order_store::{OrderStore, PostgresOrderStore, StoreError};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresOrderStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresOrderStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderStore::new(pool)
}

fn new_order() -> Order {
    Order::place(
        OrderId::new(),
        UserId::new("user-1"),
        vec![
            Item::new("wing-1", "Wing", 3, Money::from_units(200)),
            Item::new("engine-1", "Engine", 8, Money::from_cents(10_050)),
        ],
    )
    .unwrap()
}

async fn count(store: &PostgresOrderStore, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    sqlx::query_scalar(&sql)
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn create_and_get_roundtrip() {
    let store = get_test_store().await;

    let created = store.create(new_order()).await.unwrap();
    assert_eq!(created.version(), Version::first());

    let loaded = store.get(created.id()).await.unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.items()[0].part_id.as_str(), "wing-1");
    assert_eq!(loaded.total_price(), Money::from_cents(140_400));

    assert_eq!(count(&store, "orders").await, 1);
    assert_eq!(count(&store, "order_items").await, 2);
}

#[tokio::test]
#[serial]
async fn create_duplicate_id_conflicts() {
    let store = get_test_store().await;
    let order = new_order();

    store.create(order.clone()).await.unwrap();
    let result = store.create(order.clone()).await;

    assert!(matches!(result, Err(StoreError::AlreadyExists(id)) if id == order.id()));
    assert_eq!(count(&store, "order_items").await, 2);
}

#[tokio::test]
#[serial]
async fn get_missing_order_is_not_found() {
    let store = get_test_store().await;
    let result = store.get(OrderId::new()).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
#[serial]
async fn update_persists_payment() {
    let store = get_test_store().await;
    let mut order = store.create(new_order()).await.unwrap();
    order
        .mark_paid(Payment::new(PaymentMethod::CreditCard, "tx-42"))
        .unwrap();

    let updated = store.update(order).await.unwrap();
    assert_eq!(updated.version(), Version::new(2));

    let loaded = store.get(updated.id()).await.unwrap();
    assert_eq!(loaded, updated);
    assert_eq!(loaded.status(), OrderStatus::Paid);
    assert_eq!(loaded.payment_method(), Some(PaymentMethod::CreditCard));
}

#[tokio::test]
#[serial]
async fn update_missing_order_is_not_found() {
    let store = get_test_store().await;
    let result = store.update(new_order()).await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert_eq!(count(&store, "orders").await, 0);
}

#[tokio::test]
#[serial]
async fn stale_update_is_rejected() {
    let store = get_test_store().await;
    let created = store.create(new_order()).await.unwrap();

    let mut cancelled = created.clone();
    cancelled.cancel().unwrap();
    store.update(cancelled).await.unwrap();

    let mut paid = created.clone();
    paid.mark_paid(Payment::new(PaymentMethod::Card, "tx-1"))
        .unwrap();
    let result = store.update(paid).await;

    assert!(matches!(
        result,
        Err(StoreError::VersionConflict { expected, actual, .. })
            if expected == Version::first() && actual == Version::new(2)
    ));

    let loaded = store.get(created.id()).await.unwrap();
    assert_eq!(loaded.status(), OrderStatus::Cancelled);
    assert!(loaded.transaction_id().is_none());
}
