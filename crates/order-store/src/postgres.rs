use async_trait::async_trait;
use common::{OrderId, PartId, TransactionId, UserId, Version};
use domain::{Item, Money, Order, OrderStatus, Payment, PaymentMethod};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{OrderStore, Result, StoreError};

const ORDERS_PKEY: &str = "orders_pkey";

/// PostgreSQL-backed order store.
///
/// Orders live in `orders`, line items in `order_items` keyed by
/// `(order_id, part_id)`. The `version` column implements optimistic
/// concurrency: an update only applies when the stored version matches the
/// version the caller read.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        items: &[Item],
    ) -> Result<()> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, part_id, position, name, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(item.part_id.as_str())
            .bind(position as i32)
            .bind(&item.name)
            .bind(item.unit_price.cents())
            .bind(i64::from(item.quantity))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    fn row_to_item(order_id: OrderId, row: PgRow) -> Result<Item> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::Corrupt {
            order_id,
            reason: format!("item quantity {quantity} out of range"),
        })?;

        Ok(Item {
            part_id: PartId::new(row.try_get::<String, _>("part_id")?),
            name: row.try_get("name")?,
            quantity,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }

    fn row_to_order(order_id: OrderId, row: PgRow, items: Vec<Item>) -> Result<Order> {
        let corrupt = |reason: String| StoreError::Corrupt { order_id, reason };

        let status: String = row.try_get("status")?;
        let status: OrderStatus = status.parse().map_err(|e| corrupt(format!("{e}")))?;

        let method: Option<String> = row.try_get("payment_method")?;
        let transaction_id: Option<String> = row.try_get("transaction_id")?;
        let payment = match (method, transaction_id) {
            (Some(method), Some(transaction_id)) => Some(Payment {
                method: PaymentMethod::from_name(&method),
                transaction_id: TransactionId::new(transaction_id),
            }),
            (None, None) => None,
            _ => return Err(corrupt("partial payment details".to_string())),
        };

        Order::restore(
            order_id,
            UserId::new(row.try_get::<String, _>("user_id")?),
            items,
            Money::from_cents(row.try_get("total_price_cents")?),
            status,
            payment,
            Version::new(row.try_get("version")?),
        )
        .map_err(|e| corrupt(e.to_string()))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, mut order: Order) -> Result<Order> {
        let order_id = order.id();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, total_price_cents, status, payment_method, transaction_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.user_id().as_str())
        .bind(order.total_price().cents())
        .bind(order.status().as_str())
        .bind(order.payment_method().map(|m| m.as_str()))
        .bind(order.transaction_id().map(|t| t.as_str()))
        .bind(Version::first().as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(ORDERS_PKEY)
            {
                return StoreError::AlreadyExists(order_id);
            }
            StoreError::Database(e)
        })?;

        Self::insert_items(&mut tx, order_id, order.items()).await?;

        tx.commit().await?;
        tracing::debug!(%order_id, items = order.items().len(), "order inserted");

        order.set_version(Version::first());
        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT user_id, total_price_cents, status, payment_method, transaction_id, version
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(order_id))?;

        let items = sqlx::query(
            r#"
            SELECT part_id, name, unit_price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| Self::row_to_item(order_id, row))
        .collect::<Result<Vec<_>>>()?;

        Self::row_to_order(order_id, row, items)
    }

    async fn update(&self, mut order: Order) -> Result<Order> {
        let order_id = order.id();
        let expected = order.version();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET user_id = $3,
                total_price_cents = $4,
                status = $5,
                payment_method = $6,
                transaction_id = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE order_id = $1 AND version = $2
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(expected.as_i64())
        .bind(order.user_id().as_str())
        .bind(order.total_price().cents())
        .bind(order.status().as_str())
        .bind(order.payment_method().map(|m| m.as_str()))
        .bind(order.transaction_id().map(|t| t.as_str()))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE order_id = $1")
                    .bind(order_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match actual {
                None => StoreError::NotFound(order_id),
                Some(actual) => StoreError::VersionConflict {
                    order_id,
                    expected,
                    actual: Version::new(actual),
                },
            });
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        Self::insert_items(&mut tx, order_id, order.items()).await?;

        tx.commit().await?;

        order.set_version(expected.next());
        Ok(order)
    }
}
