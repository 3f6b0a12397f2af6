use async_trait::async_trait;
use common::OrderId;
use domain::Order;

use crate::Result;

/// Core trait for order store implementations.
///
/// A store persists whole order aggregates (the order and its line items)
/// keyed by order ID. There is no partial-field update: callers read the
/// aggregate, change it, and write it back with [`OrderStore::update`].
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    ///
    /// Fails with `AlreadyExists` if an order with the same ID is stored.
    /// The order and its items are written atomically. Returns the stored
    /// order, which carries `Version::first()`.
    async fn create(&self, order: Order) -> Result<Order>;

    /// Retrieves an order by ID.
    ///
    /// Fails with `NotFound` if no order is stored under the ID.
    async fn get(&self, order_id: OrderId) -> Result<Order>;

    /// Replaces a stored order.
    ///
    /// Fails with `NotFound` if the order is absent, and with
    /// `VersionConflict` if the stored version differs from `order.version()`.
    /// Returns the stored order with its version incremented.
    async fn update(&self, order: Order) -> Result<Order>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for std::sync::Arc<T> {
    async fn create(&self, order: Order) -> Result<Order> {
        (**self).create(order).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        (**self).get(order_id).await
    }

    async fn update(&self, order: Order) -> Result<Order> {
        (**self).update(order).await
    }
}
