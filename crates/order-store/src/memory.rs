use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Version};
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderStore, Result, StoreError};

/// In-memory order store.
///
/// A single reader/writer lock guards the whole collection. It enforces the
/// same create/update rules as the PostgreSQL implementation, including the
/// version check on update.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.id()) {
            return Err(StoreError::AlreadyExists(order.id()));
        }

        order.set_version(Version::first());
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    async fn update(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;

        let stored = orders
            .get_mut(&order.id())
            .ok_or(StoreError::NotFound(order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version().next());
        *stored = order.clone();
        Ok(order)
    }
}
