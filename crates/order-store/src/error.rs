use common::{OrderId, Version};
use thiserror::Error;

/// Errors that can occur when interacting with an order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An order with this ID is already stored.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The order was not found in the store.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The stored revision no longer matches the revision the caller read.
    #[error("Concurrent update of order {order_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// A stored row could not be turned back into an order.
    #[error("Corrupt order record {order_id}: {reason}")]
    Corrupt { order_id: OrderId, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
