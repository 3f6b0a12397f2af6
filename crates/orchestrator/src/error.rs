//! Order service error types.

use common::PartId;
use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

use crate::services::{InventoryError, PaymentError};

/// Coarse classification of service errors, used by request boundaries to
/// pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input.
    BadRequest,
    /// Unknown order or part.
    NotFound,
    /// The order's state forbids the operation, or it was changed concurrently.
    Conflict,
    /// Requested quantity exceeds available stock.
    NotEnoughInStock,
    /// Collaborator or storage failure.
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotEnoughInStock => "not_enough_in_stock",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors that can occur during order service operations.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// The request is malformed.
    #[error("400 bad request: {0}")]
    BadRequest(String),

    /// The order or a requested part does not exist.
    #[error("404 not found: {0}")]
    NotFound(String),

    /// The order's state forbids the operation.
    #[error("409 conflict: {0}")]
    Conflict(String),

    /// A requested quantity exceeds available stock.
    #[error(
        "400 not enough in stock: part {part_id} has {available} available, {requested} requested"
    )]
    NotEnoughInStock {
        part_id: PartId,
        requested: u32,
        available: u64,
    },

    /// Inventory service error.
    #[error("Inventory service error: {0}")]
    Inventory(#[from] InventoryError),

    /// Payment service error.
    #[error("Payment service error: {0}")]
    Payment(#[from] PaymentError),

    /// Order store error.
    #[error("Order store error: {0}")]
    Store(StoreError),

    /// An invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderServiceError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderServiceError::BadRequest(_) => ErrorKind::BadRequest,
            OrderServiceError::NotFound(_) => ErrorKind::NotFound,
            OrderServiceError::Conflict(_) => ErrorKind::Conflict,
            OrderServiceError::NotEnoughInStock { .. } => ErrorKind::NotEnoughInStock,
            OrderServiceError::Inventory(_)
            | OrderServiceError::Payment(_)
            | OrderServiceError::Store(_)
            | OrderServiceError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<OrderError> for OrderServiceError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::UserIdRequired
            | OrderError::NoItems
            | OrderError::PartIdRequired { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::QuantityTooLarge { .. }
            | OrderError::TotalOverflow => OrderServiceError::BadRequest(e.to_string()),
            OrderError::InvalidStateTransition { .. } => OrderServiceError::Conflict(e.to_string()),
            OrderError::InconsistentPayment { .. } => OrderServiceError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for OrderServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => OrderServiceError::NotFound(e.to_string()),
            StoreError::AlreadyExists(_) | StoreError::VersionConflict { .. } => {
                OrderServiceError::Conflict(e.to_string())
            }
            StoreError::Corrupt { .. } | StoreError::Database(_) | StoreError::Migration(_) => {
                OrderServiceError::Store(e)
            }
        }
    }
}

/// Convenience type alias for order service results.
pub type Result<T> = std::result::Result<T, OrderServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, Version};
    use domain::OrderStatus;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err: OrderServiceError = OrderError::NoItems.into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "400 bad request: items are required");
    }

    #[test]
    fn test_state_transition_errors_are_conflicts() {
        let err: OrderServiceError = OrderError::InvalidStateTransition {
            current_state: OrderStatus::Paid,
            action: "cancel",
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().starts_with("409 conflict"));
    }

    #[test]
    fn test_store_errors_are_rekinded() {
        let id = OrderId::new();
        let not_found: OrderServiceError = StoreError::NotFound(id).into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let duplicate: OrderServiceError = StoreError::AlreadyExists(id).into();
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);

        let stale: OrderServiceError = StoreError::VersionConflict {
            order_id: id,
            expected: Version::first(),
            actual: Version::new(2),
        }
        .into();
        assert_eq!(stale.kind(), ErrorKind::Conflict);

        let corrupt: OrderServiceError = StoreError::Corrupt {
            order_id: id,
            reason: "bad status".to_string(),
        }
        .into();
        assert_eq!(corrupt.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_oversized_orders_are_bad_requests() {
        let err: OrderServiceError = OrderError::TotalOverflow.into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "400 bad request: order total is too large");

        let err: OrderServiceError = OrderError::QuantityTooLarge {
            part_id: PartId::new("engine-1"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_collaborator_failures_are_internal() {
        let down: OrderServiceError = InventoryError::Unavailable("timeout".to_string()).into();
        assert_eq!(down.kind(), ErrorKind::Internal);

        let declined: OrderServiceError = PaymentError::Declined("no funds".to_string()).into();
        assert_eq!(declined.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_not_enough_in_stock_message() {
        let err = OrderServiceError::NotEnoughInStock {
            part_id: PartId::new("engine-1"),
            requested: 11,
            available: 10,
        };
        assert_eq!(err.kind(), ErrorKind::NotEnoughInStock);
        assert!(err.to_string().starts_with("400 not enough in stock"));
    }
}
