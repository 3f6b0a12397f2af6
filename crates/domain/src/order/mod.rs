//! Order aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use state::{OrderStatus, UnknownStatus};
pub use value_objects::{Item, Money, Part, Payment, PaymentMethod};

use common::PartId;
use thiserror::Error;

/// Errors raised by the order aggregate when a rule is violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// User ID is required.
    #[error("user_uuid is required")]
    UserIdRequired,

    /// Order has no items.
    #[error("items are required")]
    NoItems,

    /// An item was submitted without a part ID.
    #[error("part_uuid is required for item {index}")]
    PartIdRequired { index: usize },

    /// Invalid quantity.
    #[error("quantity must be greater than 0 for item {index}, got {quantity}")]
    InvalidQuantity { index: usize, quantity: i64 },

    /// Merged quantity of a part does not fit in a line.
    #[error("quantity of part {part_id} is too large")]
    QuantityTooLarge { part_id: PartId },

    /// Order total does not fit in the money range.
    #[error("order total is too large")]
    TotalOverflow,

    /// Order is not in the expected state.
    #[error("cannot {action} an order in {current_state} state")]
    InvalidStateTransition {
        current_state: OrderStatus,
        action: &'static str,
    },

    /// A stored order violates the payment/status invariant.
    #[error("order in {status} state has inconsistent payment details")]
    InconsistentPayment { status: OrderStatus },
}
