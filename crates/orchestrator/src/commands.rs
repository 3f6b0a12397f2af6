//! Order service commands.

use common::{OrderId, PartId, UserId};
use domain::PaymentMethod;

/// A requested line: which part and how many units.
///
/// The quantity is kept signed so that zero and negative values coming from
/// the request boundary can be rejected by the service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// The part to order.
    pub part_id: PartId,

    /// Requested units.
    pub quantity: i64,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(part_id: impl Into<PartId>, quantity: i64) -> Self {
        Self {
            part_id: part_id.into(),
            quantity,
        }
    }
}

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The user placing the order.
    pub user_id: UserId,

    /// Requested lines, in the order they should appear on the order.
    pub lines: Vec<OrderLine>,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(user_id: impl Into<UserId>, lines: Vec<OrderLine>) -> Self {
        Self {
            user_id: user_id.into(),
            lines,
        }
    }
}

/// Command to pay for an order.
#[derive(Debug, Clone)]
pub struct PayOrder {
    /// The order to pay.
    pub order_id: OrderId,

    /// Method chosen by the user. `None` is passed through to the payment
    /// service, which treats it as an unknown method.
    pub payment_method: Option<PaymentMethod>,
}

impl PayOrder {
    /// Creates a new PayOrder command.
    pub fn new(order_id: OrderId, payment_method: Option<PaymentMethod>) -> Self {
        Self {
            order_id,
            payment_method,
        }
    }
}
