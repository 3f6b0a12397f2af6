//! Order aggregate implementation.

use std::collections::HashMap;

use common::{OrderId, PartId, TransactionId, UserId, Version};
use serde::{Deserialize, Serialize};

use super::{Item, Money, OrderError, OrderStatus, Payment, PaymentMethod};

/// Order aggregate root.
///
/// Owns its line items and enforces the lifecycle rules: an order is placed
/// in `PendingPayment`, and moves exactly once to either `Paid` or
/// `Cancelled`. Payment details are present if and only if the order is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// User who placed the order.
    user_id: UserId,

    /// Line items in request order.
    items: Vec<Item>,

    /// Sum of line totals, fixed when the order is placed.
    total_price: Money,

    /// Set once the order is paid.
    payment: Option<Payment>,

    /// Current status of the order.
    status: OrderStatus,

    /// Stored revision for optimistic concurrency.
    #[serde(default)]
    version: Version,
}

// Construction
impl Order {
    /// Places a new order awaiting payment.
    ///
    /// The total is computed from the given line items and never recomputed
    /// afterwards. The returned order has not been stored yet and carries
    /// [`Version::initial`].
    pub fn place(id: OrderId, user_id: UserId, items: Vec<Item>) -> Result<Self, OrderError> {
        if user_id.is_empty() {
            return Err(OrderError::UserIdRequired);
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        // Lines naming the same part collapse into the first one.
        let mut merged: Vec<Item> = Vec::with_capacity(items.len());
        let mut positions: HashMap<PartId, usize> = HashMap::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if item.part_id.is_empty() {
                return Err(OrderError::PartIdRequired { index });
            }
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity { index, quantity: 0 });
            }
            match positions.get(&item.part_id) {
                Some(&position) => {
                    let line = &mut merged[position];
                    line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                        OrderError::QuantityTooLarge {
                            part_id: item.part_id.clone(),
                        }
                    })?;
                }
                None => {
                    positions.insert(item.part_id.clone(), merged.len());
                    merged.push(item);
                }
            }
        }
        let items = merged;

        let mut total_price = Money::zero();
        for item in &items {
            total_price = item
                .line_total()
                .and_then(|line| total_price.checked_add(line))
                .ok_or(OrderError::TotalOverflow)?;
        }

        Ok(Self {
            id,
            user_id,
            items,
            total_price,
            payment: None,
            status: OrderStatus::PendingPayment,
            version: Version::initial(),
        })
    }

    /// Rebuilds an order from its stored representation.
    ///
    /// Rejects records whose payment details disagree with their status.
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        items: Vec<Item>,
        total_price: Money,
        status: OrderStatus,
        payment: Option<Payment>,
        version: Version,
    ) -> Result<Self, OrderError> {
        if payment.is_some() != (status == OrderStatus::Paid) {
            return Err(OrderError::InconsistentPayment { status });
        }

        Ok(Self {
            id,
            user_id,
            items,
            total_price,
            payment,
            status,
            version,
        })
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the line items in request order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the total price fixed at creation.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the payment details if the order is paid.
    pub fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    /// Returns the payment method if the order is paid.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment.as_ref().map(|p| p.method)
    }

    /// Returns the transaction ID if the order is paid.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.payment.as_ref().map(|p| &p.transaction_id)
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the stored revision.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the stored revision. Called by order stores after a write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Transitions
impl Order {
    /// Checks that the order may be paid, without changing it.
    pub fn ensure_payable(&self) -> Result<(), OrderError> {
        if !self.status.can_pay() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "pay",
            });
        }
        Ok(())
    }

    /// Records a successful payment and moves the order to `Paid`.
    pub fn mark_paid(&mut self, payment: Payment) -> Result<(), OrderError> {
        self.ensure_payable()?;
        self.payment = Some(payment);
        self.status = OrderStatus::Paid;
        Ok(())
    }

    /// Moves the order to `Cancelled`.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}
