//! Order service: the order lifecycle state machine.

use std::collections::HashMap;

use common::{IdempotencyKey, OrderId, PartId, TransactionId};
use domain::{Item, Order, OrderError};
use order_store::{OrderStore, StoreError};

use crate::commands::{CreateOrder, OrderLine, PayOrder};
use crate::error::{OrderServiceError, Result};
use crate::services::{PartOracle, PaymentGateway};

/// Drives orders through their lifecycle.
///
/// Prices and stock come from the [`PartOracle`], charges go through the
/// [`PaymentGateway`], and every read-modify-write against the store is
/// guarded by the order's version, so two concurrent transitions of the same
/// order cannot both succeed.
pub struct OrderService<S, I, P>
where
    S: OrderStore,
    I: PartOracle,
    P: PaymentGateway,
{
    store: S,
    inventory: I,
    payment: P,
}

impl<S, I, P> OrderService<S, I, P>
where
    S: OrderStore,
    I: PartOracle,
    P: PaymentGateway,
{
    /// Creates a new order service.
    pub fn new(store: S, inventory: I, payment: P) -> Self {
        Self {
            store,
            inventory,
            payment,
        }
    }

    /// Returns a reference to the order store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the inventory service.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Returns a reference to the payment service.
    pub fn payment(&self) -> &P {
        &self.payment
    }

    /// Creates and stores a new order awaiting payment.
    ///
    /// Input is validated before the inventory service is consulted. Names
    /// and prices are copied from the catalog into the line items, so later
    /// catalog changes do not affect the order. Stock is checked but not
    /// reserved.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, lines = cmd.lines.len()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        let start = std::time::Instant::now();
        let result = self.place_order(cmd).await;
        metrics::histogram!("order_create_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    total_price = %order.total_price(),
                    "order created"
                );
            }
            Err(e) => record_failure("create", e),
        }
        result
    }

    /// Loads an order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get(order_id)
            .await
            .map_err(OrderServiceError::from)
            .inspect_err(|e| record_failure("get", e))
    }

    /// Pays for an order and returns the transaction id.
    ///
    /// Only orders awaiting payment can be paid. A payment failure leaves the
    /// order untouched. The charge carries an idempotency key derived from the
    /// order revision, so concurrent attempts on the same revision present the
    /// same key to the payment service.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn pay_order(&self, cmd: PayOrder) -> Result<TransactionId> {
        let result = self.charge_order(cmd).await;
        match &result {
            Ok(transaction_id) => {
                metrics::counter!("orders_paid_total").increment(1);
                tracing::info!(%transaction_id, "order paid");
            }
            Err(e) => record_failure("pay", e),
        }
        result
    }

    /// Cancels an order awaiting payment.
    ///
    /// Cancelling a paid or already cancelled order is a conflict. No refund
    /// or stock release is triggered.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<()> {
        let result = self.cancel_stored_order(order_id).await;
        match &result {
            Ok(()) => {
                metrics::counter!("orders_cancelled_total").increment(1);
                tracing::info!("order cancelled");
            }
            Err(e) => record_failure("cancel", e),
        }
        result
    }

    async fn place_order(&self, cmd: CreateOrder) -> Result<Order> {
        if cmd.user_id.is_empty() {
            return Err(OrderError::UserIdRequired.into());
        }
        let lines = validate_lines(&cmd.lines)?;

        let part_ids: Vec<PartId> = lines.iter().map(|(id, _)| id.clone()).collect();
        let parts = self.inventory.list_parts(&part_ids).await?;

        if parts.len() != part_ids.len() {
            let missing: Vec<&str> = part_ids
                .iter()
                .filter(|id| !parts.contains_key(*id))
                .map(PartId::as_str)
                .collect();
            return Err(OrderServiceError::NotFound(format!(
                "parts not found: {}",
                missing.join(", ")
            )));
        }

        let mut items = Vec::with_capacity(lines.len());
        for (part_id, quantity) in lines {
            let part = parts.get(&part_id).ok_or_else(|| {
                OrderServiceError::NotFound(format!("part not found: {part_id}"))
            })?;
            if part.unit_price.is_negative() {
                return Err(OrderServiceError::Internal(format!(
                    "inventory returned a negative price for part {part_id}"
                )));
            }

            if !part.has_stock_for(quantity) {
                return Err(OrderServiceError::NotEnoughInStock {
                    part_id,
                    requested: quantity,
                    available: part.available_quantity,
                });
            }
            items.push(Item::from_part(part, quantity));
        }

        let order = Order::place(OrderId::new(), cmd.user_id, items)?;
        Ok(self.store.create(order).await?)
    }

    async fn charge_order(&self, cmd: PayOrder) -> Result<TransactionId> {
        let mut order = self.store.get(cmd.order_id).await?;

        if let Err(e) = order.ensure_payable() {
            tracing::warn!(status = %order.status(), "payment rejected");
            return Err(e.into());
        }

        let key = IdempotencyKey::for_payment(order.id(), order.version());
        let payment = self
            .payment
            .charge(order.id(), order.user_id(), cmd.payment_method, &key)
            .await?;

        // A replayed key reports the method of the original charge.
        let transaction_id = payment.transaction_id.clone();
        order.mark_paid(payment)?;

        match self.store.update(order).await {
            Ok(_) => Ok(transaction_id),
            Err(e @ StoreError::VersionConflict { .. }) => {
                tracing::warn!(
                    %transaction_id,
                    error = %e,
                    "order changed while payment was in flight"
                );
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn cancel_stored_order(&self, order_id: OrderId) -> Result<()> {
        let mut order = self.store.get(order_id).await.map_err(|e| {
            if !matches!(e, StoreError::NotFound(_)) {
                tracing::error!(error = %e, "order lookup failed");
            }
            OrderServiceError::NotFound(format!("order {order_id} not found"))
        })?;

        if let Err(e) = order.cancel() {
            tracing::warn!(status = %order.status(), "cancellation rejected");
            return Err(e.into());
        }

        self.store.update(order).await?;
        Ok(())
    }
}

/// Checks the requested lines and returns `(part, quantity)` pairs in
/// first-occurrence order. Lines naming the same part are merged and their
/// quantities summed.
fn validate_lines(lines: &[OrderLine]) -> Result<Vec<(PartId, u32)>> {
    if lines.is_empty() {
        return Err(OrderError::NoItems.into());
    }

    let mut positions: HashMap<&PartId, usize> = HashMap::with_capacity(lines.len());
    let mut merged: Vec<(PartId, u32)> = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        if line.part_id.is_empty() {
            return Err(OrderError::PartIdRequired { index }.into());
        }
        if line.quantity <= 0 {
            return Err(OrderError::InvalidQuantity {
                index,
                quantity: line.quantity,
            }
            .into());
        }
        let too_large = || OrderError::QuantityTooLarge {
            part_id: line.part_id.clone(),
        };
        let quantity = u32::try_from(line.quantity).map_err(|_| too_large())?;

        match positions.get(&line.part_id) {
            Some(&position) => {
                let total = &mut merged[position].1;
                *total = total.checked_add(quantity).ok_or_else(too_large)?;
            }
            None => {
                positions.insert(&line.part_id, merged.len());
                merged.push((line.part_id.clone(), quantity));
            }
        }
    }

    Ok(merged)
}

fn record_failure(operation: &'static str, error: &OrderServiceError) {
    let kind = error.kind();
    metrics::counter!(
        "order_operations_failed_total",
        "operation" => operation,
        "kind" => kind.as_str()
    )
    .increment(1);

    if kind == crate::ErrorKind::Internal {
        tracing::error!(operation, error = %error, "order operation failed");
    } else {
        tracing::debug!(operation, error = %error, "order operation rejected");
    }
}
