//! Payment service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{IdempotencyKey, OrderId, TransactionId, UserId};
use domain::{Payment, PaymentMethod};
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by the payment service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The charge was refused.
    #[error("payment declined: {0}")]
    Declined(String),
}

/// Issues transactions for order payments.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the user for the order and returns the recorded payment.
    ///
    /// A `None` method is charged as [`PaymentMethod::Unknown`]. Repeating a
    /// call with the same idempotency key must not create a second charge and
    /// returns the payment recorded by the first call, whatever method the
    /// repeat asked for.
    async fn charge(
        &self,
        order_id: OrderId,
        user_id: &UserId,
        method: Option<PaymentMethod>,
        idempotency_key: &IdempotencyKey,
    ) -> Result<Payment, PaymentError>;
}

/// A charge recorded by the in-memory payment service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub method: PaymentMethod,
    pub transaction_id: TransactionId,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: HashMap<IdempotencyKey, Charge>,
    calls: usize,
    fail_on_charge: bool,
}

/// In-memory payment service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to decline every charge.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_charge = fail;
    }

    /// Returns the number of distinct charges made.
    pub fn charge_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .charges
            .len()
    }

    /// Returns the number of charge calls received, including replays and
    /// failures.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }

    /// Returns the charges made for an order.
    pub fn charges_for(&self, order_id: OrderId) -> Vec<Charge> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .charges
            .values()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentService {
    async fn charge(
        &self,
        order_id: OrderId,
        user_id: &UserId,
        method: Option<PaymentMethod>,
        idempotency_key: &IdempotencyKey,
    ) -> Result<Payment, PaymentError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if state.fail_on_charge {
            return Err(PaymentError::Declined("payment declined".to_string()));
        }

        if let Some(existing) = state.charges.get(idempotency_key) {
            tracing::debug!(%order_id, key = %idempotency_key, "replayed charge");
            return Ok(Payment::new(existing.method, existing.transaction_id.clone()));
        }

        let method = method.unwrap_or(PaymentMethod::Unknown);
        let transaction_id = TransactionId::new(Uuid::new_v4().to_string());

        tracing::info!(
            %order_id,
            %user_id,
            %method,
            %transaction_id,
            "payment charged"
        );

        state.charges.insert(
            idempotency_key.clone(),
            Charge {
                order_id,
                user_id: user_id.clone(),
                method,
                transaction_id: transaction_id.clone(),
            },
        );

        Ok(Payment::new(method, transaction_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Version;

    #[tokio::test]
    async fn test_charge_issues_uuid_transaction() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();
        let key = IdempotencyKey::for_payment(order_id, Version::first());

        let payment = service
            .charge(order_id, &UserId::new("user-1"), Some(PaymentMethod::Card), &key)
            .await
            .unwrap();

        assert!(Uuid::parse_str(payment.transaction_id.as_str()).is_ok());
        assert_eq!(payment.method, PaymentMethod::Card);
        assert_eq!(service.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_method_is_charged_as_unknown() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();
        let key = IdempotencyKey::for_payment(order_id, Version::first());

        let payment = service
            .charge(order_id, &UserId::new("user-1"), None, &key)
            .await
            .unwrap();
        assert_eq!(payment.method, PaymentMethod::Unknown);

        let charges = service.charges_for(order_id);
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].method, PaymentMethod::Unknown);
    }

    #[tokio::test]
    async fn test_repeated_key_returns_original_transaction() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();
        let user = UserId::new("user-1");
        let key = IdempotencyKey::for_payment(order_id, Version::first());

        let first = service
            .charge(order_id, &user, Some(PaymentMethod::Sbp), &key)
            .await
            .unwrap();
        let second = service
            .charge(order_id, &user, Some(PaymentMethod::Sbp), &key)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.charge_count(), 1);
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_repeated_key_keeps_original_method() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();
        let user = UserId::new("user-1");
        let key = IdempotencyKey::for_payment(order_id, Version::first());

        let first = service
            .charge(order_id, &user, Some(PaymentMethod::Card), &key)
            .await
            .unwrap();
        let replay = service
            .charge(order_id, &user, Some(PaymentMethod::Sbp), &key)
            .await
            .unwrap();

        assert_eq!(replay.method, PaymentMethod::Card);
        assert_eq!(replay.transaction_id, first.transaction_id);
        assert_eq!(service.charges_for(order_id)[0].method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn test_fail_on_charge() {
        let service = InMemoryPaymentService::new();
        service.set_fail_on_charge(true);
        let order_id = OrderId::new();
        let key = IdempotencyKey::for_payment(order_id, Version::first());

        let result = service
            .charge(order_id, &UserId::new("user-1"), Some(PaymentMethod::Card), &key)
            .await;

        assert!(matches!(result, Err(PaymentError::Declined(_))));
        assert_eq!(service.charge_count(), 0);
    }
}
