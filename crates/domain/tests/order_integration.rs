//! Integration tests for the Order aggregate.
//!
//! These tests drive orders through their lifecycle using only the public
//! API and check that stored representations rebuild into equal orders.

use common::{OrderId, UserId, Version};
use domain::{Item, Money, Order, OrderError, OrderStatus, Part, Payment, PaymentMethod};

fn catalog() -> Vec<Part> {
    vec![
        Part::new("engine-1", "Main Engine", Money::from_units(100), 10),
        Part::new("wing-1", "Left Wing", Money::from_units(200), 5),
    ]
}

fn place(lines: &[(&str, u32)]) -> Order {
    let parts = catalog();
    let items = lines
        .iter()
        .map(|(id, quantity)| {
            let part = parts.iter().find(|p| p.part_id.as_str() == *id).unwrap();
            Item::from_part(part, *quantity)
        })
        .collect();
    Order::place(OrderId::new(), UserId::new("user-1"), items).unwrap()
}

mod order_lifecycle {
    use super::*;

    #[test]
    fn pay_pending_order() {
        let mut order = place(&[("engine-1", 5)]);
        assert_eq!(order.total_price().as_f64(), 500.0);

        order
            .mark_paid(Payment::new(PaymentMethod::InvestorMoney, "tx-1"))
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.payment_method(), Some(PaymentMethod::InvestorMoney));
        assert_eq!(order.transaction_id().map(|t| t.as_str()), Some("tx-1"));
        assert!(order.is_terminal());
    }

    #[test]
    fn cancel_pending_order() {
        let mut order = place(&[("engine-1", 8), ("wing-1", 3)]);
        assert_eq!(order.total_price().as_f64(), 1400.0);

        order.cancel().unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(order.payment().is_none());
        assert!(order.is_terminal());
    }

    #[test]
    fn terminal_orders_reject_every_transition() {
        let mut paid = place(&[("wing-1", 1)]);
        paid.mark_paid(Payment::new(PaymentMethod::Card, "tx-1"))
            .unwrap();

        let mut cancelled = place(&[("wing-1", 1)]);
        cancelled.cancel().unwrap();

        for order in [&mut paid, &mut cancelled] {
            let before = order.clone();
            assert!(matches!(
                order.cancel(),
                Err(OrderError::InvalidStateTransition { action: "cancel", .. })
            ));
            assert!(matches!(
                order.mark_paid(Payment::new(PaymentMethod::Card, "tx-2")),
                Err(OrderError::InvalidStateTransition { action: "pay", .. })
            ));
            assert_eq!(*order, before);
        }
    }

    #[test]
    fn snapshot_is_independent_of_catalog() {
        let mut parts = catalog();
        let order = Order::place(
            OrderId::new(),
            UserId::new("user-1"),
            vec![Item::from_part(&parts[0], 2)],
        )
        .unwrap();

        parts[0].unit_price = Money::from_units(999);
        parts[0].name = "Renamed".to_string();

        assert_eq!(order.items()[0].unit_price, Money::from_units(100));
        assert_eq!(order.items()[0].name, "Main Engine");
        assert_eq!(order.total_price(), Money::from_units(200));
    }
}

mod persistence {
    use super::*;

    #[test]
    fn restore_rebuilds_equal_order() {
        let mut order = place(&[("engine-1", 1), ("wing-1", 2)]);
        order
            .mark_paid(Payment::new(PaymentMethod::Sbp, "tx-9"))
            .unwrap();
        order.set_version(Version::new(2));

        let restored = Order::restore(
            order.id(),
            order.user_id().clone(),
            order.items().to_vec(),
            order.total_price(),
            order.status(),
            order.payment().cloned(),
            order.version(),
        )
        .unwrap();

        assert_eq!(restored, order);
    }

    #[test]
    fn restore_rejects_payment_on_unpaid_order() {
        let order = place(&[("engine-1", 1)]);
        let result = Order::restore(
            order.id(),
            order.user_id().clone(),
            order.items().to_vec(),
            order.total_price(),
            OrderStatus::Cancelled,
            Some(Payment::new(PaymentMethod::Card, "tx-1")),
            Version::first(),
        );

        assert!(matches!(
            result,
            Err(OrderError::InconsistentPayment { status: OrderStatus::Cancelled })
        ));
    }

    #[test]
    fn json_round_trip() {
        let mut order = place(&[("wing-1", 4)]);
        order
            .mark_paid(Payment::new(PaymentMethod::CreditCard, "tx-3"))
            .unwrap();

        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"PAID\""));

        let decoded: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, order);
    }
}
