//! Domain layer for the order backend.
//!
//! This crate provides the order aggregate and its value types:
//! - `Order` aggregate root with the payment/cancellation state machine
//! - `Item` line items with snapshotted pricing
//! - `Part` read-only catalog view supplied by the inventory service
//! - `Money` amounts in minor units

pub mod order;

pub use order::{
    Item, Money, Order, OrderError, OrderStatus, Part, Payment, PaymentMethod, UnknownStatus,
};
