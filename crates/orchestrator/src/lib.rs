//! Order orchestration for the order backend.
//!
//! The [`OrderService`] owns the order lifecycle:
//! 1. Create: resolve prices and stock through the inventory service,
//!    snapshot them into line items, persist the order
//! 2. Pay: charge through the payment service, record the transaction
//! 3. Cancel: move an unpaid order to its terminal cancelled state
//!
//! There are no compensating actions: a failed step leaves the stored order
//! as it was before the step started.

pub mod commands;
pub mod error;
pub mod service;
pub mod services;

pub use commands::{CreateOrder, OrderLine, PayOrder};
pub use error::{ErrorKind, OrderServiceError};
pub use service::OrderService;
pub use services::{
    InMemoryInventoryService, InMemoryPaymentService, InventoryError, PartOracle, PaymentError,
    PaymentGateway,
};
