//! Collaborator traits and in-memory implementations for the order service.

pub mod inventory;
pub mod payment;

pub use inventory::{InMemoryInventoryService, InventoryError, PartOracle};
pub use payment::{InMemoryPaymentService, PaymentError, PaymentGateway};
