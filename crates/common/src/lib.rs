//! Shared identifier types used across the order backend crates.

pub mod types;

pub use types::{IdempotencyKey, OrderId, PartId, TransactionId, UserId, Version};
