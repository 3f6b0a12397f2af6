//! Value objects for the order domain.

use common::{PartId, TransactionId};
use serde::{Deserialize, Serialize};

/// Money amount held in minor units (cents) so that totals are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self { cents: units * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount in currency units as a float, for display on the wire.
    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity. Returns `None` if the result does not fit.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts. Returns `None` if the result does not fit.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Read-only view of a catalog part, as reported by the inventory service.
///
/// The order service never persists parts; it copies name and price into
/// an [`Item`] at the moment an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Catalog identifier.
    pub part_id: PartId,

    /// Human-readable part name.
    pub name: String,

    /// Current price per unit.
    pub unit_price: Money,

    /// Units currently in stock.
    pub available_quantity: u64,
}

impl Part {
    /// Creates a new part view.
    pub fn new(
        part_id: impl Into<PartId>,
        name: impl Into<String>,
        unit_price: Money,
        available_quantity: u64,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            name: name.into(),
            unit_price,
            available_quantity,
        }
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.available_quantity >= u64::from(quantity)
    }
}

/// A line item in an order, with pricing snapshotted at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// The part identifier.
    pub part_id: PartId,

    /// Part name at the time the order was placed.
    pub name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit at the time the order was placed.
    pub unit_price: Money,
}

impl Item {
    /// Creates a new line item.
    pub fn new(
        part_id: impl Into<PartId>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// Snapshots a catalog part into a line item.
    pub fn from_part(part: &Part, quantity: u32) -> Self {
        Self {
            part_id: part.part_id.clone(),
            name: part.name.clone(),
            quantity,
            unit_price: part.unit_price,
        }
    }

    /// Returns the total price for this line (quantity * unit_price), or
    /// `None` if it overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

/// Payment method accepted by the payment service.
///
/// Unrecognised names deserialize to `Unknown`; the payment service decides
/// whether to accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Sbp,
    CreditCard,
    InvestorMoney,
    #[serde(other)]
    Unknown,
}

impl PaymentMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::Sbp => "SBP",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::InvestorMoney => "INVESTOR_MONEY",
            PaymentMethod::Unknown => "UNKNOWN",
        }
    }

    /// Maps a wire name to a method; anything unrecognised is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "CARD" => PaymentMethod::Card,
            "SBP" => PaymentMethod::Sbp,
            "CREDIT_CARD" => PaymentMethod::CreditCard,
            "INVESTOR_MONEY" => PaymentMethod::InvestorMoney,
            _ => PaymentMethod::Unknown,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Details of a successful payment, attached to a paid order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Method the order was paid with.
    pub method: PaymentMethod,

    /// Transaction issued by the payment service.
    pub transaction_id: TransactionId,
}

impl Payment {
    /// Creates new payment details.
    pub fn new(method: PaymentMethod, transaction_id: impl Into<TransactionId>) -> Self {
        Self {
            method,
            transaction_id: transaction_id.into(),
        }
    }
}
