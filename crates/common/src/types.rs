use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an order.
///
/// Generated by the order service at creation time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for OrderId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OrderId> for Uuid {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Declares an opaque string identifier issued by another system.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of the user placing an order.
    UserId
);

string_id!(
    /// Catalog identifier of a part, as known to the inventory service.
    PartId
);

string_id!(
    /// Transaction identifier issued by the payment service.
    TransactionId
);

string_id!(
    /// Deduplication token attached to a payment charge.
    IdempotencyKey
);

impl IdempotencyKey {
    /// Derives the payment key for an order at a given revision.
    ///
    /// Two charges issued against the same stored revision of an order share
    /// a key, so the payment service can collapse them into one.
    pub fn for_payment(order_id: OrderId, version: Version) -> Self {
        Self(format!("pay-{order_id}-v{version}"))
    }
}

/// Stored revision of an order, used for optimistic concurrency control.
///
/// A freshly created order is stored at version 1; every successful update
/// increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of an order that has not been stored yet (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version assigned on creation (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_new_creates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn order_id_parses_from_string() {
        let uuid = Uuid::new_v4();
        let id: OrderId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<OrderId>().is_err());
    }

    #[test]
    fn order_id_serializes_as_plain_uuid() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn string_ids_expose_their_value() {
        let part: PartId = "engine-1".into();
        assert_eq!(part.as_str(), "engine-1");
        assert!(!part.is_empty());
        assert!(UserId::new("").is_empty());
    }

    #[test]
    fn payment_key_is_stable_per_revision() {
        let order_id = OrderId::new();
        let a = IdempotencyKey::for_payment(order_id, Version::first());
        let b = IdempotencyKey::for_payment(order_id, Version::first());
        let c = IdempotencyKey::for_payment(order_id, Version::new(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn version_ordering() {
        assert!(Version::initial() < Version::first());
        assert_eq!(Version::first().next(), Version::new(2));
        assert_eq!(Version::default(), Version::initial());
    }
}
