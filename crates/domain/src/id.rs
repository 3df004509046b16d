//! Typed identifier newtypes.
//!
//! House, room, and device identifiers are small integers assigned
//! monotonically by their owning container (a room id is unique within its
//! house, a device id within its room). Client identifiers are random UUIDs
//! minted by the transport when a connection is accepted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_numeric_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw numeric identifier.
            #[must_use]
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            /// Access the raw numeric value.
            #[must_use]
            pub fn value(self) -> u32 {
                self.0
            }

            /// The identifier following this one in assignment order.
            #[must_use]
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_numeric_id!(
    /// Unique identifier for a [`House`](crate::house::House).
    HouseId
);

define_numeric_id!(
    /// Identifier for a [`Room`](crate::room::Room), unique within its house.
    RoomId
);

define_numeric_id!(
    /// Identifier for a [`Device`](crate::device::Device), unique within its
    /// room and never reused after deletion.
    DeviceId
);

/// Opaque handle for a connected client, minted by the transport layer.
///
/// The core only ever uses this for lookups into the collaborator-owned
/// connection table; it never creates or closes connections itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(uuid::Uuid);

impl Default for ClientId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ClientId {
    /// Generate a new random client identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ClientId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_increment_when_next_called() {
        let id = DeviceId::new(3);
        assert_eq!(id.next(), DeviceId::new(4));
    }

    #[test]
    fn should_order_numeric_ids_by_value() {
        assert!(RoomId::new(1) < RoomId::new(2));
    }

    #[test]
    fn should_roundtrip_numeric_id_through_serde_json() {
        let id = HouseId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let parsed: HouseId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_generate_unique_client_ids() {
        assert_ne!(ClientId::new(), ClientId::new());
    }

    #[test]
    fn should_roundtrip_client_id_through_display_and_from_str() {
        let id = ClientId::new();
        let parsed: ClientId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
