//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Orders are written once by checkout and never updated, so every stored
/// order is `Confirmed`. The enum leaves room for fulfilment states without
/// changing the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Confirmed,
}

impl OrderStatus {
    /// The status as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
