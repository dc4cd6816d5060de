//! Fundamental data types shared across the entire workspace.

pub mod identifiers;
pub mod packets;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use identifiers::{CurrencyPair, IdentifierParseError};
pub use packets::{
    AlgorithmJob, AlgorithmNode, BacktestJob, DataFeedEndpoint, DebugPacket, Endpoints, JobMode,
    LiveJob, PacketType, RealTimeEndpoint, SetupHandlerEndpoint, TransactionHandlerEndpoint,
};

/// Engine version stamped onto every job packet.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tag attached to orders generated in response to a margin breach.
pub const MARGIN_CALL_TAG: &str = "Margin Call";

/// Alias for price precision.
pub type Price = Decimal;
/// Alias for quantity precision.
pub type Quantity = Decimal;
/// Alias used for human-readable market symbols (e.g., `EURUSD`).
pub type Symbol = String;

/// Unique identifier assigned to orders (exchange or client provided).
pub type OrderId = String;

/// The side of an order or position.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Side {
    /// Buy the instrument.
    Buy,
    /// Sell the instrument.
    Sell,
}

impl Side {
    /// Returns the opposite side (buy <-> sell).
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Side required to flatten a position holding `quantity` (signed) units.
    #[must_use]
    pub fn closing(quantity: Quantity) -> Self {
        if quantity.is_sign_negative() {
            Self::Buy
        } else {
            Self::Sell
        }
    }
}

/// Order execution style.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderType {
    /// Execute immediately at best available price.
    Market,
    /// Execute at the provided limit price.
    Limit,
}

/// High-level order status maintained inside the framework.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderStatus {
    New,
    Submitted,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    /// Whether the order can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Rejected)
    }
}

/// Order representation tracked by the transaction layer.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Option<Price>,
    pub status: OrderStatus,
    #[serde(default)]
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a new market order with a freshly generated identifier.
    pub fn market(symbol: impl Into<Symbol>, side: Side, quantity: Quantity) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity: quantity.abs(),
            price: None,
            status: OrderStatus::New,
            tag: None,
            created_at: Utc::now(),
        }
    }

    /// Build a market order that liquidates exposure during a margin call.
    pub fn liquidation(symbol: impl Into<Symbol>, side: Side, quantity: Quantity) -> Self {
        Self::market(symbol, side, quantity).with_tag(MARGIN_CALL_TAG)
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Whether this order was generated by the margin call machinery.
    #[must_use]
    pub fn is_liquidation(&self) -> bool {
        self.tag.as_deref() == Some(MARGIN_CALL_TAG)
    }
}
