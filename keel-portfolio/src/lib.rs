//! Portfolio collaborators consumed by risk enforcement.
//!
//! Accounting happens elsewhere; this crate only describes the views risk code reads
//! ([`SecurityPortfolio`]) and the order path it writes through ([`OrderTransactions`]).

use async_trait::async_trait;
use keel_core::{Order, OrderId, OrderStatus, Price, Quantity, Symbol};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod margin;

pub use margin::{
    LossFirstMarginCallModel, MarginCallError, MarginCallModel, MarginCallResult,
    NullMarginCallModel,
};

/// Result alias for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Portfolio-specific error type.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Raised when an order references a symbol that is not being tracked.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(Symbol),
    /// Raised when an order id is not known to the transaction layer.
    #[error("unknown order: {0}")]
    UnknownOrder(OrderId),
    /// The order could not be handed to the transaction layer.
    #[error("order submission failed: {0}")]
    Submission(String),
    /// Wraps any other issues surfaced by dependencies.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Snapshot of one holding as seen by the portfolio.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Security {
    pub symbol: Symbol,
    /// Signed position size; negative when short.
    pub quantity: Quantity,
    /// Paper profit or loss of the open position.
    pub unrealized_profit: Price,
}

impl Security {
    pub fn new(symbol: impl Into<Symbol>, quantity: Quantity, unrealized_profit: Price) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            unrealized_profit,
        }
    }
}

/// Read-only view of a portfolio's margin state.
pub trait SecurityPortfolio: Send + Sync {
    /// Signed distance from a margin violation; negative means the account is in breach.
    fn margin_remaining(&self) -> Price;

    /// Current snapshot of the holding in `symbol`, if tracked.
    fn security(&self, symbol: &str) -> Option<Security>;
}

/// Order path used to change portfolio state.
#[async_trait]
pub trait OrderTransactions: Send + Sync {
    /// Enqueue an order and return the identifier to wait on.
    async fn submit_order(&self, order: Order) -> PortfolioResult<OrderId>;

    /// Resolve once the order is filled, canceled or rejected.
    async fn wait_for_order(&self, order_id: &OrderId) -> PortfolioResult<OrderStatus>;
}
