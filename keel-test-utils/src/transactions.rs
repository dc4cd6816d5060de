use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use keel_core::{Order, OrderId, OrderStatus, Price, Symbol};
use keel_portfolio::{OrderTransactions, PortfolioError, PortfolioResult};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::MockPortfolio;

/// How the mock transaction layer treats orders for a symbol.
#[derive(Clone, Copy, Debug)]
pub enum FillBehaviour {
    /// Fill immediately and move portfolio margin by `margin_relief`.
    Fill { margin_relief: Price },
    /// Accept the order, then reject it without touching margin.
    Reject,
    /// Refuse the submission outright.
    RejectSubmission,
    /// Accept the order but never let it reach a terminal state.
    Stall,
}

impl Default for FillBehaviour {
    fn default() -> Self {
        Self::Fill {
            margin_relief: Decimal::ZERO,
        }
    }
}

/// Transaction layer that settles orders against a [`MockPortfolio`] and records every call.
pub struct MockTransactions {
    portfolio: Arc<MockPortfolio>,
    behaviours: Mutex<HashMap<Symbol, FillBehaviour>>,
    submitted: Mutex<Vec<Order>>,
    statuses: Mutex<HashMap<OrderId, OrderStatus>>,
}

impl MockTransactions {
    pub fn new(portfolio: Arc<MockPortfolio>) -> Self {
        Self {
            portfolio,
            behaviours: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            statuses: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_behaviour(self, symbol: impl Into<Symbol>, behaviour: FillBehaviour) -> Self {
        self.behaviours.lock().insert(symbol.into(), behaviour);
        self
    }

    /// Shorthand for a symbol whose fill restores `margin_relief` of margin.
    #[must_use]
    pub fn with_relief(self, symbol: impl Into<Symbol>, margin_relief: Price) -> Self {
        self.with_behaviour(symbol, FillBehaviour::Fill { margin_relief })
    }

    /// Every order handed to `submit_order`, including refused ones.
    pub fn submitted(&self) -> Vec<Order> {
        self.submitted.lock().clone()
    }

    pub fn submitted_symbols(&self) -> Vec<Symbol> {
        self.submitted
            .lock()
            .iter()
            .map(|order| order.symbol.clone())
            .collect()
    }

    fn behaviour_for(&self, symbol: &str) -> FillBehaviour {
        self.behaviours
            .lock()
            .get(symbol)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderTransactions for MockTransactions {
    async fn submit_order(&self, order: Order) -> PortfolioResult<OrderId> {
        self.submitted.lock().push(order.clone());
        let status = match self.behaviour_for(&order.symbol) {
            FillBehaviour::RejectSubmission => {
                return Err(PortfolioError::Submission(format!(
                    "{} refused by mock transactions",
                    order.id
                )))
            }
            FillBehaviour::Fill { margin_relief } => {
                self.portfolio.adjust_margin(margin_relief);
                OrderStatus::Filled
            }
            FillBehaviour::Reject => OrderStatus::Rejected,
            FillBehaviour::Stall => OrderStatus::Submitted,
        };
        self.statuses.lock().insert(order.id.clone(), status);
        Ok(order.id)
    }

    async fn wait_for_order(&self, order_id: &OrderId) -> PortfolioResult<OrderStatus> {
        tokio::task::yield_now().await;
        let status = self
            .statuses
            .lock()
            .get(order_id)
            .copied()
            .ok_or_else(|| PortfolioError::UnknownOrder(order_id.clone()))?;
        if status.is_terminal() {
            Ok(status)
        } else {
            std::future::pending().await
        }
    }
}
