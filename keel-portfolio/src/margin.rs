//! Margin call enforcement.
//!
//! When an account falls below its margin requirement, the risk layer generates one liquidation
//! order per holding and hands them to a [`MarginCallModel`], which decides which of them actually
//! run. The default [`LossFirstMarginCallModel`] liquidates the biggest losers first, one order at
//! a time, and stops as soon as the account is compliant again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keel_config::{MarginCallConfig, OrderTimeoutPolicy};
use keel_core::{Order, OrderId, Symbol};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

use crate::{OrderTransactions, SecurityPortfolio};

/// Result alias for margin call execution.
pub type MarginCallResult<T> = Result<T, MarginCallError>;

#[derive(Debug, Error)]
pub enum MarginCallError {
    /// A candidate references a symbol the portfolio does not hold. Nothing was submitted.
    #[error("margin call order references untracked symbol {0}")]
    InvalidCandidateOrder(Symbol),
    /// A liquidation order did not reach a terminal state in time and the model was configured to
    /// abort. `executed` holds the orders that completed before it.
    #[error("liquidation order {order_id} did not complete within {timeout:?}")]
    OrderExecutionBlocked {
        order_id: OrderId,
        timeout: Duration,
        executed: Vec<Order>,
    },
}

/// Policy choosing which generated margin call orders get executed.
#[async_trait]
pub trait MarginCallModel: Send + Sync {
    /// Execute orders until the account is back within its margin requirement.
    ///
    /// Returns the orders that were executed, in execution order.
    async fn execute_margin_call(&self, candidates: Vec<Order>) -> MarginCallResult<Vec<Order>>;
}

/// Model that never liquidates anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMarginCallModel;

#[async_trait]
impl MarginCallModel for NullMarginCallModel {
    async fn execute_margin_call(&self, _candidates: Vec<Order>) -> MarginCallResult<Vec<Order>> {
        Ok(Vec::new())
    }
}

/// Liquidates candidates in ascending unrealized profit, synchronously, until compliant.
///
/// Candidates with equal unrealized profit keep their input order. Each order is submitted and
/// awaited before the next one is considered, and margin is re-read after every step, so the model
/// never liquidates more than the current margin state calls for. Calls are serialized: a second
/// invocation waits for the first and then sees the post-liquidation margin.
pub struct LossFirstMarginCallModel {
    portfolio: Arc<dyn SecurityPortfolio>,
    transactions: Arc<dyn OrderTransactions>,
    order_timeout: Option<Duration>,
    on_timeout: OrderTimeoutPolicy,
    in_progress: AsyncMutex<()>,
}

impl LossFirstMarginCallModel {
    /// Build a model with the default margin call settings.
    pub fn new(
        portfolio: Arc<dyn SecurityPortfolio>,
        transactions: Arc<dyn OrderTransactions>,
    ) -> Self {
        Self::from_config(portfolio, transactions, &MarginCallConfig::default())
    }

    pub fn from_config(
        portfolio: Arc<dyn SecurityPortfolio>,
        transactions: Arc<dyn OrderTransactions>,
        config: &MarginCallConfig,
    ) -> Self {
        Self {
            portfolio,
            transactions,
            order_timeout: config.order_timeout(),
            on_timeout: config.on_timeout,
            in_progress: AsyncMutex::new(()),
        }
    }

    /// Bound each wait for a terminal order state; `None` waits indefinitely.
    #[must_use]
    pub fn with_order_timeout(mut self, order_timeout: Option<Duration>) -> Self {
        self.order_timeout = order_timeout;
        self
    }

    #[must_use]
    pub fn with_timeout_policy(mut self, policy: OrderTimeoutPolicy) -> Self {
        self.on_timeout = policy;
        self
    }

    /// Portfolio this model transacts against.
    pub fn portfolio(&self) -> &Arc<dyn SecurityPortfolio> {
        &self.portfolio
    }

    fn is_compliant(&self) -> bool {
        self.portfolio.margin_remaining() >= Decimal::ZERO
    }

    /// Order candidates biggest loser first, rejecting the batch on any untracked symbol.
    fn rank(&self, candidates: Vec<Order>) -> MarginCallResult<Vec<Order>> {
        let mut ranked = Vec::with_capacity(candidates.len());
        for order in candidates {
            let security = self
                .portfolio
                .security(&order.symbol)
                .ok_or_else(|| MarginCallError::InvalidCandidateOrder(order.symbol.clone()))?;
            ranked.push((security.unrealized_profit, order));
        }
        // stable: ties keep input order
        ranked.sort_by_key(|(profit, _)| *profit);
        Ok(ranked.into_iter().map(|(_, order)| order).collect())
    }

    /// Submit one order and wait for it, recording it in `executed` once it reaches a terminal
    /// state. Failed submissions and failed waits leave `executed` untouched.
    async fn liquidate(&self, mut order: Order, executed: &mut Vec<Order>) -> MarginCallResult<()> {
        let Ok(order_id) = self.transactions.submit_order(order.clone()).await else {
            return Ok(());
        };

        let wait = self.transactions.wait_for_order(&order_id);
        let outcome = match self.order_timeout {
            None => wait.await,
            Some(limit) => {
                let waited = timeout(limit, wait).await;
                match waited {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        return match self.on_timeout {
                            OrderTimeoutPolicy::Skip => Ok(()),
                            OrderTimeoutPolicy::Abort => {
                                Err(MarginCallError::OrderExecutionBlocked {
                                    order_id,
                                    timeout: limit,
                                    executed: std::mem::take(executed),
                                })
                            }
                        };
                    }
                }
            }
        };

        if let Ok(status) = outcome {
            order.id = order_id;
            order.status = status;
            executed.push(order);
        }
        Ok(())
    }
}

#[async_trait]
impl MarginCallModel for LossFirstMarginCallModel {
    async fn execute_margin_call(&self, candidates: Vec<Order>) -> MarginCallResult<Vec<Order>> {
        let _guard = self.in_progress.lock().await;

        if self.is_compliant() {
            return Ok(Vec::new());
        }

        let ranked = self.rank(candidates)?;
        let mut executed = Vec::new();
        for order in ranked {
            self.liquidate(order, &mut executed).await?;
            if self.is_compliant() {
                break;
            }
        }
        Ok(executed)
    }
}
