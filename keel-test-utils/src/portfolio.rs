use std::collections::HashMap;

use keel_core::{Price, Quantity, Symbol};
use keel_portfolio::{Security, SecurityPortfolio};
use parking_lot::Mutex;

/// Portfolio whose margin and holdings are set directly by the test.
pub struct MockPortfolio {
    state: Mutex<PortfolioState>,
}

struct PortfolioState {
    margin_remaining: Price,
    securities: HashMap<Symbol, Security>,
}

impl MockPortfolio {
    pub fn new(margin_remaining: Price) -> Self {
        Self {
            state: Mutex::new(PortfolioState {
                margin_remaining,
                securities: HashMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn with_security(
        self,
        symbol: impl Into<Symbol>,
        quantity: Quantity,
        unrealized_profit: Price,
    ) -> Self {
        let security = Security::new(symbol, quantity, unrealized_profit);
        self.state
            .lock()
            .securities
            .insert(security.symbol.clone(), security);
        self
    }

    pub fn set_margin_remaining(&self, value: Price) {
        self.state.lock().margin_remaining = value;
    }

    /// Shift margin by `delta`, returning the new value.
    pub fn adjust_margin(&self, delta: Price) -> Price {
        let mut state = self.state.lock();
        state.margin_remaining += delta;
        state.margin_remaining
    }
}

impl SecurityPortfolio for MockPortfolio {
    fn margin_remaining(&self) -> Price {
        self.state.lock().margin_remaining
    }

    fn security(&self, symbol: &str) -> Option<Security> {
        self.state.lock().securities.get(symbol).cloned()
    }
}
