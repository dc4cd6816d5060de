//! Paper-trading brokerage used for live sessions that settle fills locally.

use std::sync::Arc;

use keel_broker::{BrokerageData, BrokerageFactory, BrokerageRegistry};

/// Declared type identifier of the built-in paper brokerage.
pub const PAPER_BROKERAGE: &str = "PaperBrokerage";

/// Factory for the paper brokerage. It needs no connection settings by default.
#[derive(Clone, Debug, Default)]
pub struct PaperBrokerageFactory {
    data: BrokerageData,
}

impl PaperBrokerageFactory {
    /// Attach settings such as a starting cash balance for the paper account.
    #[must_use]
    pub fn with_data(mut self, data: BrokerageData) -> Self {
        self.data = data;
        self
    }
}

impl BrokerageFactory for PaperBrokerageFactory {
    fn brokerage_type(&self) -> &str {
        PAPER_BROKERAGE
    }

    fn brokerage_data(&self) -> BrokerageData {
        self.data.clone()
    }
}

pub fn register_factory(registry: &BrokerageRegistry) {
    registry.register(Arc::new(PaperBrokerageFactory::default()));
}
