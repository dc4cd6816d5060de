use std::sync::Arc;

use keel_config::BrokerageConfig;

use crate::{BrokerageData, BrokerageFactory, BrokerageRegistry};

/// Factory whose identifier and connection settings come straight from configuration.
#[derive(Clone, Debug)]
pub struct ConfiguredBrokerageFactory {
    brokerage_type: String,
    data: BrokerageData,
}

impl ConfiguredBrokerageFactory {
    pub fn new(brokerage_type: impl Into<String>, data: BrokerageData) -> Self {
        Self {
            brokerage_type: brokerage_type.into(),
            data,
        }
    }
}

impl From<&BrokerageConfig> for ConfiguredBrokerageFactory {
    fn from(config: &BrokerageConfig) -> Self {
        Self::new(config.name.clone(), config.data.clone())
    }
}

impl BrokerageFactory for ConfiguredBrokerageFactory {
    fn brokerage_type(&self) -> &str {
        &self.brokerage_type
    }

    fn brokerage_data(&self) -> BrokerageData {
        self.data.clone()
    }
}

/// Register one factory per `[[brokerages]]` entry.
pub fn register_configured(registry: &BrokerageRegistry, brokerages: &[BrokerageConfig]) {
    for config in brokerages {
        registry.register(Arc::new(ConfiguredBrokerageFactory::from(config)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_each_configured_entry() {
        let mut data = BrokerageData::new();
        data.insert("port".into(), "4002".into());
        let entries = vec![
            BrokerageConfig {
                name: "InteractiveBrokersBrokerage".into(),
                data,
            },
            BrokerageConfig {
                name: "TradierBrokerage".into(),
                data: BrokerageData::new(),
            },
        ];
        let registry = BrokerageRegistry::new();
        register_configured(&registry, &entries);

        let ib = registry.by_type("InteractiveBrokersBrokerage").unwrap();
        assert_eq!(ib.brokerage_data()["port"], "4002");
        assert!(registry
            .by_type("TradierBrokerage")
            .unwrap()
            .brokerage_data()
            .is_empty());
    }
}
