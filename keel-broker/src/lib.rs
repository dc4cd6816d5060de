//! Brokerage capability registry used when preparing live jobs.
//!
//! Each brokerage integration registers a [`BrokerageFactory`] that advertises its declared type
//! identifier together with the connection metadata a live session needs. The job queue looks a
//! factory up by identifier; lookups report "nothing matched" and "several matched" as distinct
//! errors instead of panicking so callers can degrade.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

mod configured;

pub use configured::{register_configured, ConfiguredBrokerageFactory};

/// Connection metadata published by a brokerage factory.
pub type BrokerageData = HashMap<String, String>;

/// Convenience alias for registry lookups.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Reasons a single-provider lookup can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No registered factory satisfied the predicate.
    #[error("no brokerage factory matched")]
    NotFound,
    /// More than one registered factory satisfied the predicate.
    #[error("{0} brokerage factories matched, expected exactly one")]
    Ambiguous(usize),
}

/// A pluggable brokerage integration discoverable through the registry.
pub trait BrokerageFactory: Send + Sync {
    /// Declared type identifier, e.g. `PaperBrokerage`.
    fn brokerage_type(&self) -> &str;

    /// Metadata required to open a connection to this brokerage.
    fn brokerage_data(&self) -> BrokerageData;
}

/// Registry of brokerage factories keyed by their declared type identifier.
#[derive(Default)]
pub struct BrokerageRegistry {
    factories: RwLock<Vec<Arc<dyn BrokerageFactory>>>,
}

impl BrokerageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory. Registering two factories with the same identifier makes lookups for that
    /// identifier ambiguous rather than replacing the earlier one.
    pub fn register(&self, factory: Arc<dyn BrokerageFactory>) {
        tracing::debug!(brokerage = factory.brokerage_type(), "registered brokerage factory");
        self.factories.write().push(factory);
    }

    /// Return the only factory accepted by `predicate`.
    pub fn single<P>(&self, predicate: P) -> RegistryResult<Arc<dyn BrokerageFactory>>
    where
        P: Fn(&dyn BrokerageFactory) -> bool,
    {
        let factories = self.factories.read();
        let mut matches = factories
            .iter()
            .filter(|factory| predicate(factory.as_ref()));
        let first = matches.next().ok_or(RegistryError::NotFound)?;
        let extra = matches.count();
        if extra > 0 {
            return Err(RegistryError::Ambiguous(extra + 1));
        }
        Ok(first.clone())
    }

    /// Look a factory up by exact, case-sensitive type identifier.
    pub fn by_type(&self, brokerage_type: &str) -> RegistryResult<Arc<dyn BrokerageFactory>> {
        self.single(|factory| factory.brokerage_type() == brokerage_type)
    }

    /// Identifiers of every registered factory in registration order.
    #[must_use]
    pub fn registered(&self) -> Vec<String> {
        self.factories
            .read()
            .iter()
            .map(|factory| factory.brokerage_type().to_string())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory(name: &str, account: &str) -> Arc<dyn BrokerageFactory> {
        let mut data = BrokerageData::new();
        data.insert("account".into(), account.into());
        Arc::new(ConfiguredBrokerageFactory::new(name, data))
    }

    #[test]
    fn lookup_distinguishes_missing_from_ambiguous() {
        let registry = BrokerageRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.by_type("OandaBrokerage").err(),
            Some(RegistryError::NotFound)
        );

        registry.register(factory("OandaBrokerage", "one"));
        registry.register(factory("OandaBrokerage", "two"));
        registry.register(factory("FxcmBrokerage", "three"));
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.by_type("OandaBrokerage").err(),
            Some(RegistryError::Ambiguous(2))
        );

        let found = registry.by_type("FxcmBrokerage").unwrap();
        assert_eq!(found.brokerage_data()["account"], "three");
    }

    #[test]
    fn type_matching_is_case_sensitive() {
        let registry = BrokerageRegistry::new();
        registry.register(factory("OandaBrokerage", "one"));
        assert!(registry.by_type("oandabrokerage").is_err());
        assert!(registry.by_type("Oanda").is_err());
        assert!(registry.by_type("OandaBrokerage").is_ok());
    }

    #[test]
    fn predicate_lookup_and_listing() {
        let registry = BrokerageRegistry::new();
        registry.register(factory("OandaBrokerage", "one"));
        registry.register(factory("FxcmBrokerage", "two"));
        let found = registry
            .single(|factory| {
                factory.brokerage_data().get("account").map(String::as_str) == Some("two")
            })
            .unwrap();
        assert_eq!(found.brokerage_type(), "FxcmBrokerage");
        assert_eq!(registry.registered(), vec!["OandaBrokerage", "FxcmBrokerage"]);
    }
}
