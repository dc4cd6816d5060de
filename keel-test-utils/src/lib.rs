//! In-memory portfolio and transaction doubles for exercising margin call flows end-to-end.

pub mod portfolio;
pub mod transactions;

pub use portfolio::MockPortfolio;
pub use transactions::{FillBehaviour, MockTransactions};
