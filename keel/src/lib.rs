//! Keel aggregate crate that re-exports the main components for downstream users.

pub use keel_broker as broker;
pub use keel_config as config;
pub use keel_core as core;
pub use keel_paper as paper;
pub use keel_portfolio as portfolio;
pub use keel_queue as queue;

/// Convenience prelude to pull commonly used items into scope.
pub mod prelude {
    pub use keel_broker::*;
    pub use keel_config::*;
    pub use keel_core::*;
    pub use keel_paper::*;
    pub use keel_portfolio::*;
    pub use keel_queue::*;
}
