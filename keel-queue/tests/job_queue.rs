use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use keel_broker::{BrokerageRegistry, ConfiguredBrokerageFactory};
use keel_config::JobConfig;
use keel_core::{
    DataFeedEndpoint, Endpoints, JobMode, PacketType, RealTimeEndpoint, SetupHandlerEndpoint,
    TransactionHandlerEndpoint,
};
use keel_paper::{register_factory, PAPER_BROKERAGE};
use keel_queue::{JobQueue, JobQueueHandler};
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn algorithm_file(bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("algorithm.bin");
    fs::write(&path, bytes).unwrap();
    (dir, path)
}

fn registry_with_paper() -> Arc<BrokerageRegistry> {
    let registry = BrokerageRegistry::new();
    register_factory(&registry);
    Arc::new(registry)
}

fn live_config(location: PathBuf, brokerage: Option<&str>) -> JobConfig {
    JobConfig {
        live_mode: true,
        live_mode_brokerage: brokerage.map(str::to_string),
        channel: "desktop-channel".into(),
        user_id: 42,
        algorithm_location: location,
        ..JobConfig::default()
    }
}

#[test]
fn backtest_mode_uses_backtesting_endpoints_and_default_capital() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let config = JobConfig {
        algorithm_location: path.clone(),
        ..JobConfig::default()
    };
    let mut queue = JobQueue::new(config, registry_with_paper());

    let (job, location) = queue.next_job();

    assert_eq!(location, path);
    assert_eq!(job.mode(), JobMode::Backtest);
    assert_eq!(job.packet_type(), PacketType::BacktestNode);
    let endpoints = job.endpoints();
    assert_eq!(endpoints.data, DataFeedEndpoint::FileSystem);
    assert_eq!(endpoints.setup, SetupHandlerEndpoint::Console);
    assert_eq!(endpoints.real_time, RealTimeEndpoint::Backtesting);
    assert_eq!(endpoints.transaction, TransactionHandlerEndpoint::Backtesting);
    let backtest = job.as_backtest().unwrap();
    assert_eq!(backtest.starting_capital, dec!(10000));
    assert_eq!(backtest.data_source, "local");
    assert_eq!(job.node().algorithm, b"algorithm");
}

#[test]
fn unset_brokerage_defaults_to_paper_and_settles_through_backtesting() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let mut queue = JobQueue::new(live_config(path, None), registry_with_paper());

    let (job, _) = queue.next_job();

    assert_eq!(job.mode(), JobMode::Live);
    let live = job.as_live().unwrap();
    assert_eq!(live.brokerage, PAPER_BROKERAGE);
    assert_eq!(live.channel, "desktop-channel");
    assert_eq!(live.node.user_id, 42);
    assert!(live.brokerage_data.is_empty());
    let endpoints = job.endpoints();
    assert_eq!(endpoints.transaction, TransactionHandlerEndpoint::Backtesting);
    assert_eq!(endpoints.data, DataFeedEndpoint::LiveTrading);
    assert_eq!(endpoints.setup, SetupHandlerEndpoint::Brokerage);
    assert_eq!(endpoints.real_time, RealTimeEndpoint::LiveTrading);
}

#[test]
fn paper_override_applies_even_without_a_registered_paper_factory() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let mut queue = JobQueue::new(
        live_config(path, Some(PAPER_BROKERAGE)),
        Arc::new(BrokerageRegistry::new()),
    );

    let (job, _) = queue.next_job();

    assert_eq!(
        job.endpoints().transaction,
        TransactionHandlerEndpoint::Backtesting
    );
    assert!(job.as_live().unwrap().brokerage_data.is_empty());
}

#[test]
fn registered_brokerage_supplies_connection_data() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let registry = registry_with_paper();
    let mut data = HashMap::new();
    data.insert("account".to_string(), "DU123456".to_string());
    data.insert("port".to_string(), "4002".to_string());
    registry.register(Arc::new(ConfiguredBrokerageFactory::new(
        "InteractiveBrokersBrokerage",
        data.clone(),
    )));
    let mut queue = JobQueue::new(
        live_config(path, Some("InteractiveBrokersBrokerage")),
        registry,
    );

    let (job, _) = queue.next_job();

    assert_eq!(job.endpoints(), Endpoints::live());
    let live = job.as_live().unwrap();
    assert_eq!(live.brokerage, "InteractiveBrokersBrokerage");
    assert_eq!(live.brokerage_data, data);
}

#[test]
fn unknown_brokerage_degrades_to_empty_connection_data() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let mut queue = JobQueue::new(
        live_config(path, Some("NoSuchBrokerage")),
        registry_with_paper(),
    );

    let (job, _) = queue.next_job();

    let live = job.as_live().unwrap();
    assert_eq!(live.brokerage, "NoSuchBrokerage");
    assert!(live.brokerage_data.is_empty());
    assert_eq!(
        job.endpoints().transaction,
        TransactionHandlerEndpoint::Brokerage
    );
}

#[test]
fn ambiguous_brokerage_degrades_to_empty_connection_data() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let registry = registry_with_paper();
    for account in ["first", "second"] {
        let mut data = HashMap::new();
        data.insert("account".to_string(), account.to_string());
        registry.register(Arc::new(ConfiguredBrokerageFactory::new(
            "OandaBrokerage",
            data,
        )));
    }
    let mut queue = JobQueue::new(live_config(path, Some("OandaBrokerage")), registry);

    let (job, _) = queue.next_job();

    assert!(job.as_live().unwrap().brokerage_data.is_empty());
}

#[test]
fn brokerage_lookup_is_case_sensitive() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let mut queue = JobQueue::new(
        live_config(path, Some("paperbrokerage")),
        registry_with_paper(),
    );

    let (job, _) = queue.next_job();

    let live = job.as_live().unwrap();
    assert_eq!(live.brokerage, "paperbrokerage");
    assert_eq!(
        job.endpoints().transaction,
        TransactionHandlerEndpoint::Brokerage
    );
}

#[test]
fn missing_algorithm_binary_still_yields_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.bin");
    let config = JobConfig {
        algorithm_location: path.clone(),
        ..JobConfig::default()
    };
    let mut queue = JobQueue::new(config, registry_with_paper());

    let (job, location) = queue.next_job();

    assert_eq!(location, path);
    assert_eq!(job.mode(), JobMode::Backtest);
    assert!(job.node().algorithm.is_empty());
}

#[test]
fn configured_capital_and_source_flow_into_backtests() {
    let (_dir, path) = algorithm_file(b"algorithm");
    let config = JobConfig {
        algorithm_location: path,
        starting_capital: dec!(250000),
        data_source: "minute-bars".into(),
        ..JobConfig::default()
    };
    let mut queue = JobQueue::new(config, registry_with_paper());
    queue.initialize();

    let (job, _) = queue.next_job();
    queue.acknowledge_job(&job);

    let backtest = job.as_backtest().unwrap();
    assert_eq!(backtest.starting_capital, dec!(250000));
    assert_eq!(backtest.data_source, "minute-bars");
}
