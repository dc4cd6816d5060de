//! Job packets describing one unit of algorithm execution work.
//!
//! A packet names the algorithm to run and which pluggable handlers the engine runner wires in
//! (data feed, setup, real-time clock, transactions). Exactly one of the backtest or live shapes
//! is ever populated, and the execution mode follows from which one it is.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::VERSION;

/// Whether a job replays history or trades against a brokerage.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    Backtest,
    Live,
}

/// Discriminates the packets that travel between the queue, the runner and the console.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PacketType {
    BacktestNode,
    LiveNode,
    Debug,
}

/// Source of market data for the run.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DataFeedEndpoint {
    Backtesting,
    FileSystem,
    LiveTrading,
    Database,
}

/// How the algorithm is initialized before the first data point.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SetupHandlerEndpoint {
    Console,
    Backtesting,
    Brokerage,
}

/// Clock driving scheduled events.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RealTimeEndpoint {
    Backtesting,
    LiveTrading,
}

/// Path orders take to be filled.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TransactionHandlerEndpoint {
    Backtesting,
    Brokerage,
}

/// The set of handlers wired into one run.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Endpoints {
    pub data: DataFeedEndpoint,
    pub setup: SetupHandlerEndpoint,
    pub real_time: RealTimeEndpoint,
    pub transaction: TransactionHandlerEndpoint,
}

impl Endpoints {
    /// Historical replay from local files.
    #[must_use]
    pub const fn backtest() -> Self {
        Self {
            data: DataFeedEndpoint::FileSystem,
            setup: SetupHandlerEndpoint::Console,
            real_time: RealTimeEndpoint::Backtesting,
            transaction: TransactionHandlerEndpoint::Backtesting,
        }
    }

    /// Live session routed through a brokerage connection.
    #[must_use]
    pub const fn live() -> Self {
        Self {
            data: DataFeedEndpoint::LiveTrading,
            setup: SetupHandlerEndpoint::Brokerage,
            real_time: RealTimeEndpoint::LiveTrading,
            transaction: TransactionHandlerEndpoint::Brokerage,
        }
    }
}

/// Fields shared by every job packet.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AlgorithmNode {
    pub endpoints: Endpoints,
    /// Compiled algorithm; shipped by location, so it is not part of the serialized packet.
    #[serde(skip)]
    pub algorithm: Vec<u8>,
    pub version: String,
    pub user_id: i32,
    pub project_id: i32,
    pub compile_id: String,
    pub algorithm_id: String,
}

impl AlgorithmNode {
    pub fn new(endpoints: Endpoints, algorithm: Vec<u8>) -> Self {
        Self {
            endpoints,
            algorithm,
            version: VERSION.to_string(),
            user_id: 0,
            project_id: 0,
            compile_id: String::new(),
            algorithm_id: String::new(),
        }
    }
}

/// A historical simulation request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BacktestJob {
    pub node: AlgorithmNode,
    pub starting_capital: Decimal,
    pub data_source: String,
    pub backtest_id: String,
}

impl BacktestJob {
    /// Default data source name for local backtests.
    pub const DEFAULT_DATA_SOURCE: &'static str = "local";

    /// Local backtest with the fixed backtesting endpoints and default identifiers.
    pub fn local(algorithm: Vec<u8>) -> Self {
        Self {
            node: AlgorithmNode::new(Endpoints::backtest(), algorithm),
            starting_capital: Self::default_starting_capital(),
            data_source: Self::DEFAULT_DATA_SOURCE.to_string(),
            backtest_id: String::new(),
        }
    }

    /// Default starting cash for local backtests.
    #[must_use]
    pub fn default_starting_capital() -> Decimal {
        Decimal::from(10_000)
    }

    #[must_use]
    pub fn with_starting_capital(mut self, capital: Decimal) -> Self {
        self.starting_capital = capital;
        self
    }

    #[must_use]
    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = source.into();
        self
    }
}

/// A live trading session against a brokerage.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LiveJob {
    pub node: AlgorithmNode,
    /// Declared type identifier of the brokerage to connect through.
    pub brokerage: String,
    pub channel: String,
    /// Connection metadata for the brokerage; empty when it could not be resolved.
    #[serde(default)]
    pub brokerage_data: HashMap<String, String>,
    pub deploy_id: String,
}

impl LiveJob {
    pub fn new(brokerage: impl Into<String>, algorithm: Vec<u8>) -> Self {
        Self {
            node: AlgorithmNode::new(Endpoints::live(), algorithm),
            brokerage: brokerage.into(),
            channel: String::new(),
            brokerage_data: HashMap::new(),
            deploy_id: String::new(),
        }
    }

    /// Route fills through the backtesting transaction handler instead of a brokerage connection.
    pub fn settle_through_backtesting(&mut self) {
        self.node.endpoints.transaction = TransactionHandlerEndpoint::Backtesting;
    }
}

/// A complete job packet. The variant fixes the execution mode.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AlgorithmJob {
    Backtest(BacktestJob),
    Live(LiveJob),
}

impl AlgorithmJob {
    #[must_use]
    pub fn mode(&self) -> JobMode {
        match self {
            Self::Backtest(_) => JobMode::Backtest,
            Self::Live(_) => JobMode::Live,
        }
    }

    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::Backtest(_) => PacketType::BacktestNode,
            Self::Live(_) => PacketType::LiveNode,
        }
    }

    #[must_use]
    pub fn node(&self) -> &AlgorithmNode {
        match self {
            Self::Backtest(job) => &job.node,
            Self::Live(job) => &job.node,
        }
    }

    pub fn node_mut(&mut self) -> &mut AlgorithmNode {
        match self {
            Self::Backtest(job) => &mut job.node,
            Self::Live(job) => &mut job.node,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        self.node().endpoints
    }

    #[must_use]
    pub fn as_live(&self) -> Option<&LiveJob> {
        match self {
            Self::Live(job) => Some(job),
            Self::Backtest(_) => None,
        }
    }

    #[must_use]
    pub fn as_backtest(&self) -> Option<&BacktestJob> {
        match self {
            Self::Backtest(job) => Some(job),
            Self::Live(_) => None,
        }
    }
}

impl From<BacktestJob> for AlgorithmJob {
    fn from(job: BacktestJob) -> Self {
        Self::Backtest(job)
    }
}

impl From<LiveJob> for AlgorithmJob {
    fn from(job: LiveJob) -> Self {
        Self::Live(job)
    }
}

/// Debug message from a user's algorithm bound for their console.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct DebugPacket {
    pub message: String,
    pub algorithm_id: String,
    pub compile_id: String,
    pub project_id: i32,
}

impl DebugPacket {
    pub fn new(
        project_id: i32,
        algorithm_id: impl Into<String>,
        compile_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            algorithm_id: algorithm_id.into(),
            compile_id: compile_id.into(),
            project_id,
        }
    }

    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        PacketType::Debug
    }
}
