//! Job queue handlers that decide what the engine runs next.
//!
//! The local [`JobQueue`] reads the mode flag from its [`JobConfig`] snapshot and builds either a
//! backtest or a live packet. Live packets resolve brokerage connection metadata through the
//! [`BrokerageRegistry`]; when that fails the packet is still returned, only without metadata, and
//! the failure is logged. Preparing a job never fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_broker::BrokerageRegistry;
use keel_config::JobConfig;
use keel_core::{AlgorithmJob, BacktestJob, LiveJob};
use keel_paper::PAPER_BROKERAGE;
use tracing::{error, info};

/// Source of job packets for the engine runner.
pub trait JobQueueHandler {
    /// Prepare the queue before the first pull.
    fn initialize(&mut self) {}

    /// Build the next job together with the location of its algorithm binary.
    fn next_job(&mut self) -> (AlgorithmJob, PathBuf);

    /// Tell the source the job was taken. Remote queues use this to dequeue.
    fn acknowledge_job(&mut self, job: &AlgorithmJob);
}

/// Desktop job queue serving a single locally built algorithm.
pub struct JobQueue {
    config: JobConfig,
    registry: Arc<BrokerageRegistry>,
}

impl JobQueue {
    pub fn new(config: JobConfig, registry: Arc<BrokerageRegistry>) -> Self {
        Self { config, registry }
    }

    #[must_use]
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Physical location of the algorithm binary.
    #[must_use]
    pub fn algorithm_location(&self) -> &Path {
        &self.config.algorithm_location
    }

    /// Brokerage identifier for live jobs, defaulting to paper trading.
    #[must_use]
    pub fn brokerage(&self) -> &str {
        self.config
            .live_mode_brokerage
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(PAPER_BROKERAGE)
    }

    /// Build the next packet without touching queue state.
    pub fn prepare_job(&self) -> AlgorithmJob {
        let algorithm = self.load_algorithm();
        let job = if self.config.live_mode {
            AlgorithmJob::Live(self.live_job(algorithm))
        } else {
            AlgorithmJob::Backtest(self.backtest_job(algorithm))
        };
        info!(
            mode = ?job.mode(),
            endpoints = ?job.endpoints(),
            location = %self.algorithm_location().display(),
            "prepared job"
        );
        job
    }

    fn load_algorithm(&self) -> Vec<u8> {
        match fs::read(self.algorithm_location()) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(
                    location = %self.algorithm_location().display(),
                    error = %err,
                    "failed to read algorithm binary; job will carry an empty algorithm"
                );
                Vec::new()
            }
        }
    }

    fn live_job(&self, algorithm: Vec<u8>) -> LiveJob {
        let brokerage = self.brokerage();
        let mut job = LiveJob::new(brokerage, algorithm);
        job.channel = self.config.channel.clone();
        job.node.user_id = self.config.user_id;

        match self.registry.by_type(brokerage) {
            Ok(factory) => job.brokerage_data = factory.brokerage_data(),
            Err(err) => error!(
                brokerage,
                error = %err,
                "failed to resolve brokerage data for live job"
            ),
        }

        // paper fills settle through the backtesting transaction handler
        if brokerage == PAPER_BROKERAGE {
            job.settle_through_backtesting();
        }
        job
    }

    fn backtest_job(&self, algorithm: Vec<u8>) -> BacktestJob {
        BacktestJob::local(algorithm)
            .with_starting_capital(self.config.starting_capital)
            .with_data_source(self.config.data_source.clone())
    }
}

impl JobQueueHandler for JobQueue {
    fn next_job(&mut self) -> (AlgorithmJob, PathBuf) {
        (self.prepare_job(), self.algorithm_location().to_path_buf())
    }

    fn acknowledge_job(&mut self, _job: &AlgorithmJob) {}
}
