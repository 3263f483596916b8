//! Search sessions
//!
//! A session binds one target digest and one configuration to a shared
//! engine, scheduler and monitor. Packet jobs and node jobs are both thin
//! callers over that engine.

use crate::codec::CrackResult;
use crate::config::SearchConfig;
use crate::crypto::TargetDigest;
use crate::error::{Result, SearchError};
use crate::monitor::{MonitorConfig, SearchMonitor};
use crate::packet::{JobPacket, PacketScheduler};
use crate::partition::{partition, SearchRange};
use crate::search::{CancelToken, SearchEngine, SearchOutcome, SearchState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How a node job walks its range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// One attempt at a time on the calling thread
    Sequential,
    /// Windows of concurrent batches on the worker pool
    #[default]
    Batched,
}

/// Work a session can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchJob {
    /// A single packet from the global packet sequence
    Packet(u64),
    /// Consecutive packets from `first`; `count: None` runs until a match,
    /// a cancel or the end of the configured space
    Packets { first: u64, count: Option<u64> },
    /// One node's share of one length
    Node {
        total_nodes: usize,
        node_index: usize,
        length: usize,
        mode: ScanMode,
    },
}

/// Summary of one searched packet
#[derive(Debug, Clone, PartialEq)]
pub struct PacketSummary {
    pub packet: JobPacket,
    pub state: SearchState,
    pub attempts: u64,
}

/// What a job ended with
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    /// `Found`, `Exhausted` or `Cancelled`
    pub state: SearchState,
    /// The match, or the last sentinel / partial result
    pub result: Option<CrackResult>,
    /// Packets searched, in order (empty for node jobs)
    pub packets: Vec<PacketSummary>,
    /// A packet past the configured maximum length was requested
    pub space_exhausted: bool,
    pub attempts: u64,
    pub elapsed: Duration,
}

impl SessionReport {
    pub fn found(&self) -> Option<&CrackResult> {
        self.result.as_ref().filter(|r| r.found)
    }

    fn from_outcome(outcome: SearchOutcome) -> Self {
        Self {
            state: outcome.state,
            result: outcome.result,
            packets: Vec::new(),
            space_exhausted: false,
            attempts: outcome.attempts,
            elapsed: outcome.elapsed,
        }
    }
}

/// Main search session
#[derive(Debug)]
pub struct SearchSession {
    config: SearchConfig,
    engine: SearchEngine,
    scheduler: PacketScheduler,
    monitor: Arc<SearchMonitor>,
    cancel: CancelToken,
}

impl SearchSession {
    /// Create a session with a monitor derived from `config`
    pub fn new(config: SearchConfig, target: TargetDigest) -> Result<Self> {
        let monitor = Arc::new(SearchMonitor::new(MonitorConfig::from_search_config(&config)));
        Self::with_monitor(config, target, monitor)
    }

    /// Create a session reporting to an existing monitor
    pub fn with_monitor(
        config: SearchConfig,
        target: TargetDigest,
        monitor: Arc<SearchMonitor>,
    ) -> Result<Self> {
        let engine = SearchEngine::from_config(&config, target)?;
        let scheduler = PacketScheduler::new(
            engine.keyspace().clone(),
            config.packet_capacity,
            config.max_password_length,
        );

        info!(
            "Initialized search: {} symbols, {} workers, window {}, packet capacity {}, max length {}",
            engine.keyspace().base(),
            engine.workers(),
            engine.batch_window(),
            config.packet_capacity,
            config.max_password_length
        );

        Ok(Self {
            config,
            engine,
            scheduler,
            monitor,
            cancel: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &PacketScheduler {
        &self.scheduler
    }

    pub fn monitor(&self) -> &Arc<SearchMonitor> {
        &self.monitor
    }

    /// Token that stops the running job at its next check
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run a job to a terminal state on the current thread
    pub fn run(&self, job: SearchJob) -> Result<SessionReport> {
        info!(?job, target = %self.engine.target(), "Starting search");
        self.monitor.start();

        let report = match job {
            SearchJob::Packet(number) => Ok(self.run_packets(number, Some(1))),
            SearchJob::Packets { first, count } => Ok(self.run_packets(first, count)),
            SearchJob::Node {
                total_nodes,
                node_index,
                length,
                mode,
            } => self.run_node(total_nodes, node_index, length, mode),
        };

        self.monitor.stop();
        report
    }

    /// Run a job on tokio's blocking pool
    pub async fn run_async(self: Arc<Self>, job: SearchJob) -> Result<SessionReport> {
        tokio::task::spawn_blocking(move || self.run(job))
            .await
            .map_err(|e| SearchError::Internal(format!("search task failed: {e}")))?
    }

    fn run_packets(&self, first: u64, count: Option<u64>) -> SessionReport {
        let started = Instant::now();
        let mut report = SessionReport {
            state: SearchState::Exhausted,
            result: None,
            packets: Vec::new(),
            space_exhausted: false,
            attempts: 0,
            elapsed: Duration::ZERO,
        };

        let mut number = first;
        loop {
            if count.is_some_and(|limit| report.packets.len() as u64 >= limit) {
                break;
            }

            let packet = self.scheduler.next_packet(number);
            let (Some(range), Some(length)) = (packet.range(), packet.length()) else {
                warn!(
                    packet_number = number,
                    max_length = self.scheduler.max_length(),
                    "All possible lengths tried; search space exhausted"
                );
                report.space_exhausted = true;
                self.monitor.set_state(SearchState::Exhausted);
                break;
            };

            info!("Searching {packet}");
            let outcome = self.engine.drive(range, length, &self.cancel, &self.monitor);
            let exhausted = outcome.is_exhausted();
            if outcome.state != SearchState::Cancelled {
                self.monitor.record_packet(number, exhausted);
            }

            report.packets.push(PacketSummary {
                packet,
                state: outcome.state,
                attempts: outcome.attempts,
            });
            report.state = outcome.state;
            report.attempts += outcome.attempts;
            report.result = outcome.result;

            if !exhausted {
                break;
            }
            match number.checked_add(1) {
                Some(next) => number = next,
                None => break,
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    fn run_node(
        &self,
        total_nodes: usize,
        node_index: usize,
        length: usize,
        mode: ScanMode,
    ) -> Result<SessionReport> {
        let range = partition(self.engine.keyspace(), total_nodes, node_index, length)?;
        info!(
            "Node {}/{} searching length {} over {} ({} positions, {:?})",
            node_index + 1,
            total_nodes,
            length,
            range,
            range.size(),
            mode
        );

        let outcome = match mode {
            ScanMode::Batched => self.engine.drive(range, length, &self.cancel, &self.monitor),
            ScanMode::Sequential => self.run_sequential(range, length),
        };
        Ok(SessionReport::from_outcome(outcome))
    }

    fn run_sequential(&self, range: SearchRange, length: usize) -> SearchOutcome {
        self.monitor
            .begin_range(range.start, range.size(), &format!("length {length}"));
        let outcome = self.engine.scan_sequential(range, length, &self.cancel);

        let reached = outcome
            .result
            .as_ref()
            .map_or(range.start, |r| r.position + 1);
        self.monitor.record_batch(reached, outcome.attempts);
        self.monitor.set_state(outcome.state);
        outcome
    }
}

/// Convenience: search packets from `first_packet` for the password behind `target`
pub fn crack_from_packet(target: TargetDigest, first_packet: u64) -> Result<SessionReport> {
    let config = SearchConfig {
        show_progress: false,
        ..SearchConfig::default()
    };
    let session = SearchSession::new(config, target)?;
    session.run(SearchJob::Packets {
        first: first_packet,
        count: None,
    })
}
