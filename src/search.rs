//! Search engine: sequential and batched-parallel scans over a range
//!
//! Both modes move through `Idle -> Running -> {Found, Exhausted, Cancelled}`.
//!
//! Cancellation granularity differs by mode. The sequential loop checks the
//! token between every two attempts. The batched driver checks it once per
//! window, so a cancel takes effect after the in-flight batch of up to
//! `workers * window_per_worker` attempts.

use crate::codec::{CrackResult, Keyspace};
use crate::config::SearchConfig;
use crate::crypto::{md5_raw, TargetDigest};
use crate::error::{ConfigError, Result};
use crate::monitor::SearchMonitor;
use crate::partition::SearchRange;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Lifecycle of one search run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SearchState {
    Idle = 0,
    Running = 1,
    Found = 2,
    Exhausted = 3,
    Cancelled = 4,
}

impl SearchState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => SearchState::Running,
            2 => SearchState::Found,
            3 => SearchState::Exhausted,
            4 => SearchState::Cancelled,
            _ => SearchState::Idle,
        }
    }
}

/// Cooperative cancellation flag shared between a search and its controller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancel so the token can drive another run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// `Found`, `Exhausted` or `Cancelled`
    pub state: SearchState,
    /// The match, the end-of-range sentinel, or the last result seen before a cancel
    pub result: Option<CrackResult>,
    /// Candidates hashed during this run
    pub attempts: u64,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn found(&self) -> Option<&CrackResult> {
        self.result.as_ref().filter(|r| r.found)
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == SearchState::Exhausted
    }
}

/// Drives scans for one target digest over one alphabet
#[derive(Debug)]
pub struct SearchEngine {
    keyspace: Keyspace,
    target: TargetDigest,
    pool: ThreadPool,
    workers: usize,
    window_per_worker: usize,
}

impl SearchEngine {
    /// Build an engine with its own pool of `workers` threads
    pub fn new(
        keyspace: Keyspace,
        target: TargetDigest,
        workers: usize,
        window_per_worker: usize,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(workers).into());
        }
        if window_per_worker == 0 {
            return Err(ConfigError::InvalidWindowSize(window_per_worker).into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("keyspace-worker-{i}"))
            .build()?;

        Ok(Self {
            keyspace,
            target,
            pool,
            workers,
            window_per_worker,
        })
    }

    pub fn from_config(config: &SearchConfig, target: TargetDigest) -> Result<Self> {
        config.validate()?;
        let keyspace = Keyspace::new(config.build_alphabet()?);
        Self::new(keyspace, target, config.workers, config.window_per_worker)
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub fn target(&self) -> &TargetDigest {
        &self.target
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Positions per batch window across all workers
    pub fn batch_window(&self) -> i64 {
        (self.workers as i64).saturating_mul(self.window_per_worker as i64)
    }

    /// Sequential attempt loop over the inclusive `range`.
    ///
    /// Stops at the first match. Cancellation is checked before every attempt.
    pub fn scan_sequential(
        &self,
        range: SearchRange,
        length: usize,
        cancel: &CancelToken,
    ) -> SearchOutcome {
        let started = Instant::now();
        let mut last: Option<CrackResult> = None;
        let mut attempts = 0u64;

        if !range.is_empty() {
            for position in range.start..=range.end {
                if cancel.is_cancelled() {
                    debug!(position, "sequential scan cancelled");
                    return SearchOutcome {
                        state: SearchState::Cancelled,
                        result: last,
                        attempts,
                        elapsed: started.elapsed(),
                    };
                }

                let result = self.keyspace.attempt(&self.target, position, length);
                attempts += 1;
                if result.found {
                    return SearchOutcome {
                        state: SearchState::Found,
                        result: Some(result),
                        attempts,
                        elapsed: started.elapsed(),
                    };
                }
                last = Some(result);
            }
        }

        let sentinel = last.map(|r| CrackResult::exhausted(r.password, r.position));
        SearchOutcome {
            state: SearchState::Exhausted,
            result: sentinel,
            attempts,
            elapsed: started.elapsed(),
        }
    }

    /// One concurrent batch over the half-open `[start, end)`.
    ///
    /// The range is cut into `workers` chunks of `ceil((end - start) / workers)`
    /// positions and every chunk is scanned to completion. The match from the
    /// lowest-indexed chunk wins, independent of completion order. Without a
    /// match the result is a sentinel anchored at `end - 1`.
    pub fn scan_batch(&self, start: i64, end: i64, length: usize) -> CrackResult {
        self.scan_batch_with(start, end, length, self.workers)
    }

    /// [`scan_batch`](Self::scan_batch) with an explicit chunk count
    pub fn scan_batch_with(&self, start: i64, end: i64, length: usize, chunks: usize) -> CrackResult {
        let chunks = chunks.max(1) as i64;
        let span = (end - start).max(0);
        let chunk_size = (span + chunks - 1) / chunks;

        let matches: Vec<Option<CrackResult>> = self.pool.install(|| {
            (0..chunks)
                .into_par_iter()
                .map(|i| {
                    let chunk_start = start.saturating_add(i.saturating_mul(chunk_size)).min(end);
                    let chunk_end = chunk_start.saturating_add(chunk_size).min(end);
                    self.probe(chunk_start, chunk_end, length)
                })
                .collect()
        });

        matches.into_iter().flatten().next().unwrap_or_else(|| {
            let anchor = end - 1;
            CrackResult::exhausted(self.keyspace.encode(anchor, length), anchor)
        })
    }

    /// Linear probe of `[start, end)` on the calling thread
    fn probe(&self, start: i64, end: i64, length: usize) -> Option<CrackResult> {
        let mut buf = vec![0u8; length];
        for position in start..end {
            self.keyspace.encode_into(position, &mut buf);
            let raw = md5_raw(&buf);
            if self.target.matches(&raw) {
                return Some(CrackResult {
                    password: String::from_utf8_lossy(&buf).into_owned(),
                    digest: hex::encode(raw),
                    position,
                    found: true,
                });
            }
        }
        None
    }

    /// Batched driver over the inclusive `range`.
    ///
    /// Scans successive windows with [`scan_batch`](Self::scan_batch),
    /// reporting each finished batch to `monitor` and checking `cancel`
    /// before starting the next window.
    pub fn drive(
        &self,
        range: SearchRange,
        length: usize,
        cancel: &CancelToken,
        monitor: &SearchMonitor,
    ) -> SearchOutcome {
        let started = Instant::now();
        let window = self.batch_window();
        let end_exclusive = range.end.saturating_add(1);
        let mut position = range.start;
        let mut attempts = 0u64;
        let mut last: Option<CrackResult> = None;

        monitor.begin_range(range.start, range.size(), &format!("length {length}"));
        debug!(%range, length, window, "batched scan started");

        let state = loop {
            if position >= end_exclusive {
                break SearchState::Exhausted;
            }
            if cancel.is_cancelled() {
                info!(position, "search cancelled");
                break SearchState::Cancelled;
            }

            let batch_end = position.saturating_add(window).min(end_exclusive);
            let result = self.scan_batch(position, batch_end, length);
            let scanned = (batch_end - position) as u64;
            attempts += scanned;
            monitor.record_batch(batch_end, scanned);

            let found = result.found;
            last = Some(result);
            if found {
                break SearchState::Found;
            }
            position = batch_end;
        };

        monitor.set_state(state);
        SearchOutcome {
            state,
            result: last,
            attempts,
            elapsed: started.elapsed(),
        }
    }
}
