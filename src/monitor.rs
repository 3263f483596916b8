//! Progress monitoring and throughput tracking

use crate::search::SearchState;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Point-in-time view of a search, safe to hand to any presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Current search state
    pub state: SearchState,
    /// Absolute position reached in the current range
    pub position: i64,
    /// Candidates hashed since the monitor started
    pub attempts: u64,
    /// Most recent attempts-per-second sample
    pub attempts_per_second: u64,
    /// Packets searched to the end without a match
    pub packets_exhausted: u64,
    /// Time since the monitor started
    pub elapsed: Duration,
}

/// Progress tracking state shared with the background logger
#[derive(Debug)]
pub struct ProgressState {
    pub position: AtomicI64,
    pub attempts: AtomicU64,
    pub attempts_per_second: AtomicU64,
    pub packets_exhausted: AtomicU64,
    state: AtomicU8,
    pub start_time: Mutex<Instant>,
    pub is_running: AtomicBool,
}

impl ProgressState {
    fn new() -> Self {
        Self {
            position: AtomicI64::new(0),
            attempts: AtomicU64::new(0),
            attempts_per_second: AtomicU64::new(0),
            packets_exhausted: AtomicU64::new(0),
            state: AtomicU8::new(SearchState::Idle as u8),
            start_time: Mutex::new(Instant::now()),
            is_running: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SearchState {
        SearchState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn elapsed(&self) -> Duration {
        self.start_time
            .lock()
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state(),
            position: self.position.load(Ordering::SeqCst),
            attempts: self.attempts.load(Ordering::SeqCst),
            attempts_per_second: self.attempts_per_second.load(Ordering::SeqCst),
            packets_exhausted: self.packets_exhausted.load(Ordering::SeqCst),
            elapsed: self.elapsed(),
        }
    }
}

/// Last rate sample: when it was taken and the attempt count at that time
#[derive(Debug)]
struct RateSample {
    taken_at: Instant,
    attempts: u64,
}

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Whether to show a progress bar
    pub show_progress_bar: bool,
    /// Minimum time between attempts-per-second samples
    pub sample_interval_ms: u64,
    /// Log interval for the background logger
    pub log_interval_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            show_progress_bar: true,
            sample_interval_ms: 1000,
            log_interval_seconds: 10,
        }
    }
}

impl MonitorConfig {
    /// Monitor settings derived from a search configuration
    pub fn from_search_config(config: &crate::config::SearchConfig) -> Self {
        Self {
            show_progress_bar: config.show_progress,
            sample_interval_ms: config.rate_sample_ms,
            ..Self::default()
        }
    }
}

/// Monitor for tracking search progress.
///
/// The search driver writes to it once per batch and once per packet;
/// readers call [`snapshot`](Self::snapshot) from any thread.
#[derive(Debug)]
pub struct SearchMonitor {
    state: Arc<ProgressState>,
    progress_bar: Option<ProgressBar>,
    sample: Mutex<RateSample>,
    sample_interval: Duration,
    log_interval: Duration,
    /// Start of the range currently shown on the progress bar
    range_start: AtomicI64,
    /// Label of that range, kept in front of the rate
    range_label: Mutex<String>,
}

impl SearchMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let progress_bar = config.show_progress_bar.then(|| {
            let pb = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        });

        Self {
            state: Arc::new(ProgressState::new()),
            progress_bar,
            sample: Mutex::new(RateSample {
                taken_at: Instant::now(),
                attempts: 0,
            }),
            sample_interval: Duration::from_millis(config.sample_interval_ms),
            log_interval: Duration::from_secs(config.log_interval_seconds.max(1)),
            range_start: AtomicI64::new(0),
            range_label: Mutex::new(String::new()),
        }
    }

    /// Monitor without a progress bar, sampling every second
    pub fn quiet() -> Self {
        Self::new(MonitorConfig {
            show_progress_bar: false,
            ..MonitorConfig::default()
        })
    }

    /// Start monitoring
    pub fn start(&self) {
        self.state.is_running.store(true, Ordering::SeqCst);
        let now = Instant::now();
        if let Ok(mut start_time) = self.state.start_time.lock() {
            *start_time = now;
        }
        if let Ok(mut sample) = self.sample.lock() {
            *sample = RateSample {
                taken_at: now,
                attempts: self.state.attempts.load(Ordering::SeqCst),
            };
        }
        info!("Search monitoring started");
    }

    /// Stop monitoring
    pub fn stop(&self) {
        self.state.is_running.store(false, Ordering::SeqCst);
        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }
        info!("Search monitoring stopped");
    }

    /// A new range is about to be scanned
    pub fn begin_range(&self, start: i64, size: i64, label: &str) {
        self.range_start.store(start, Ordering::SeqCst);
        self.state.position.store(start, Ordering::SeqCst);
        self.set_state(SearchState::Running);
        if let Ok(mut current) = self.range_label.lock() {
            *current = label.to_string();
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_length(size.max(0) as u64);
            pb.set_position(0);
            pb.set_message(label.to_string());
        }
        debug!(start, size, label, "range started");
    }

    /// One batch finished; `position` is the next position to scan
    pub fn record_batch(&self, position: i64, attempts: u64) {
        self.state.position.store(position, Ordering::SeqCst);
        let total = self.state.attempts.fetch_add(attempts, Ordering::SeqCst) + attempts;
        self.resample(total);

        if let Some(pb) = &self.progress_bar {
            let offset = position - self.range_start.load(Ordering::SeqCst);
            pb.set_position(offset.max(0) as u64);
        }
    }

    /// Resample attempts-per-second once the sample interval has passed
    fn resample(&self, total_attempts: u64) {
        let Ok(mut sample) = self.sample.lock() else {
            return;
        };
        let elapsed = sample.taken_at.elapsed();
        if elapsed < self.sample_interval || elapsed.is_zero() {
            return;
        }

        let done = total_attempts.saturating_sub(sample.attempts);
        let rate = (done as f64 / elapsed.as_secs_f64()) as u64;
        self.state.attempts_per_second.store(rate, Ordering::SeqCst);
        *sample = RateSample {
            taken_at: Instant::now(),
            attempts: total_attempts,
        };

        if let Some(pb) = &self.progress_bar {
            pb.set_message(self.progress_message(rate));
        }
    }

    fn progress_message(&self, rate: u64) -> String {
        let rate = utils::format_rate(rate as f64);
        match self.range_label.lock() {
            Ok(label) if !label.is_empty() => format!("{label}, {rate}"),
            _ => rate,
        }
    }

    /// A packet finished; exhausted packets bump the running counter
    pub fn record_packet(&self, packet_number: u64, exhausted: bool) -> u64 {
        let count = if exhausted {
            self.state.packets_exhausted.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.packets_exhausted()
        };
        info!(packet_number, exhausted, packets_exhausted = count, "packet finished");
        count
    }

    pub fn set_state(&self, state: SearchState) {
        self.state.state.store(state as u8, Ordering::SeqCst);
        if state == SearchState::Found {
            if let Some(pb) = &self.progress_bar {
                pb.println("Match found!");
            }
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.state()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.snapshot()
    }

    pub fn attempts(&self) -> u64 {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub fn attempts_per_second(&self) -> u64 {
        self.state.attempts_per_second.load(Ordering::SeqCst)
    }

    pub fn packets_exhausted(&self) -> u64 {
        self.state.packets_exhausted.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running.load(Ordering::SeqCst)
    }

    /// Log a progress line every log interval until [`stop`](Self::stop)
    pub fn start_background_logging(&self) -> thread::JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let log_interval = self.log_interval;

        thread::spawn(move || {
            let mut last_log = Instant::now();
            while state.is_running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(100));

                if last_log.elapsed() >= log_interval {
                    let snapshot = state.snapshot();
                    info!(
                        "Progress: position {}, {} attempts, {}, {} packets exhausted, elapsed {}",
                        snapshot.position,
                        utils::format_number(snapshot.attempts),
                        utils::format_rate(snapshot.attempts_per_second as f64),
                        snapshot.packets_exhausted,
                        utils::format_duration(snapshot.elapsed),
                    );
                    last_log = Instant::now();
                }
            }
        })
    }
}

/// Utility functions for progress output
pub mod utils {
    use std::time::Duration;

    /// Format duration in human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Format large numbers with commas
    pub fn format_number(num: u64) -> String {
        let digits = num.to_string();
        let mut result = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result
    }

    /// Format an attempts-per-second rate with units
    pub fn format_rate(rate: f64) -> String {
        if rate >= 1_000_000.0 {
            format!("{:.1}M H/s", rate / 1_000_000.0)
        } else if rate >= 1_000.0 {
            format!("{:.1}K H/s", rate / 1_000.0)
        } else {
            format!("{:.0} H/s", rate)
        }
    }
}
