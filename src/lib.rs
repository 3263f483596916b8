//! Keyspace Search
//!
//! Deterministic brute-force search for the password behind an MD5 digest.
//! Candidates are enumerated by ordinal position over a fixed alphabet, the
//! keyspace is cut into bounded job packets (or node ranges), and each range
//! is scanned in concurrent batches with index-deterministic first-match
//! selection.

pub mod alphabet;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod monitor;
pub mod packet;
pub mod partition;
pub mod search;
pub mod session;

pub use alphabet::Alphabet;
pub use codec::{CrackResult, Keyspace};
pub use config::SearchConfig;
pub use crypto::{md5_hex, TargetDigest};
pub use error::*;
pub use monitor::{MonitorConfig, ProgressSnapshot, SearchMonitor};
pub use packet::{parse_packet_number, JobPacket, PacketScheduler};
pub use partition::{partition, SearchRange};
pub use search::{CancelToken, SearchEngine, SearchOutcome, SearchState};
pub use session::{ScanMode, SearchJob, SearchSession, SessionReport};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::alphabet::Alphabet;
    pub use crate::codec::{CrackResult, Keyspace};
    pub use crate::config::SearchConfig;
    pub use crate::crypto::TargetDigest;
    pub use crate::error::*;
    pub use crate::packet::{JobPacket, PacketScheduler};
    pub use crate::partition::{partition, SearchRange};
    pub use crate::search::{CancelToken, SearchEngine, SearchOutcome, SearchState};
    pub use crate::session::{ScanMode, SearchJob, SearchSession, SessionReport};
}

#[cfg(test)]
mod tests;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Positions each worker probes per batch window
pub const DEFAULT_WINDOW_PER_WORKER: usize = 100;
