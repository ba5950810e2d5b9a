//! Distributed lock module, providing a quorum lock over several independent Redis nodes
//!
//! A lock is held once a majority of the configured nodes accepted the key and the
//! remaining validity, after subtracting acquisition latency and clock drift, is still
//! positive. Failed attempts release whatever they managed to set, and every node key
//! carries a TTL so a crashed holder never blocks the resource forever.

pub mod client;
pub mod config;
pub mod drift;
pub mod error;
pub mod guard;
pub mod lock;
pub mod node;
pub mod quorum;
pub mod retry;
pub mod scripts;

pub use client::LockClient;
pub use config::{LockConfig, LockOptions};
pub use drift::ClockDriftEstimator;
pub use error::{DistributedLockError, Result};
pub use guard::LockGuard;
pub use lock::{LockHandle, LockRequest};
pub use node::{NodeHandle, RedisNode};
pub use quorum::{quorum, NodeVote};
pub use retry::RetryScheduler;
