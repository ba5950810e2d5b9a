#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use distributed_lock::{DistributedLockError, LockClient, LockOptions, NodeHandle, Result};
use parking_lot::Mutex;
use tokio::time::Instant;

/// In-memory node with per-key expiry, configurable latency and failure modes
#[derive(Debug)]
pub struct FakeNode {
    name: String,
    entries: Mutex<HashMap<String, (String, Instant)>>,
    latency: Mutex<Duration>,
    down: AtomicBool,
    hanging: AtomicBool,
    pub set_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeNode {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            entries: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            down: AtomicBool::new(false),
            hanging: AtomicBool::new(false),
            set_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Current live value of `key`
    pub fn stored(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone())
    }

    pub fn expires_in(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(_, expires_at)| *expires_at - now)
    }

    /// Puts a key as if another client held it
    pub fn force_put(&self, key: &str, value: &str, ttl: Duration) {
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }

    pub fn set_count(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) -> Result<()> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(DistributedLockError::NodeUnavailable {
                endpoint: self.name.clone(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NodeHandle for FakeNode {
    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn try_set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at > now => Ok(false),
            _ => {
                entries.insert(key.to_string(), (value.to_string(), now + ttl));
                Ok(true)
            }
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now && value == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_extend(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool> {
        self.round_trip().await?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some((value, expires_at)) if *expires_at > now && value == expected => {
                *expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn fake_nodes(count: usize) -> Vec<Arc<FakeNode>> {
    (1..=count).map(|i| FakeNode::new(&format!("node-{}", i))).collect()
}

pub fn client_over(nodes: &[Arc<FakeNode>], options: LockOptions) -> LockClient {
    let handles = nodes
        .iter()
        .map(|node| node.clone() as Arc<dyn NodeHandle>)
        .collect();
    LockClient::new(handles, options).unwrap()
}

pub fn default_client(nodes: &[Arc<FakeNode>]) -> LockClient {
    client_over(nodes, LockOptions::default())
}
