/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::time::Instant;

use super::config::{LockConfig, LockOptions};
use super::drift::ClockDriftEstimator;
use super::error::{DistributedLockError, Result};
use super::guard::LockGuard;
use super::lock::{LockHandle, LockRequest};
use super::node::{NodeHandle, RedisNode};
use super::quorum::{quorum, release_on_all, QuorumAcquirer};
use super::retry::RetryScheduler;

/// Quorum lock over a fixed set of independent nodes
///
/// Holds nothing but the read-only node list and its settings, so it can be cloned
/// and shared between tasks freely. Two `acquire` calls racing from the same process
/// behave exactly as two calls from different processes.
#[derive(Clone)]
pub struct LockClient {
    nodes: Arc<[Arc<dyn NodeHandle>]>,
    retry: RetryScheduler,
    drift: ClockDriftEstimator,
    node_timeout: Duration,
}

impl LockClient {
    /// Create a lock client over the given nodes
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If `nodes` is empty or `options` is invalid.
    pub fn new(nodes: Vec<Arc<dyn NodeHandle>>, options: LockOptions) -> Result<Self> {
        if nodes.is_empty() {
            return Err(DistributedLockError::InvalidArgument("at least one node is required".to_string()));
        }
        options.validate()?;

        Ok(Self {
            nodes: nodes.into(),
            retry: options.retry(),
            drift: options.drift,
            node_timeout: options.node_timeout,
        })
    }

    /// Create a lock client with one Redis node per configured URL
    ///
    /// No connection is made until the first lock operation.
    pub fn from_config(config: &LockConfig) -> Result<Self> {
        config.validate()?;
        let options = config.options()?;
        let nodes = config
            .nodes
            .iter()
            .map(|url| RedisNode::open(url, options.node_timeout).map(|node| Arc::new(node) as Arc<dyn NodeHandle>))
            .collect::<Result<Vec<_>>>()?;
        Self::new(nodes, options)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn quorum(&self) -> usize {
        quorum(self.nodes.len())
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.endpoint().to_string()).collect()
    }

    /// Acquire the lock
    ///
    /// # Arguments
    ///
    /// * `resource_key` - Lock key name
    /// * `ttl` - Lock expiration time on every node
    /// * `value` - Ownership token, generated when `None`
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(handle))` when a quorum was reached in time, `Ok(None)` when the lock
    /// could not be taken within the configured attempts.
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If the key is blank or the TTL is zero.
    ///   Nothing is sent to the nodes in that case.
    pub async fn acquire(&self, resource_key: &str, ttl: Duration, value: Option<&str>) -> Result<Option<LockHandle>> {
        self.acquire_until(resource_key, ttl, value, None).await
    }

    /// Same as `acquire`, but gives up once `deadline` has passed.
    ///
    /// An attempt in flight at the deadline still completes, including the release of
    /// partial locks, so the call may return slightly after `deadline`.
    pub async fn acquire_with_deadline(
        &self,
        resource_key: &str,
        ttl: Duration,
        value: Option<&str>,
        deadline: Instant,
    ) -> Result<Option<LockHandle>> {
        self.acquire_until(resource_key, ttl, value, Some(deadline)).await
    }

    /// Acquire the lock wrapped in a guard that releases it when dropped
    pub async fn acquire_guard(
        &self,
        resource_key: &str,
        ttl: Duration,
        value: Option<&str>,
    ) -> Result<Option<LockGuard>> {
        let handle = self.acquire(resource_key, ttl, value).await?;
        Ok(handle.map(|handle| LockGuard::new(self.clone(), handle)))
    }

    async fn acquire_until(
        &self,
        resource_key: &str,
        ttl: Duration,
        value: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<Option<LockHandle>> {
        let request = LockRequest::new(resource_key, ttl, value)?;
        let acquirer = self.acquirer();
        let acquirer = &acquirer;
        let request_ref = &request;

        let handle = self
            .retry
            .run(deadline, |_| async move { acquirer.try_acquire(request_ref).await.handle })
            .await;

        match &handle {
            Some(handle) => info!(
                "Acquired lock {} on a quorum of {} nodes, valid for {:?}",
                handle.resource_key(),
                self.quorum(),
                handle.validity()
            ),
            None => info!(
                "Failed to acquire lock {} within {} attempts",
                request.resource_key(),
                self.retry.max_attempts()
            ),
        }
        Ok(handle)
    }

    /// Extend a held lock to a new TTL
    ///
    /// # Returns
    ///
    /// Returns a new handle carrying the new validity, or `Ok(None)` when fewer than a
    /// quorum of nodes still held the lock. A failed extension leaves the nodes untouched.
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If the TTL is zero.
    pub async fn extend(&self, handle: &LockHandle, ttl: Duration) -> Result<Option<LockHandle>> {
        self.extend_value(handle.resource_key(), handle.value(), ttl).await
    }

    /// Extend the lock identified by its key and ownership token
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If the key or value is blank or the TTL is zero.
    pub async fn extend_value(&self, resource_key: &str, value: &str, ttl: Duration) -> Result<Option<LockHandle>> {
        if value.trim().is_empty() {
            return Err(DistributedLockError::InvalidArgument("lock value must not be empty".to_string()));
        }
        let request = LockRequest::new(resource_key, ttl, Some(value))?;
        let extended = self
            .acquirer()
            .try_extend(request.resource_key(), request.value(), request.ttl())
            .await
            .handle;
        match &extended {
            Some(extended) => info!("Extended lock {}, valid for {:?}", extended.resource_key(), extended.validity()),
            None => warn!("Failed to extend lock {}", resource_key),
        }
        Ok(extended)
    }

    /// Release the lock
    ///
    /// Best-effort: nodes that cannot be reached keep the key until its TTL runs out.
    /// Releasing twice, or after the lock changed owner, deletes nothing.
    pub async fn release(&self, handle: &LockHandle) {
        self.release_value(handle.resource_key(), handle.value()).await
    }

    /// Release the lock identified by its key and ownership token
    pub async fn release_value(&self, resource_key: &str, value: &str) {
        if resource_key.trim().is_empty() || value.trim().is_empty() {
            return;
        }
        let confirmed = release_on_all(&self.nodes, resource_key, value, self.node_timeout).await;
        info!("Released lock {} on {}/{} nodes", resource_key, confirmed, self.nodes.len());
    }

    fn acquirer(&self) -> QuorumAcquirer<'_> {
        QuorumAcquirer::new(&self.nodes, &self.drift, self.node_timeout)
    }
}

impl fmt::Display for LockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LockClient (quorum {} of {})", self.quorum(), self.nodes.len())?;
        writeln!(f, "Registered nodes:")?;
        for node in self.nodes.iter() {
            writeln!(f, "{}", node.endpoint())?;
        }
        Ok(())
    }
}

impl fmt::Debug for LockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockClient")
            .field("nodes", &self.endpoints())
            .field("retry", &self.retry)
            .field("drift", &self.drift)
            .field("node_timeout", &self.node_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_lists_endpoints() {
        let config = LockConfig::with_nodes(["redis://10.0.0.1:6379", "redis://10.0.0.2:6379", "redis://10.0.0.3:6379"]);
        let client = LockClient::from_config(&config).unwrap();
        assert_eq!(client.node_count(), 3);
        assert_eq!(client.quorum(), 2);
        assert_eq!(client.endpoints(), vec!["10.0.0.1:6379", "10.0.0.2:6379", "10.0.0.3:6379"]);

        let shown = client.to_string();
        assert!(shown.contains("Registered nodes:"));
        assert!(shown.contains("10.0.0.2:6379"));
    }

    #[test]
    fn test_new_rejects_empty_node_list() {
        let result = LockClient::new(Vec::new(), LockOptions::default());
        assert!(matches!(result, Err(DistributedLockError::InvalidArgument(_))));
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = LockConfig::with_nodes(["redis://10.0.0.1:6379", "10.0.0.2"]);
        assert!(matches!(LockClient::from_config(&config), Err(DistributedLockError::ConfigError(_))));
    }
}
