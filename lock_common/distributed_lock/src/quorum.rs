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

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use tokio::time::Instant;

use super::drift::ClockDriftEstimator;
use super::error::Result;
use super::lock::{LockHandle, LockRequest};
use super::node::NodeHandle;

/// Votes needed out of `node_count` nodes: a strict majority
pub fn quorum(node_count: usize) -> usize {
    node_count / 2 + 1
}

/// Answer of one node during one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVote {
    pub node_index: usize,
    pub acquired: bool,
}

/// Result of a single fan-out over all nodes
#[derive(Debug)]
pub(crate) struct AttemptOutcome {
    pub(crate) votes: Vec<NodeVote>,
    pub(crate) handle: Option<LockHandle>,
}

impl AttemptOutcome {
    pub(crate) fn granted(&self) -> usize {
        self.votes.iter().filter(|vote| vote.acquired).count()
    }
}

/// Drives one acquisition or extension attempt against every node
pub(crate) struct QuorumAcquirer<'a> {
    nodes: &'a [Arc<dyn NodeHandle>],
    drift: &'a ClockDriftEstimator,
    node_timeout: Duration,
}

impl<'a> QuorumAcquirer<'a> {
    pub(crate) fn new(nodes: &'a [Arc<dyn NodeHandle>], drift: &'a ClockDriftEstimator, node_timeout: Duration) -> Self {
        Self { nodes, drift, node_timeout }
    }

    pub(crate) fn quorum(&self) -> usize {
        quorum(self.nodes.len())
    }

    /// Bound of one node call during an attempt.
    ///
    /// At most half of what the drift leaves of `ttl`, so a node that never answers still
    /// leaves a positive validity to the nodes that did.
    pub(crate) fn call_timeout(&self, ttl: Duration) -> Duration {
        self.node_timeout.min(ttl.saturating_sub(self.drift.drift(ttl)) / 2)
    }

    /// Tries to set the key on every node and keeps it only with a valid quorum.
    ///
    /// On failure every node is asked to delete the key if it still holds our value, so a
    /// lost attempt does not block others until the TTL runs out.
    pub(crate) async fn try_acquire(&self, request: &LockRequest) -> AttemptOutcome {
        let key = request.resource_key();
        let value = request.value();
        let ttl = request.ttl();
        let timeout = self.call_timeout(ttl);

        let start = Instant::now();
        let votes = join_all(self.nodes.iter().enumerate().map(|(node_index, node)| async move {
            let acquired = settle(
                node.as_ref(),
                "lock",
                timeout,
                node.try_set_if_absent(key, value, ttl),
            )
            .await;
            NodeVote { node_index, acquired }
        }))
        .await;
        let elapsed = start.elapsed();

        let mut outcome = AttemptOutcome { votes, handle: None };
        let granted = outcome.granted();
        let validity = self.drift.validity(ttl, elapsed);
        debug!(
            "Lock {} got {}/{} votes (quorum {}) in {:?}, validity {:?}",
            key,
            granted,
            self.nodes.len(),
            self.quorum(),
            elapsed,
            validity
        );

        match validity {
            Some(validity) if granted >= self.quorum() => {
                outcome.handle = Some(LockHandle::new(key, value, validity));
            }
            _ => {
                release_on_all(self.nodes, key, value, timeout).await;
            }
        }
        outcome
    }

    /// Resets the TTL of a held lock on every node still holding its value.
    ///
    /// A failed extension releases nothing: the lock may still be valid under its
    /// previous TTL and the caller decides what to do with it.
    pub(crate) async fn try_extend(&self, key: &str, value: &str, ttl: Duration) -> AttemptOutcome {
        let timeout = self.call_timeout(ttl);

        let start = Instant::now();
        let votes = join_all(self.nodes.iter().enumerate().map(|(node_index, node)| async move {
            let acquired = settle(
                node.as_ref(),
                "extend",
                timeout,
                node.compare_and_extend(key, value, ttl),
            )
            .await;
            NodeVote { node_index, acquired }
        }))
        .await;
        let elapsed = start.elapsed();

        let mut outcome = AttemptOutcome { votes, handle: None };
        let granted = outcome.granted();
        debug!("Extend of lock {} got {}/{} votes in {:?}", key, granted, self.nodes.len(), elapsed);

        if granted >= self.quorum() {
            outcome.handle = self
                .drift
                .validity(ttl, elapsed)
                .map(|validity| LockHandle::new(key, value, validity));
        }
        outcome
    }
}

/// Best-effort compare-and-delete on every node, returning how many confirmed
pub(crate) async fn release_on_all(
    nodes: &[Arc<dyn NodeHandle>],
    key: &str,
    value: &str,
    timeout: Duration,
) -> usize {
    let confirmed = join_all(nodes.iter().map(|node| {
        settle(node.as_ref(), "unlock", timeout, node.compare_and_delete(key, value))
    }))
    .await;
    confirmed.into_iter().filter(|deleted| *deleted).count()
}

/// Waits for a node call, turning errors and timeouts into `false`
async fn settle<F>(node: &dyn NodeHandle, operation: &str, timeout: Duration, call: F) -> bool
where
    F: Future<Output = Result<bool>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(confirmed)) => confirmed,
        Ok(Err(e)) => {
            warn!("{} on node {} failed: {}", operation, node.endpoint(), e);
            false
        }
        Err(_) => {
            warn!("{} on node {} timed out after {:?}", operation, node.endpoint(), timeout);
            false
        }
    }
}
