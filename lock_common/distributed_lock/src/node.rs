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

use std::time::Duration;

use async_trait::async_trait;
use cache::{RedisClient, RedisError};
use lazy_static::lazy_static;
use redis::Script;

use super::error::{DistributedLockError, Result};
use super::scripts::{EXTEND_LOCK, RELEASE_LOCK};

lazy_static! {
    static ref RELEASE_SCRIPT: Script = Script::new(RELEASE_LOCK);
    static ref EXTEND_SCRIPT: Script = Script::new(EXTEND_LOCK);
}

/// One independent cache server taking part in the quorum.
///
/// Each operation must be atomic on the node itself. Failures are reported as
/// `DistributedLockError::NodeUnavailable`; callers in this crate turn them into a
/// negative vote rather than aborting.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Address used in logs and diagnostics
    fn endpoint(&self) -> &str;

    /// Sets `key = value` with expiration `ttl` only if `key` does not exist.
    async fn try_set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Deletes `key` only if it currently holds `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool>;

    /// Resets the expiration of `key` to `ttl` only if it currently holds `expected`.
    async fn compare_and_extend(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool>;
}

/// Redis side encapsulation of a node
#[derive(Debug, Clone)]
pub struct RedisNode {
    client: RedisClient,
}

impl RedisNode {
    /// Create a node for a Redis URL, every command bounded by `timeout`
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::ConfigError` - If the URL or timeout is invalid.
    pub fn open(url: &str, timeout: Duration) -> Result<Self> {
        let client = RedisClient::open(url, timeout).map_err(|e| DistributedLockError::ConfigError(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: RedisClient) -> Self {
        Self { client }
    }

    fn unavailable(&self, err: RedisError) -> DistributedLockError {
        DistributedLockError::NodeUnavailable {
            endpoint: self.client.endpoint().to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl NodeHandle for RedisNode {
    fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    async fn try_set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.client
            .set_nx_px(key, value, ttl)
            .await
            .map_err(|e| self.unavailable(e))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        let deleted = self
            .client
            .invoke_script(&RELEASE_SCRIPT, key, &[expected])
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(deleted == 1)
    }

    async fn compare_and_extend(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool> {
        let ttl_ms = ttl.as_millis().max(1).to_string();
        let extended = self
            .client
            .invoke_script(&EXTEND_SCRIPT, key, &[expected, ttl_ms.as_str()])
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(extended == 1)
    }
}
