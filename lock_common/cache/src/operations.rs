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

use redis::Script;

use crate::client::RedisClient;
use crate::error::RedisError;

impl RedisClient {
    /// Sets `key` to `value` with a millisecond expiration, only if the key does not exist.
    ///
    /// Maps to `SET key value NX PX ttl_ms`. Sub-millisecond TTLs are rounded up to one
    /// millisecond because Redis rejects a zero expiration.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` if the key was set, `Ok(false)` if it already existed.
    ///
    /// # Errors
    ///
    /// * `RedisError::ConnectionError` - If the command fails on the server or the connection.
    /// * `RedisError::Timeout` - If the node does not answer within the client timeout.
    pub async fn set_nx_px(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, RedisError> {
        let ttl_ms = ttl_millis(ttl);
        let mut conn = self.connection().await?;
        let reply: Option<String> = self
            .bounded(
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("PX")
                    .arg(ttl_ms)
                    .query_async(&mut conn),
            )
            .await?;
        Ok(matches!(reply.as_deref(), Some("OK")))
    }

    /// Evaluates a Lua script against a single key, returning its integer reply.
    ///
    /// The script is sent by SHA first and loaded on a `NOSCRIPT` reply, so it is executed
    /// atomically on the server.
    pub async fn invoke_script(&self, script: &Script, key: &str, args: &[&str]) -> Result<i64, RedisError> {
        let mut invocation = script.prepare_invoke();
        invocation.key(key);
        for arg in args {
            invocation.arg(*arg);
        }
        let mut conn = self.connection().await?;
        let reply: i64 = self.bounded(invocation.invoke_async(&mut conn)).await?;
        Ok(reply)
    }
}

pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_rounds_up() {
        assert_eq!(ttl_millis(Duration::from_micros(1)), 1);
        assert_eq!(ttl_millis(Duration::from_micros(1500)), 2);
        assert_eq!(ttl_millis(Duration::from_secs(10)), 10_000);
    }

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
    }

    /// Requires a reachable server, e.g. `LOCK_TEST_REDIS_NODES=redis://127.0.0.1:6379`.
    #[tokio::test]
    #[ignore]
    async fn test_set_nx_px_against_live_server() {
        let url = std::env::var("LOCK_TEST_REDIS_NODES").unwrap();
        let url = url.split(',').next().unwrap();
        let client = RedisClient::open(url, Duration::from_secs(1)).unwrap();
        let key = "cache:test:set_nx_px";

        assert!(client.set_nx_px(key, "a", Duration::from_secs(5)).await.unwrap());
        assert!(!client.set_nx_px(key, "b", Duration::from_secs(5)).await.unwrap());

        let del_if = Script::new("if redis.call('get', KEYS[1]) == ARGV[1] then return redis.call('del', KEYS[1]) else return 0 end");
        assert_eq!(client.invoke_script(&del_if, key, &["b"]).await.unwrap(), 0);
        assert_eq!(client.invoke_script(&del_if, key, &["a"]).await.unwrap(), 1);
        assert!(client.set_nx_px(key, "b", Duration::from_secs(5)).await.unwrap());
        assert_eq!(client.invoke_script(&del_if, key, &["b"]).await.unwrap(), 1);
    }
}
