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
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionAddr};
use tokio::sync::OnceCell;

use crate::error::RedisError;

/// Client for one Redis endpoint.
///
/// Unlike a process-wide instance, every `RedisClient` is constructed explicitly with the
/// endpoint it talks to, so several independent nodes can live side by side. The underlying
/// connection is established lazily on first use and shared by all clones of the client.
/// Every command, including connection setup, is bounded by the configured timeout.
#[derive(Clone)]
pub struct RedisClient {
    pub(crate) client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    endpoint: String,
    timeout: Duration,
}

impl RedisClient {
    /// Creates a client for the given connection URL, e.g. `redis://:password@10.0.0.1:6379/0`.
    ///
    /// No network I/O happens here; the URL is only parsed.
    ///
    /// # Errors
    ///
    /// * `RedisError::InvalidEndpoint` - If the URL cannot be parsed.
    /// * `RedisError::OperationError` - If `timeout` is zero.
    pub fn open(url: &str, timeout: Duration) -> Result<Self, RedisError> {
        if timeout.is_zero() {
            return Err(RedisError::OperationError("command timeout must be greater than zero".to_string()));
        }
        let client = Client::open(url).map_err(|e| RedisError::InvalidEndpoint(format!("{}: {}", url, e)))?;
        let endpoint = describe_addr(&client.get_connection_info().addr);

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            endpoint,
            timeout,
        })
    }

    /// Address of the server, without credentials.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the shared connection, connecting first if needed.
    pub(crate) async fn connection(&self) -> Result<ConnectionManager, RedisError> {
        let init = self.connection.get_or_try_init(|| async {
            debug!("Connecting to redis node {}", self.endpoint);
            ConnectionManager::new(self.client.clone())
                .await
                .map_err(RedisError::ConnectionError)
        });
        let manager = tokio::time::timeout(self.timeout, init)
            .await
            .map_err(|_| RedisError::Timeout(self.timeout))??;
        Ok(manager.clone())
    }

    /// Runs a single command future under the client timeout.
    pub(crate) async fn bounded<T, F>(&self, fut: F) -> Result<T, RedisError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| RedisError::Timeout(self.timeout))?
            .map_err(RedisError::ConnectionError)
    }
}

impl fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn describe_addr(addr: &ConnectionAddr) -> String {
    match addr {
        ConnectionAddr::Tcp(host, port) => format!("{}:{}", host, port),
        ConnectionAddr::TcpTls { host, port, .. } => format!("{}:{} (tls)", host, port),
        ConnectionAddr::Unix(path) => format!("unix:{}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_reports_endpoint_without_password() {
        let client = RedisClient::open("redis://:secret@10.0.0.1:6380/2", Duration::from_millis(50)).unwrap();
        assert_eq!(client.endpoint(), "10.0.0.1:6380");
        assert!(!format!("{:?}", client).contains("secret"));
    }

    #[test]
    fn test_open_rejects_bad_url() {
        let result = RedisClient::open("not-a-redis-url", Duration::from_millis(50));
        assert!(matches!(result, Err(RedisError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_open_rejects_zero_timeout() {
        let result = RedisClient::open("redis://127.0.0.1:6379", Duration::ZERO);
        assert!(matches!(result, Err(RedisError::OperationError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_bounded_by_timeout() {
        // TEST-NET-1 address, never routed
        let client = RedisClient::open("redis://192.0.2.1:6379", Duration::from_millis(100)).unwrap();
        let start = std::time::Instant::now();
        let result = client.connection().await;
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
