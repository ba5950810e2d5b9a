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

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::drift::ClockDriftEstimator;
use super::error::{DistributedLockError, Result};
use super::retry::RetryScheduler;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 200;
const DEFAULT_NODE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_DRIFT_FACTOR: f64 = 0.01;
const DEFAULT_DRIFT_CONSTANT_MS: u64 = 2;

/// Lock client configuration, as read from YAML
///
/// ```yaml
/// nodes:
///   - redis://10.0.0.1:6379
///   - redis://10.0.0.2:6379
///   - redis://10.0.0.3:6379
/// max_attempts: 3
/// max_retry_delay_ms: 200
/// node_timeout_ms: 5000
/// drift_factor: 0.01
/// drift_constant_ms: 2
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LockConfig {
    pub nodes: Vec<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_node_timeout_ms")]
    pub node_timeout_ms: u64,
    #[serde(default = "default_drift_factor")]
    pub drift_factor: f64,
    #[serde(default = "default_drift_constant_ms")]
    pub drift_constant_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_max_retry_delay_ms() -> u64 {
    DEFAULT_MAX_RETRY_DELAY_MS
}

fn default_node_timeout_ms() -> u64 {
    DEFAULT_NODE_TIMEOUT_MS
}

fn default_drift_factor() -> f64 {
    DEFAULT_DRIFT_FACTOR
}

fn default_drift_constant_ms() -> u64 {
    DEFAULT_DRIFT_CONSTANT_MS
}

impl LockConfig {
    /// Config with default tuning for the given node URLs
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
            node_timeout_ms: DEFAULT_NODE_TIMEOUT_MS,
            drift_factor: DEFAULT_DRIFT_FACTOR,
            drift_constant_ms: DEFAULT_DRIFT_CONSTANT_MS,
        }
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DistributedLockError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: LockConfig = serde_yaml::from_str(contents)
            .map_err(|e| DistributedLockError::ConfigError(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(DistributedLockError::ConfigError("at least one node is required".to_string()));
        }
        if let Some(blank) = self.nodes.iter().position(|node| node.trim().is_empty()) {
            return Err(DistributedLockError::ConfigError(format!("node #{} is blank", blank)));
        }
        self.options()?;
        Ok(())
    }

    /// Tuning part of the configuration
    pub fn options(&self) -> Result<LockOptions> {
        let drift = ClockDriftEstimator::new(self.drift_factor, Duration::from_millis(self.drift_constant_ms))
            .map_err(|e| DistributedLockError::ConfigError(e.to_string()))?;
        let options = LockOptions {
            max_attempts: self.max_attempts,
            max_retry_delay: Duration::from_millis(self.max_retry_delay_ms),
            node_timeout: Duration::from_millis(self.node_timeout_ms),
            drift,
        };
        options
            .validate()
            .map_err(|e| DistributedLockError::ConfigError(e.to_string()))?;
        Ok(options)
    }
}

/// Retry, timeout and drift settings of a `LockClient`
#[derive(Debug, Clone, PartialEq)]
pub struct LockOptions {
    pub max_attempts: u32,
    pub max_retry_delay: Duration,
    pub node_timeout: Duration,
    pub drift: ClockDriftEstimator,
}

impl LockOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(DistributedLockError::InvalidArgument("max_attempts must be at least 1".to_string()));
        }
        if self.node_timeout.is_zero() {
            return Err(DistributedLockError::InvalidArgument("node timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub(crate) fn retry(&self) -> RetryScheduler {
        RetryScheduler::new(self.max_attempts, self.max_retry_delay)
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_retry_delay: Duration::from_millis(DEFAULT_MAX_RETRY_DELAY_MS),
            node_timeout: Duration::from_millis(DEFAULT_NODE_TIMEOUT_MS),
            drift: ClockDriftEstimator::default(),
        }
    }
}
