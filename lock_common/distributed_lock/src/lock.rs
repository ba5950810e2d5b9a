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

use tokio::time::Instant;
use uuid::Uuid;

use super::error::{DistributedLockError, Result};

/// A validated request for one lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    /// Lock key name
    resource_key: String,
    /// Lock time to live on every node
    ttl: Duration,
    /// Lock value, used to identify the lock owner
    value: String,
}

impl LockRequest {
    /// Create a new lock request
    ///
    /// # Arguments
    ///
    /// * `resource_key` - Lock key name, must not be blank
    /// * `ttl` - Lock expiration time, must be greater than zero
    /// * `value` - Ownership token; a random one is generated when `None` or blank
    ///
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If the key is blank or the TTL is zero.
    pub fn new(resource_key: impl Into<String>, ttl: Duration, value: Option<&str>) -> Result<Self> {
        let resource_key = resource_key.into();
        if resource_key.trim().is_empty() {
            return Err(DistributedLockError::InvalidArgument("resource key must not be empty".to_string()));
        }
        if ttl.is_zero() {
            return Err(DistributedLockError::InvalidArgument("lock ttl must be greater than zero".to_string()));
        }
        let value = match value {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => generate_token(),
        };

        Ok(Self { resource_key, ttl, value })
    }

    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Globally unique ownership token
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// A lock held on a quorum of nodes
///
/// Only produced by a successful acquisition or extension. `validity` is the time left
/// when the handle was created, already reduced by acquisition latency and clock drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHandle {
    resource_key: String,
    value: String,
    validity: Duration,
    acquired_at: Instant,
}

impl LockHandle {
    pub(crate) fn new(resource_key: impl Into<String>, value: impl Into<String>, validity: Duration) -> Self {
        Self {
            resource_key: resource_key.into(),
            value: value.into(),
            validity,
            acquired_at: Instant::now(),
        }
    }

    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Validity window at the moment the handle was returned
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Validity left now
    pub fn remaining_validity(&self) -> Duration {
        self.validity.saturating_sub(self.acquired_at.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_validity().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_supplied_value() {
        let request = LockRequest::new("order:42", Duration::from_secs(10), Some("token-1")).unwrap();
        assert_eq!(request.resource_key(), "order:42");
        assert_eq!(request.ttl(), Duration::from_secs(10));
        assert_eq!(request.value(), "token-1");
    }

    #[test]
    fn test_request_generates_value_when_missing_or_blank() {
        let generated = LockRequest::new("order:42", Duration::from_secs(1), None).unwrap();
        let blank = LockRequest::new("order:42", Duration::from_secs(1), Some("  ")).unwrap();
        assert!(Uuid::parse_str(generated.value()).is_ok());
        assert!(Uuid::parse_str(blank.value()).is_ok());
        assert_ne!(generated.value(), blank.value());
    }

    #[test]
    fn test_request_rejects_blank_key() {
        let result = LockRequest::new(" ", Duration::from_secs(1), None);
        assert!(matches!(result, Err(DistributedLockError::InvalidArgument(_))));
    }

    #[test]
    fn test_request_rejects_zero_ttl() {
        let result = LockRequest::new("order:42", Duration::ZERO, None);
        assert!(matches!(result, Err(DistributedLockError::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_remaining_validity_counts_down() {
        let handle = LockHandle::new("order:42", "token-1", Duration::from_millis(500));
        assert_eq!(handle.remaining_validity(), Duration::from_millis(500));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(handle.remaining_validity(), Duration::from_millis(300));
        assert!(!handle.is_expired());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(handle.is_expired());
    }
}
