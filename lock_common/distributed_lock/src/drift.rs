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

use crate::error::{DistributedLockError, Result};

const DEFAULT_DRIFT_FACTOR: f64 = 0.01;
const DEFAULT_DRIFT_CONSTANT: Duration = Duration::from_millis(2);

/// Margin subtracted from a lock's TTL to account for clock skew between the caller and the
/// nodes, scaled with the lock lifetime: `drift(ttl) = ttl * factor + constant`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockDriftEstimator {
    factor: f64,
    constant: Duration,
}

impl ClockDriftEstimator {
    /// # Errors
    ///
    /// * `DistributedLockError::InvalidArgument` - If `factor` is negative or not finite.
    pub fn new(factor: f64, constant: Duration) -> Result<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(DistributedLockError::InvalidArgument(format!(
                "drift factor must be a finite, non-negative number, got {}",
                factor
            )));
        }
        Ok(Self { factor, constant })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn constant(&self) -> Duration {
        self.constant
    }

    pub fn drift(&self, ttl: Duration) -> Duration {
        // float to int casts saturate
        let scaled = (ttl.as_nanos() as f64 * self.factor).round();
        Duration::from_nanos(scaled as u64).saturating_add(self.constant)
    }

    /// Remaining validity of a lock with `ttl` whose acquisition took `elapsed`.
    ///
    /// Returns `None` when nothing is left, i.e. `ttl - elapsed - drift(ttl) <= 0`.
    pub fn validity(&self, ttl: Duration, elapsed: Duration) -> Option<Duration> {
        ttl.checked_sub(elapsed)
            .and_then(|left| left.checked_sub(self.drift(ttl)))
            .filter(|left| !left.is_zero())
    }
}

impl Default for ClockDriftEstimator {
    fn default() -> Self {
        Self {
            factor: DEFAULT_DRIFT_FACTOR,
            constant: DEFAULT_DRIFT_CONSTANT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_drift_scales_with_ttl() {
        let estimator = ClockDriftEstimator::default();
        assert_eq!(estimator.drift(Duration::from_secs(10)), Duration::from_millis(102));
        assert_eq!(estimator.drift(Duration::from_secs(1)), Duration::from_millis(12));
        assert_eq!(estimator.drift(Duration::ZERO), Duration::from_millis(2));
    }

    #[test]
    fn test_validity_subtracts_elapsed_and_drift() {
        let estimator = ClockDriftEstimator::default();
        let validity = estimator.validity(Duration::from_secs(10), Duration::from_millis(5));
        assert_eq!(validity, Some(Duration::from_millis(9_893)));
    }

    #[test]
    fn test_validity_is_none_when_drift_consumes_ttl() {
        let estimator = ClockDriftEstimator::default();
        assert_eq!(estimator.validity(Duration::from_millis(2), Duration::ZERO), None);
        assert_eq!(estimator.validity(Duration::from_millis(100), Duration::from_millis(99)), None);
    }

    #[test]
    fn test_validity_is_none_when_exactly_zero() {
        let estimator = ClockDriftEstimator::new(0.0, Duration::from_millis(10)).unwrap();
        assert_eq!(estimator.validity(Duration::from_millis(30), Duration::from_millis(20)), None);
        assert_eq!(
            estimator.validity(Duration::from_millis(30), Duration::from_millis(19)),
            Some(Duration::from_millis(1))
        );
    }

    #[test]
    fn test_new_rejects_bad_factor() {
        assert!(ClockDriftEstimator::new(-0.1, Duration::ZERO).is_err());
        assert!(ClockDriftEstimator::new(f64::NAN, Duration::ZERO).is_err());
        assert!(ClockDriftEstimator::new(f64::INFINITY, Duration::ZERO).is_err());
    }
}
