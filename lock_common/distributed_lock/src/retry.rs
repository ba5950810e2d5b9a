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
use std::time::Duration;

use log::debug;
use rand::Rng;
use tokio::time::{sleep, sleep_until, Instant};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(200);

/// Bounded retry loop with a random pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryScheduler {
    max_attempts: u32,
    max_delay: Duration,
}

impl RetryScheduler {
    /// `max_attempts` of zero is treated as one attempt.
    pub fn new(max_attempts: u32, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            max_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Uniform pause in `[0, max_delay)`
    pub fn backoff(&self) -> Duration {
        let upper = u64::try_from(self.max_delay.as_micros()).unwrap_or(u64::MAX);
        if upper == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::thread_rng().gen_range(0..upper))
    }

    /// Runs `attempt` until it yields a value or the attempts are used up.
    ///
    /// With a `deadline`, no attempt starts after it and the pause between attempts ends
    /// early when it is reached. An attempt that already started is always awaited to the end.
    pub async fn run<T, F, Fut>(&self, deadline: Option<Instant>, mut attempt: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for number in 1..=self.max_attempts {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!("Deadline reached before attempt {}/{}", number, self.max_attempts);
                    return None;
                }
            }

            if let Some(value) = attempt(number).await {
                return Some(value);
            }
            if number == self.max_attempts {
                break;
            }

            let delay = self.backoff();
            debug!("Attempt {}/{} failed, retrying in {:?}", number, self.max_attempts, delay);
            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = sleep_until(deadline) => {
                            debug!("Deadline reached while waiting to retry");
                            return None;
                        }
                    }
                }
                None => sleep(delay).await,
            }
        }
        None
    }
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY)
    }
}
