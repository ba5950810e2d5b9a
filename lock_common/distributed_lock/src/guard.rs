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

use log::error;

use super::client::LockClient;
use super::error::Result;
use super::lock::LockHandle;

/// Held lock that is released when dropped
///
/// Dropping spawns the release on the current Tokio runtime; call `release` to wait for it
/// instead. Without a runtime the lock is left to expire through its TTL.
#[derive(Debug)]
pub struct LockGuard {
    client: LockClient,
    handle: LockHandle,
    released: bool,
}

impl LockGuard {
    pub(crate) fn new(client: LockClient, handle: LockHandle) -> Self {
        Self {
            client,
            handle,
            released: false,
        }
    }

    pub fn handle(&self) -> &LockHandle {
        &self.handle
    }

    /// Extends the held lock, keeping the guard on the new handle when it succeeds
    pub async fn extend(&mut self, ttl: Duration) -> Result<bool> {
        match self.client.extend(&self.handle, ttl).await? {
            Some(handle) => {
                self.handle = handle;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn release(mut self) {
        self.released = true;
        self.client.release(&self.handle).await;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let client = self.client.clone();
                let handle = self.handle.clone();
                runtime.spawn(async move {
                    client.release(&handle).await;
                });
            }
            Err(_) => {
                error!(
                    "Failed to release lock {}: no async runtime, it will expire on its own",
                    self.handle.resource_key()
                );
            }
        }
    }
}
