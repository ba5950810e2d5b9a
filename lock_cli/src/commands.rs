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

use clap::Subcommand;

#[derive(Subcommand, Debug, PartialEq)]
pub enum LockCommands {
    /// Acquire a lock and print its handle
    Acquire {
        /// Lock key name
        #[clap(short, long)]
        key: String,

        /// Lock expiration time on every node, in milliseconds
        #[clap(short, long, default_value_t = 10000)]
        ttl_ms: u64,

        /// Ownership token, a random one is generated when omitted
        #[clap(short, long)]
        value: Option<String>,

        /// Hold the lock for this long, then release it; Ctrl-C releases early
        #[clap(long)]
        hold_ms: Option<u64>,
    },

    /// Release a lock owned by the given token
    Release {
        /// Lock key name
        #[clap(short, long)]
        key: String,

        /// Ownership token printed by acquire
        #[clap(short, long)]
        value: String,
    },

    /// Reset the expiration time of a held lock
    Extend {
        /// Lock key name
        #[clap(short, long)]
        key: String,

        /// Ownership token printed by acquire
        #[clap(short, long)]
        value: String,

        /// New expiration time, in milliseconds
        #[clap(short, long)]
        ttl_ms: u64,
    },

    /// Show the registered nodes and the quorum size
    Nodes,
}
