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

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use distributed_lock::{DistributedLockError, LockClient, LockConfig, LockHandle};
use log::{error, info};

use crate::commands::LockCommands;

const EXIT_NOT_ACQUIRED: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const NODES_ENV: &str = "LOCK_NODES";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Quorum lock over independent Redis nodes", long_about = None)]
struct Cli {
    /// Lock client configuration file (YAML)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Redis node URL, repeat once per node; replaces the nodes of the config file and LOCK_NODES
    #[clap(short, long = "node")]
    nodes: Vec<String>,

    /// Logging configuration file (YAML); logs go to stderr when omitted
    #[clap(long)]
    log_config: Option<PathBuf>,

    /// Level of the stderr logger
    #[clap(long, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: LockCommands,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let logging = match &cli.log_config {
        Some(path) => common_log::init_with_yaml(path),
        None => common_log::init_console(&cli.log_level),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let client = match load_config(&cli).and_then(|config| LockClient::from_config(&config)) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create lock client: {}", e);
            eprintln!("{}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    info!("Lock client ready with {} nodes", client.node_count());

    run(&client, cli.command).await
}

/// Config file first, then LOCK_NODES, then `--node` flags
fn load_config(cli: &Cli) -> Result<LockConfig, DistributedLockError> {
    let mut config = match &cli.config {
        Some(path) => LockConfig::from_yaml(path)?,
        None => LockConfig::with_nodes(nodes_from_env()),
    };
    if !cli.nodes.is_empty() {
        config.nodes = cli.nodes.clone();
    }
    config.validate()?;
    Ok(config)
}

fn nodes_from_env() -> Vec<String> {
    std::env::var(NODES_ENV)
        .map(|nodes| parse_node_list(&nodes))
        .unwrap_or_default()
}

fn parse_node_list(nodes: &str) -> Vec<String> {
    nodes
        .split(',')
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .map(str::to_string)
        .collect()
}

async fn run(client: &LockClient, command: LockCommands) -> ExitCode {
    match command {
        LockCommands::Acquire { key, ttl_ms, value, hold_ms } => {
            match client.acquire(&key, Duration::from_millis(ttl_ms), value.as_deref()).await {
                Ok(Some(handle)) => {
                    print_handle(&handle);
                    if let Some(hold_ms) = hold_ms {
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_millis(hold_ms)) => {}
                            _ = tokio::signal::ctrl_c() => info!("Interrupted, releasing lock {}", key),
                        }
                        client.release(&handle).await;
                        println!("released: {}", key);
                    }
                    ExitCode::SUCCESS
                }
                Ok(None) => {
                    println!("not acquired: {}", key);
                    ExitCode::from(EXIT_NOT_ACQUIRED)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::from(EXIT_CONFIG_ERROR)
                }
            }
        }
        LockCommands::Release { key, value } => {
            client.release_value(&key, &value).await;
            println!("released: {}", key);
            ExitCode::SUCCESS
        }
        LockCommands::Extend { key, value, ttl_ms } => {
            match client.extend_value(&key, &value, Duration::from_millis(ttl_ms)).await {
                Ok(Some(handle)) => {
                    print_handle(&handle);
                    ExitCode::SUCCESS
                }
                Ok(None) => {
                    println!("not extended: {}", key);
                    ExitCode::from(EXIT_NOT_ACQUIRED)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::from(EXIT_CONFIG_ERROR)
                }
            }
        }
        LockCommands::Nodes => {
            print!("{}", client);
            ExitCode::SUCCESS
        }
    }
}

fn print_handle(handle: &LockHandle) {
    println!("key: {}", handle.resource_key());
    println!("value: {}", handle.value());
    println!("validity_ms: {}", handle.validity().as_millis());
}
