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

pub mod config;
pub mod logger;

use std::{path::PathBuf, sync::OnceLock};

use crate::config::LogConfig;

static LOGGER: OnceLock<logger::Logger> = OnceLock::new();

/// Initialize logging system
///
/// # Arguments
/// * `config_path` - Path to the logging configuration file
///
/// # Example
/// ```no_run
/// common_log::init_with_yaml("logging.yaml").expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init_with_yaml(config_path: impl Into<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = LogConfig::from_yaml(config_path)?;
    init_with_config(config)
}

/// Initialize logging system with config
///
/// # Arguments
/// * `config` - LogConfig info
///
/// # Example
/// ```no_run
/// use common_log::config::{LogConfig, LoggerConfig};
/// use common_log::init_with_config;
///
/// let config = LogConfig {
///     loggers: vec![LoggerConfig {
///         path_prefix: "root".to_string(),
///         log_directory: "logs".to_string(),
///         log_file_name: "lock.log".to_string(),
///         max_file_size: 10485760,
///         max_zip_count: 6,
///         level: "info".to_string(),
///     }],
/// };
/// init_with_config(config).expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init_with_config(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    if LOGGER.get().is_some() {
        return Err("Logger already initialized".into());
    }
    let logger = logger::Logger::new_from_config(config)?;
    if LOGGER.set(logger).is_err() {
        return Err("Logger already initialized".into());
    }
    Ok(())
}

/// Initialize logging to stderr only, at the given level
pub fn init_console(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    if LOGGER.get().is_some() {
        return Err("Logger already initialized".into());
    }
    let logger = logger::Logger::new_console(level)?;
    if LOGGER.set(logger).is_err() {
        return Err("Logger already initialized".into());
    }
    Ok(())
}

/// Swap the configuration of an initialized logging system
pub fn reload_with_config(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    match LOGGER.get() {
        Some(logger) => logger.reconfigure(config),
        None => Err("Logger not initialized".into()),
    }
}

// Re-export log macros for convenient use in other modules
pub use log::{debug, error, info, trace, warn};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;

    // the only test touching the process-wide logger
    #[test]
    fn test_init_once_then_reload() {
        assert!(reload_with_config(&LogConfig::default()).is_err());

        init_console("debug").unwrap();
        assert!(init_console("info").is_err());
        assert!(init_with_config(LogConfig::default()).is_err());

        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            loggers: vec![LoggerConfig {
                path_prefix: "root".to_string(),
                log_directory: dir.path().display().to_string(),
                log_file_name: "reload.log".to_string(),
                max_file_size: 1024,
                max_zip_count: 1,
                level: "info".to_string(),
            }],
        };
        reload_with_config(&config).unwrap();
        info!("written after reload");
        log::logger().flush();
        assert!(dir.path().join("reload.log").exists());
    }
}
