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

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger as SizeBasedTriggerPolicy;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::{
    append::rolling_file::RollingFileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};
use std::path::Path;
use crate::config::{LogConfig, LoggerConfig};

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S:%3f)} {l} [{M}:{L}] - {m}{n}";
const ROOT_APPENDER: &str = "root_appender";
const CONSOLE_APPENDER: &str = "console_appender";

pub struct Logger {
    handle: Handle,
}

impl Logger {
    pub fn new_from_config(config: LogConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let handle = log4rs::init_config(Self::build_config(&config)?)?;
        Ok(Self { handle })
    }

    /// Logger writing everything at `level` and above to stderr
    pub fn new_console(level: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let handle = log4rs::init_config(Self::console_config(parse_level(level))?)?;
        Ok(Self { handle })
    }

    /// Replaces the running configuration
    pub fn reconfigure(&self, config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
        self.handle.set_config(Self::build_config(config)?);
        Ok(())
    }

    /// Builds the log4rs configuration: one rolling file per module logger, the root logger
    /// on its own file, or on the console when no root entry exists.
    pub fn build_config(config: &LogConfig) -> Result<Config, Box<dyn std::error::Error>> {
        let mut log4rs_config = Config::builder();

        for logger_config in config.module_loggers() {
            let appender = Self::create_appender(logger_config)?;
            let appender_name = format!("{}_appender", logger_config.path_prefix);
            log4rs_config = log4rs_config
                .appender(Appender::builder().build(&appender_name, Box::new(appender)));

            let logger = log4rs::config::Logger::builder()
                .appender(appender_name)
                .additive(false)
                .build(
                    logger_config.path_prefix.clone(),
                    parse_level(&logger_config.level),
                );
            log4rs_config = log4rs_config.logger(logger);
        }

        let root = match config.get_root_config() {
            Some(root_config) => {
                let root_appender = Self::create_appender(root_config)?;
                log4rs_config = log4rs_config
                    .appender(Appender::builder().build(ROOT_APPENDER, Box::new(root_appender)));
                Root::builder()
                    .appender(ROOT_APPENDER)
                    .build(parse_level(&root_config.level))
            }
            None => {
                log4rs_config = log4rs_config
                    .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console_appender())));
                Root::builder().appender(CONSOLE_APPENDER).build(LevelFilter::Info)
            }
        };

        Ok(log4rs_config.build(root)?)
    }

    fn console_config(level: LevelFilter) -> Result<Config, Box<dyn std::error::Error>> {
        let config = Config::builder()
            .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console_appender())))
            .build(Root::builder().appender(CONSOLE_APPENDER).build(level))?;
        Ok(config)
    }

    fn create_appender(
        config: &LoggerConfig,
    ) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
        let log_directory = Path::new(&config.log_directory);
        std::fs::create_dir_all(log_directory)?;

        let log_file = log_directory.join(&config.log_file_name);
        // the .gz extension makes the roller compress archives
        let archived_log_pattern = format!(
            "{}/{}.{{}}.gz",
            log_directory.display(),
            config.log_file_name
        );

        let size_trigger = SizeBasedTriggerPolicy::new(config.max_file_size);
        let roller =
            FixedWindowRoller::builder().build(&archived_log_pattern, config.max_zip_count)?;
        let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(log_file, Box::new(compound_policy))?;

        Ok(appender)
    }
}

fn console_appender() -> ConsoleAppender {
    ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build()
}

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_logger(prefix: &str, dir: &Path, level: &str) -> LoggerConfig {
        LoggerConfig {
            path_prefix: prefix.to_string(),
            log_directory: dir.display().to_string(),
            log_file_name: format!("{}.log", prefix),
            max_file_size: 1024,
            max_zip_count: 2,
            level: level.to_string(),
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn test_build_config_with_root_and_module_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            loggers: vec![
                file_logger("root", dir.path(), "info"),
                file_logger("distributed_lock", &dir.path().join("lock"), "debug"),
            ],
        };

        let built = Logger::build_config(&config).unwrap();

        assert_eq!(built.appenders().len(), 2);
        assert_eq!(built.loggers().len(), 1);
        assert_eq!(built.root().level(), LevelFilter::Info);
        assert!(dir.path().join("lock").is_dir());
    }

    #[test]
    fn test_build_config_without_root_logs_to_console() {
        let built = Logger::build_config(&LogConfig::default()).unwrap();

        assert_eq!(built.appenders().len(), 1);
        assert_eq!(built.appenders()[0].name(), CONSOLE_APPENDER);
    }
}
