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

use serde::Deserialize;
use std::path::PathBuf;

pub const ROOT_PREFIX: &str = "root";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub loggers: Vec<LoggerConfig>,
}

/// One rolling log file, for the module path `path_prefix` or for `root`
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    pub path_prefix: String,
    pub log_directory: String,
    pub log_file_name: String,
    pub max_file_size: u64,
    pub max_zip_count: u32,
    pub level: String,
}

impl LogConfig {
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = std::fs::read_to_string(path.into())?;
        let config: LogConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn get_root_config(&self) -> Option<&LoggerConfig> {
        self.loggers.iter().find(|l| l.path_prefix == ROOT_PREFIX)
    }

    /// Loggers bound to a module path, i.e. everything but `root`
    pub fn module_loggers(&self) -> impl Iterator<Item = &LoggerConfig> {
        self.loggers.iter().filter(|l| l.path_prefix != ROOT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
loggers:
  - path_prefix: root
    log_directory: logs
    log_file_name: root.log
    max_file_size: 10485760
    max_zip_count: 6
    level: info
  - path_prefix: distributed_lock
    log_directory: logs
    log_file_name: lock.log
    max_file_size: 1048576
    max_zip_count: 3
    level: debug
"#;

    #[test]
    fn test_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = LogConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.loggers.len(), 2);
        assert_eq!(config.get_root_config().unwrap().log_file_name, "root.log");
        assert_eq!(config.module_loggers().count(), 1);
    }

    #[test]
    fn test_module_loggers_skip_root() {
        let config: LogConfig = serde_yaml::from_str(YAML).unwrap();
        let modules: Vec<_> = config.module_loggers().map(|l| l.path_prefix.as_str()).collect();
        assert_eq!(modules, vec!["distributed_lock"]);
    }

    #[test]
    fn test_empty_config_has_no_root() {
        let config: LogConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.get_root_config().is_none());
    }
}
