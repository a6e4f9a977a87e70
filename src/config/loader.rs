// Copyright 2025 Reality Recorder Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        // Substitute environment variables
        let content = Self::substitute_env_vars(&content);

        // Parse YAML
        let config: RecorderConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

        // Validate configuration
        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${SESSION_DIR:-session-001} -> session-001 (if SESSION_DIR not set)
    pub(crate) fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if let Some(default) = default_value {
                        default.to_string()
                    } else {
                        // Keep original if no default and var not found
                        format!("${{{}}}", var_name)
                    }
                }
            }
        })
        .to_string()
    }

    /// Validate configuration
    pub(crate) fn validate(config: &RecorderConfig) -> Result<()> {
        if config.output.base_path.is_empty() {
            bail!("output.base_path cannot be empty");
        }

        if config.output.left_depth_dir.is_empty() || config.output.right_depth_dir.is_empty() {
            bail!("output depth directory names cannot be empty");
        }

        if config.output.left_depth_dir == config.output.right_depth_dir {
            bail!("output.left_depth_dir and output.right_depth_dir must differ");
        }

        if config.output.left_descriptor_file == config.output.right_descriptor_file {
            bail!("output descriptor file names must differ");
        }

        match config.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            unknown => bail!(
                "Unknown log level: '{}'. Supported: trace, debug, info, warn, error",
                unknown
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REALITY_RECORDER_TEST_VAR", "test_value");

        let input = "base_path: ${REALITY_RECORDER_TEST_VAR}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "base_path: test_value");

        std::env::remove_var("REALITY_RECORDER_TEST_VAR");
    }

    #[test]
    fn test_env_var_default() {
        std::env::remove_var("REALITY_RECORDER_UNSET_VAR");

        let input = "session_dir: ${REALITY_RECORDER_UNSET_VAR:-fallback}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "session_dir: fallback");
    }

    #[test]
    fn test_missing_var_without_default_is_kept() {
        std::env::remove_var("REALITY_RECORDER_UNSET_VAR");

        let input = "base_path: ${REALITY_RECORDER_UNSET_VAR}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "base_path: ${REALITY_RECORDER_UNSET_VAR}");
    }

    #[test]
    fn test_validate_rejects_colliding_dirs() {
        let mut config = RecorderConfig::default();
        config.output.right_depth_dir = config.output.left_depth_dir.clone();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = RecorderConfig::default();
        config.logging.level = "loud".to_string();
        assert!(ConfigLoader::validate(&config).is_err());
    }
}
