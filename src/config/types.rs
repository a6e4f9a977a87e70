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

// Configuration types for reality-recorder

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderConfig {
    pub output: OutputConfig,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            capture: CaptureSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// On-disk layout of a recording session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Root directory under which session directories are created
    pub base_path: String,

    /// Session directory name; a timestamped name is generated when absent
    #[serde(default)]
    pub session_dir: Option<String>,

    #[serde(default = "default_left_depth_dir")]
    pub left_depth_dir: String,

    #[serde(default = "default_right_depth_dir")]
    pub right_depth_dir: String,

    #[serde(default = "default_left_descriptor_file")]
    pub left_descriptor_file: String,

    #[serde(default = "default_right_descriptor_file")]
    pub right_descriptor_file: String,

    #[serde(default = "default_pose_file")]
    pub pose_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_path: "recordings".to_string(),
            session_dir: None,
            left_depth_dir: default_left_depth_dir(),
            right_depth_dir: default_right_depth_dir(),
            left_descriptor_file: default_left_descriptor_file(),
            right_descriptor_file: default_right_descriptor_file(),
            pose_file: default_pose_file(),
        }
    }
}

/// Capture-specific settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureSettings {
    /// Export split depth frames as raw f32 files
    #[serde(default = "default_true")]
    pub export_depth: bool,

    /// Log tracked poses to the pose CSV file
    #[serde(default = "default_true")]
    pub log_poses: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            export_depth: default_true(),
            log_poses: default_true(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_left_depth_dir() -> String {
    "left_depth".to_string()
}

fn default_right_depth_dir() -> String {
    "right_depth".to_string()
}

fn default_left_descriptor_file() -> String {
    "left_depth_descriptors.csv".to_string()
}

fn default_right_descriptor_file() -> String {
    "right_depth_descriptors.csv".to_string()
}

fn default_pose_file() -> String {
    "poses.csv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
