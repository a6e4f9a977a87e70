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

// Recording session assembly
//
// Owns the pool, exporter, writers and capture loop for one recording, with
// explicit creation and teardown ordering: the pool outlives every in-flight
// export and each writer outlives every enqueue. Replaces the ad hoc
// per-component nullable state of the original scene scripts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::capture::{CaptureOutputs, FrameCaptureLoop, DESCRIPTOR_HEADER};
use crate::clock::ClockOffset;
use crate::config::{OutputConfig, RecorderConfig};
use crate::csv_writer::CsvWriter;
use crate::error::RecorderError;
use crate::exporter::FrameSplitExporter;
use crate::frame::DepthFrameSource;
use crate::gpu::GpuDevice;
use crate::pool::ScratchBufferPool;
use crate::pose::{PoseLogger, PoseSource, POSE_HEADER};

/// On-disk layout of one recording session.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub session_dir: PathBuf,
    pub left_depth_dir: PathBuf,
    pub right_depth_dir: PathBuf,
    pub left_descriptor_csv: PathBuf,
    pub right_descriptor_csv: PathBuf,
    pub pose_csv: PathBuf,
    pub metadata_file: PathBuf,
}

impl OutputLayout {
    /// Resolve the layout from config. Without an explicit session dir a
    /// timestamped name is generated, one directory per recording.
    pub fn from_config(output: &OutputConfig, started_at: DateTime<Utc>) -> Self {
        let session_name = output
            .session_dir
            .clone()
            .unwrap_or_else(|| started_at.format("%Y%m%d_%H%M%S").to_string());
        let session_dir = Path::new(&output.base_path).join(session_name);

        Self {
            left_depth_dir: session_dir.join(&output.left_depth_dir),
            right_depth_dir: session_dir.join(&output.right_depth_dir),
            left_descriptor_csv: session_dir.join(&output.left_descriptor_file),
            right_descriptor_csv: session_dir.join(&output.right_descriptor_file),
            pose_csv: session_dir.join(&output.pose_file),
            metadata_file: session_dir.join("session.json"),
            session_dir,
        }
    }
}

#[derive(Serialize)]
struct SessionMetadata<'a> {
    recording_id: Uuid,
    started_at: DateTime<Utc>,
    config: &'a RecorderConfig,
}

/// One recording: directories, writers, exporter and capture loop.
pub struct CaptureSession<S: DepthFrameSource> {
    recording_id: Uuid,
    started_at: DateTime<Utc>,
    layout: OutputLayout,
    exporter: Arc<FrameSplitExporter>,
    capture: FrameCaptureLoop<S>,
    pose: Option<PoseLogger<Box<dyn PoseSource>>>,
    export_depth: bool,
}

impl<S: DepthFrameSource> CaptureSession<S> {
    /// Create the session directory tree, open the writers (headers written
    /// before any row), build pool and exporter, capture the clock offset
    /// and persist the session metadata file.
    pub fn start(
        config: &RecorderConfig,
        source: S,
        pose_source: Option<Box<dyn PoseSource>>,
        device: Arc<dyn GpuDevice>,
        base_sensor_time_ns: i64,
    ) -> Result<Self> {
        let recording_id = Uuid::new_v4();
        let started_at = Utc::now();
        let layout = OutputLayout::from_config(&config.output, started_at);

        std::fs::create_dir_all(&layout.left_depth_dir)
            .context("Failed to create left depth directory")?;
        std::fs::create_dir_all(&layout.right_depth_dir)
            .context("Failed to create right depth directory")?;

        let metadata = SessionMetadata {
            recording_id,
            started_at,
            config,
        };
        let metadata_json =
            serde_json::to_vec_pretty(&metadata).context("Failed to serialize session metadata")?;
        std::fs::write(&layout.metadata_file, metadata_json)
            .context("Failed to write session metadata")?;

        let left_rows = CsvWriter::open(&layout.left_descriptor_csv, Some(&DESCRIPTOR_HEADER))
            .context("Failed to open left descriptor writer")?;
        let right_rows = CsvWriter::open(&layout.right_descriptor_csv, Some(&DESCRIPTOR_HEADER))
            .context("Failed to open right descriptor writer")?;

        let clock = ClockOffset::capture(base_sensor_time_ns);

        let pool = Arc::new(ScratchBufferPool::new(Arc::clone(&device)));
        let exporter = Arc::new(FrameSplitExporter::new(device, pool));

        let outputs = CaptureOutputs {
            left_depth_dir: layout.left_depth_dir.clone(),
            right_depth_dir: layout.right_depth_dir.clone(),
            left_rows,
            right_rows,
        };
        let capture = FrameCaptureLoop::new(source, Arc::clone(&exporter), outputs, clock);

        let pose = match pose_source {
            Some(pose_source) if config.capture.log_poses => {
                let writer = CsvWriter::open(&layout.pose_csv, Some(&POSE_HEADER))
                    .context("Failed to open pose writer")?;
                Some(PoseLogger::new(pose_source, writer, clock))
            }
            _ => None,
        };

        info!(
            recording_id = %recording_id,
            session_dir = %layout.session_dir.display(),
            "recording session started"
        );

        Ok(Self {
            recording_id,
            started_at,
            layout,
            exporter,
            capture,
            pose,
            export_depth: config.capture.export_depth,
        })
    }

    /// Step the session once per render tick. Non-blocking; must run inside
    /// a tokio runtime context.
    pub fn tick(&mut self) {
        if self.export_depth {
            self.capture.tick();
        }
        if let Some(pose) = self.pose.as_mut() {
            pose.tick();
        }
    }

    /// Stop recording: reject new exports, await in-flight readbacks and
    /// file writes, then drain and close every writer. Blocking by design;
    /// shutdown path only.
    pub async fn stop(mut self) -> Result<(), RecorderError> {
        self.exporter.dispose();
        self.exporter.drain().await;

        self.capture.close_writers()?;
        if let Some(pose) = self.pose.as_mut() {
            pose.close()?;
        }

        info!(recording_id = %self.recording_id, "recording session stopped");
        Ok(())
    }

    pub fn recording_id(&self) -> Uuid {
        self.recording_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn exporter(&self) -> &Arc<FrameSplitExporter> {
        &self.exporter
    }
}
