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

// Per-tick capture driver
//
// Runs synchronously on the render tick: polls the sensor subsystem, skips
// stale frames, validates descriptors, converts timestamps, and fans the
// frame out to the split exporter and the descriptor CSV writers. Never
// blocks and never raises; every per-frame failure is logged and the tick
// continues.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

use crate::clock::ClockOffset;
use crate::csv_writer::{CsvRow, CsvValue, CsvWriter};
use crate::error::RecorderError;
use crate::exporter::FrameSplitExporter;
use crate::frame::{DepthFrameSource, FrameDescriptor};

/// Exactly one descriptor per eye.
pub const EYE_COUNT: usize = 2;

/// Column layout of the per-eye descriptor CSV files.
pub const DESCRIPTOR_HEADER: [&str; 17] = [
    "timestamp_ms",
    "sensor_timestamp",
    "create_pose_location_x",
    "create_pose_location_y",
    "create_pose_location_z",
    "create_pose_rotation_x",
    "create_pose_rotation_y",
    "create_pose_rotation_z",
    "create_pose_rotation_w",
    "fov_left_angle_tangent",
    "fov_right_angle_tangent",
    "fov_top_angle_tangent",
    "fov_down_angle_tangent",
    "near_z",
    "far_z",
    "width",
    "height",
];

/// Build one descriptor row. `sensor_timestamp` is the raw sensor clock in
/// seconds; `timestamp_ms` the converted wall-clock value.
pub fn descriptor_row(
    descriptor: &FrameDescriptor,
    wall_clock_ms: i64,
    width: u32,
    height: u32,
) -> CsvRow {
    vec![
        CsvValue::from(wall_clock_ms),
        CsvValue::from(descriptor.timestamp_ns as f64 / 1e9),
        CsvValue::from(descriptor.position[0]),
        CsvValue::from(descriptor.position[1]),
        CsvValue::from(descriptor.position[2]),
        CsvValue::from(descriptor.rotation[0]),
        CsvValue::from(descriptor.rotation[1]),
        CsvValue::from(descriptor.rotation[2]),
        CsvValue::from(descriptor.rotation[3]),
        CsvValue::from(descriptor.fov_left_tan),
        CsvValue::from(descriptor.fov_right_tan),
        CsvValue::from(descriptor.fov_top_tan),
        CsvValue::from(descriptor.fov_down_tan),
        CsvValue::from(descriptor.near_z),
        CsvValue::from(descriptor.far_z),
        CsvValue::from(width),
        CsvValue::from(height),
    ]
}

/// Where a capture loop puts its per-frame outputs.
pub struct CaptureOutputs {
    pub left_depth_dir: PathBuf,
    pub right_depth_dir: PathBuf,
    pub left_rows: CsvWriter,
    pub right_rows: CsvWriter,
}

/// Poll-driven capture loop, stepped once per render tick.
pub struct FrameCaptureLoop<S: DepthFrameSource> {
    source: S,
    exporter: Arc<FrameSplitExporter>,
    outputs: CaptureOutputs,
    clock: ClockOffset,
    last_handle: Option<u64>,
}

impl<S: DepthFrameSource> FrameCaptureLoop<S> {
    pub fn new(
        source: S,
        exporter: Arc<FrameSplitExporter>,
        outputs: CaptureOutputs,
        clock: ClockOffset,
    ) -> Self {
        Self {
            source,
            exporter,
            outputs,
            clock,
            last_handle: None,
        }
    }

    /// Process at most one new frame. Must run inside a tokio runtime
    /// context (the exporter spawns its readback tasks from here).
    pub fn tick(&mut self) {
        if !self.source.is_running() {
            return;
        }

        let Some(frame) = self.source.poll_latest_frame() else {
            return;
        };

        // The subsystem can return a cached handle between true updates.
        if self.last_handle == Some(frame.native_handle) {
            return;
        }
        self.last_handle = Some(frame.native_handle);

        if frame.descriptors.len() != EYE_COUNT {
            let err = RecorderError::DescriptorCountMismatch {
                expected: EYE_COUNT,
                actual: frame.descriptors.len(),
            };
            error!("{err}; skipping frame");
            return;
        }

        if !frame.texture.is_created() {
            error!("{}; skipping frame", RecorderError::SourceNotCreated);
            return;
        }

        let wall_clock_ms = self.clock.wall_clock_ms(frame.timestamp_ns);
        let left_path = self.outputs.left_depth_dir.join(format!("{wall_clock_ms}.raw"));
        let right_path = self
            .outputs
            .right_depth_dir
            .join(format!("{wall_clock_ms}.raw"));

        if let Err(e) = self
            .exporter
            .export(frame.texture.as_ref(), left_path, right_path)
        {
            error!("depth export failed: {}; skipping frame", e);
            return;
        }

        let width = frame.texture.width();
        let height = frame.texture.height();

        for (eye, descriptor) in frame.descriptors.iter().enumerate() {
            let row_wall_ms = self.clock.wall_clock_ms(descriptor.timestamp_ns);
            let row = descriptor_row(descriptor, row_wall_ms, width, height);
            let writer = if eye == 0 {
                &self.outputs.left_rows
            } else {
                &self.outputs.right_rows
            };
            if let Err(e) = writer.enqueue(row) {
                warn!("failed to enqueue descriptor row: {}", e);
            }
        }
    }

    /// Close both descriptor writers, draining their queues.
    pub fn close_writers(&mut self) -> Result<(), RecorderError> {
        self.outputs.left_rows.close()?;
        self.outputs.right_rows.close()
    }

    pub fn clock(&self) -> &ClockOffset {
        &self.clock
    }
}
