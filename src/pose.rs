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

// Head/controller pose logging
//
// Samples a pose source once per tick and appends one CSV row per distinct
// sample. The sensor reports time in seconds here, and repeated samples are
// deduplicated by timestamp rather than by handle.

use tracing::warn;

use crate::clock::ClockOffset;
use crate::csv_writer::{CsvValue, CsvWriter};
use crate::error::RecorderError;

/// One sampled pose: sensor timestamp in seconds plus position and
/// orientation (x/y/z/w quaternion).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub timestamp_s: f64,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

/// Collaborator that reports the latest tracked pose, or `None` when
/// tracking is unavailable.
pub trait PoseSource: Send {
    fn sample_pose(&mut self) -> Option<PoseSample>;
}

impl PoseSource for Box<dyn PoseSource> {
    fn sample_pose(&mut self) -> Option<PoseSample> {
        (**self).sample_pose()
    }
}

/// Column layout of the pose CSV file.
pub const POSE_HEADER: [&str; 9] = [
    "unix_time",
    "sensor_timestamp",
    "pos_x",
    "pos_y",
    "pos_z",
    "rot_x",
    "rot_y",
    "rot_z",
    "rot_w",
];

/// Per-tick pose row logger.
pub struct PoseLogger<P: PoseSource> {
    source: P,
    writer: CsvWriter,
    clock: ClockOffset,
    latest_timestamp: f64,
}

impl<P: PoseSource> PoseLogger<P> {
    pub fn new(source: P, writer: CsvWriter, clock: ClockOffset) -> Self {
        Self {
            source,
            writer,
            clock,
            latest_timestamp: f64::NEG_INFINITY,
        }
    }

    /// Sample once; a timestamp not strictly newer than the last logged one
    /// means no new tracking data and the tick is skipped.
    pub fn tick(&mut self) {
        let Some(sample) = self.source.sample_pose() else {
            return;
        };

        if sample.timestamp_s <= self.latest_timestamp {
            return;
        }
        self.latest_timestamp = sample.timestamp_s;

        let row = vec![
            CsvValue::from(self.clock.wall_clock_ms_from_secs(sample.timestamp_s)),
            CsvValue::from(sample.timestamp_s),
            CsvValue::from(sample.position[0]),
            CsvValue::from(sample.position[1]),
            CsvValue::from(sample.position[2]),
            CsvValue::from(sample.rotation[0]),
            CsvValue::from(sample.rotation[1]),
            CsvValue::from(sample.rotation[2]),
            CsvValue::from(sample.rotation[3]),
        ];

        if let Err(e) = self.writer.enqueue(row) {
            warn!("failed to enqueue pose row: {}", e);
        }
    }

    /// Drain and close the underlying writer.
    pub fn close(&mut self) -> Result<(), RecorderError> {
        self.writer.close()
    }
}
