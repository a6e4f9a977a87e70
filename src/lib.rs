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

// Reality Recorder - asynchronous depth-frame and pose export pipeline
//
// This is the headless core of a headset "reality logging" application that:
// - Polls the depth sensor subsystem once per render tick
// - Splits the stereo depth buffer on the GPU into per-eye scratch buffers
// - Reads the buffers back asynchronously without stalling the render loop
// - Persists raw little-endian f32 depth files and CSV descriptor/pose rows
//   on background workers, in strict enqueue order per writer
//
// The GPU and the sensor subsystem are collaborator traits; `mock` provides
// CPU-backed implementations so the whole pipeline runs without hardware.

pub mod capture;
pub mod clock;
pub mod config;
pub mod csv_writer;
pub mod error;
pub mod exporter;
pub mod frame;
pub mod gpu;
pub mod logging;
pub mod mock;
pub mod pool;
pub mod pose;
pub mod session;

// Re-export main types
pub use capture::{FrameCaptureLoop, DESCRIPTOR_HEADER, EYE_COUNT};
pub use clock::ClockOffset;
pub use config::{load_config, load_config_with_env, RecorderConfig};
pub use csv_writer::{CsvRow, CsvValue, CsvWriter};
pub use error::RecorderError;
pub use exporter::FrameSplitExporter;
pub use frame::{DepthFrame, DepthFrameSource, FrameDescriptor};
pub use gpu::{DepthTexture, DispatchGroups, GpuBuffer, GpuDevice, TILE_SIZE};
pub use logging::init_logging;
pub use pool::ScratchBufferPool;
pub use pose::{PoseLogger, PoseSample, PoseSource, POSE_HEADER};
pub use session::{CaptureSession, OutputLayout};
