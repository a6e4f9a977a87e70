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

// CPU-backed mock collaborators
//
// Shipped as a library module so integration tests and demos can drive the
// full pipeline without a GPU or a headset. The mock device performs the
// stereo split on the CPU (top half of the texture is the left eye, bottom
// half the right) and counts allocations so pool behavior is observable.

use async_trait::async_trait;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::RecorderError;
use crate::frame::{DepthFrame, DepthFrameSource};
use crate::gpu::{DepthTexture, DispatchGroups, GpuBuffer, GpuDevice};
use crate::pose::{PoseSample, PoseSource};

/// Row-major depth texture with both eye regions stacked vertically.
pub struct MockDepthTexture {
    width: u32,
    height: u32,
    created: bool,
    data: Vec<f32>,
}

impl MockDepthTexture {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            created: true,
            data,
        }
    }

    /// Texture filled with the ramp 0, 1, 2, ... in row-major order.
    pub fn ramp(width: u32, height: u32) -> Self {
        let data = (0..width * height).map(|i| i as f32).collect();
        Self::new(width, height, data)
    }

    /// Texture without backing storage, for validation tests.
    pub fn uncreated(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            created: false,
            data: Vec::new(),
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl DepthTexture for MockDepthTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_created(&self) -> bool {
        self.created
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct MockBuffer {
    element_count: usize,
    data: Mutex<Vec<f32>>,
    live: Arc<AtomicUsize>,
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

impl GpuBuffer for MockBuffer {
    fn element_count(&self) -> usize {
        self.element_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// CPU stand-in for the compute device. Splits textures synchronously at
/// dispatch time and serves readbacks from host memory; failure injection
/// flags cover the error paths.
#[derive(Default)]
pub struct MockGpuDevice {
    allocations: AtomicUsize,
    live: Arc<AtomicUsize>,
    dispatches: AtomicUsize,
    fail_dispatch: AtomicBool,
    fail_readback: AtomicBool,
}

impl MockGpuDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total buffers ever allocated.
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Buffers currently alive (allocated and not yet dropped).
    pub fn live_buffer_count(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn set_fail_dispatch(&self, fail: bool) {
        self.fail_dispatch.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_readback(&self, fail: bool) {
        self.fail_readback.store(fail, Ordering::Relaxed);
    }

    fn copy_into(buffer: &dyn GpuBuffer, values: &[f32]) -> Result<(), RecorderError> {
        let mock = buffer
            .as_any()
            .downcast_ref::<MockBuffer>()
            .ok_or_else(|| RecorderError::Dispatch("foreign buffer handed to mock device".into()))?;
        if mock.element_count != values.len() {
            return Err(RecorderError::Dispatch(format!(
                "destination holds {} elements, eye region has {}",
                mock.element_count,
                values.len()
            )));
        }
        *mock.data.lock().unwrap() = values.to_vec();
        Ok(())
    }
}

#[async_trait]
impl GpuDevice for MockGpuDevice {
    fn create_buffer(&self, element_count: usize) -> Result<Box<dyn GpuBuffer>, RecorderError> {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MockBuffer {
            element_count,
            data: Mutex::new(vec![0.0; element_count]),
            live: Arc::clone(&self.live),
        }))
    }

    fn dispatch_split(
        &self,
        source: &dyn DepthTexture,
        left: &dyn GpuBuffer,
        right: &dyn GpuBuffer,
        _groups: DispatchGroups,
    ) -> Result<(), RecorderError> {
        if self.fail_dispatch.load(Ordering::Relaxed) {
            return Err(RecorderError::Dispatch("simulated dispatch failure".into()));
        }

        let texture = source
            .as_any()
            .downcast_ref::<MockDepthTexture>()
            .ok_or_else(|| {
                RecorderError::Dispatch("foreign texture handed to mock device".into())
            })?;

        let eye_elements = texture.data.len() / 2;
        Self::copy_into(left, &texture.data[..eye_elements])?;
        Self::copy_into(right, &texture.data[eye_elements..])?;

        self.dispatches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn readback(&self, buffer: &dyn GpuBuffer) -> Result<Vec<f32>, RecorderError> {
        if self.fail_readback.load(Ordering::Relaxed) {
            return Err(RecorderError::Readback("simulated readback failure".into()));
        }

        let mock = buffer
            .as_any()
            .downcast_ref::<MockBuffer>()
            .ok_or_else(|| RecorderError::Readback("foreign buffer handed to mock device".into()))?;
        Ok(mock.data.lock().unwrap().clone())
    }
}

/// Scripted frame source: yields its frames in order, then `None`.
pub struct MockFrameSource {
    running: bool,
    frames: VecDeque<DepthFrame>,
}

impl MockFrameSource {
    pub fn new(frames: Vec<DepthFrame>) -> Self {
        Self {
            running: true,
            frames: frames.into(),
        }
    }

    pub fn stopped() -> Self {
        Self {
            running: false,
            frames: VecDeque::new(),
        }
    }
}

impl DepthFrameSource for MockFrameSource {
    fn is_running(&self) -> bool {
        self.running
    }

    fn poll_latest_frame(&mut self) -> Option<DepthFrame> {
        self.frames.pop_front()
    }
}

/// Scripted pose source: yields its samples in order, then `None`.
pub struct MockPoseSource {
    samples: VecDeque<PoseSample>,
}

impl MockPoseSource {
    pub fn new(samples: Vec<PoseSample>) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

impl PoseSource for MockPoseSource {
    fn sample_pose(&mut self) -> Option<PoseSample> {
        self.samples.pop_front()
    }
}
