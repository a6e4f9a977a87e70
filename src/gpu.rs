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

// GPU collaborator traits
//
// The compute dispatch and the asynchronous readback are external
// collaborators: the pipeline only needs "an operation that, given a source
// texture, fills two destination buffers" and "a readback that eventually
// yields host-side floats or an error". Everything GPU-specific lives behind
// these traits; `crate::mock` provides a CPU-backed implementation.

use async_trait::async_trait;
use std::any::Any;

use crate::error::RecorderError;

/// Tile edge used by the split kernel. Dispatch groups are ceil-divided so
/// the grid covers the full image.
pub const TILE_SIZE: u32 = 8;

/// A GPU-resident depth texture handed over by the sensor subsystem.
pub trait DepthTexture: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Whether the texture has backing storage. Textures that are not yet
    /// realized must not be dispatched against.
    fn is_created(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// A GPU-readable scratch buffer of 32-bit float elements.
///
/// Freeing the underlying resource is dropping the box.
pub trait GpuBuffer: Send + Sync {
    fn element_count(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

/// Thread-group grid for a split dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGroups {
    pub x: u32,
    pub y: u32,
}

impl DispatchGroups {
    /// Ceil-divide the texture dimensions by [`TILE_SIZE`] so every pixel is
    /// covered.
    pub fn for_texture(width: u32, height: u32) -> Self {
        Self {
            x: width.div_ceil(TILE_SIZE),
            y: height.div_ceil(TILE_SIZE),
        }
    }
}

/// Compute device that allocates scratch buffers, runs the stereo split
/// kernel, and reads buffers back to host memory.
#[async_trait]
pub trait GpuDevice: Send + Sync {
    /// Allocate a scratch buffer of `element_count` f32 elements.
    fn create_buffer(&self, element_count: usize) -> Result<Box<dyn GpuBuffer>, RecorderError>;

    /// Enqueue the split kernel: copy the top eye region of `source` into
    /// `left` and the bottom region into `right`. Non-blocking from the
    /// caller's perspective.
    fn dispatch_split(
        &self,
        source: &dyn DepthTexture,
        left: &dyn GpuBuffer,
        right: &dyn GpuBuffer,
        groups: DispatchGroups,
    ) -> Result<(), RecorderError>;

    /// Read a buffer back to host memory. Resolves once the GPU work feeding
    /// the buffer has completed; runs on whatever context the device picks.
    async fn readback(&self, buffer: &dyn GpuBuffer) -> Result<Vec<f32>, RecorderError>;
}
