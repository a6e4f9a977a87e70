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

// Stereo depth-frame split exporter
//
// Dispatches the GPU split into two pooled scratch buffers, reads each back
// asynchronously and writes the host-side floats to disk as headerless
// little-endian f32 files. The caller returns as soon as the dispatch is
// enqueued; left and right outputs complete independently.

use bytes::{BufMut, BytesMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::RecorderError;
use crate::gpu::{DepthTexture, DispatchGroups, GpuBuffer, GpuDevice};
use crate::pool::ScratchBufferPool;

/// Splits a stereo depth texture into per-eye raw files.
///
/// A scratch buffer is returned to the pool only after its data has been
/// fully copied out (or its readback failed); after `dispose` the pool frees
/// returned buffers immediately, so late completions remain safe.
pub struct FrameSplitExporter {
    device: Arc<dyn GpuDevice>,
    pool: Arc<ScratchBufferPool>,
    disposed: AtomicBool,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl FrameSplitExporter {
    pub fn new(device: Arc<dyn GpuDevice>, pool: Arc<ScratchBufferPool>) -> Self {
        Self {
            device,
            pool,
            disposed: AtomicBool::new(false),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Export one frame. Validation failures leave no partial output; the
    /// two file writes happen on background tasks and are not ordered with
    /// respect to each other or to other frames.
    ///
    /// Must be called from within a tokio runtime context.
    pub fn export(
        &self,
        source: &dyn DepthTexture,
        left_path: PathBuf,
        right_path: PathBuf,
    ) -> Result<(), RecorderError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(RecorderError::ExporterDisposed);
        }

        if !source.is_created() {
            return Err(RecorderError::SourceNotCreated);
        }

        let width = source.width();
        let height = source.height();
        if height % 2 != 0 || height == 0 {
            return Err(RecorderError::UnsplittableSource(height));
        }

        // The texture stacks both eye regions; each destination holds one.
        let eye_elements = (width as usize) * (height as usize) / 2;

        let left_buffer = self.pool.acquire(eye_elements)?;
        let right_buffer = self.pool.acquire(eye_elements)?;

        let groups = DispatchGroups::for_texture(width, height);
        if let Err(e) = self.device.dispatch_split(
            source,
            left_buffer.as_ref(),
            right_buffer.as_ref(),
            groups,
        ) {
            self.pool.release(left_buffer);
            self.pool.release(right_buffer);
            return Err(e);
        }

        debug!(
            width,
            height,
            groups_x = groups.x,
            groups_y = groups.y,
            "dispatched depth split"
        );

        let left = self.spawn_readback(left_buffer, left_path);
        let right = self.spawn_readback(right_buffer, right_path);

        let mut in_flight = self.in_flight.lock().unwrap();
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(left);
        in_flight.push(right);

        Ok(())
    }

    fn spawn_readback(&self, buffer: Box<dyn GpuBuffer>, path: PathBuf) -> JoinHandle<()> {
        let device = Arc::clone(&self.device);
        let pool = Arc::clone(&self.pool);

        tokio::spawn(async move {
            match device.readback(buffer.as_ref()).await {
                Err(e) => {
                    warn!("readback for {} failed: {}", path.display(), e);
                }
                Ok(values) => {
                    let mut bytes = BytesMut::with_capacity(values.len() * 4);
                    for value in &values {
                        bytes.put_f32_le(*value);
                    }
                    if let Err(e) = tokio::fs::write(&path, &bytes).await {
                        error!("failed to write raw depth {}: {}", path.display(), e);
                    }
                }
            }
            pool.release(buffer);
        })
    }

    /// Mark the exporter inert and free all pooled buffers. Further `export`
    /// calls are rejected; readbacks already in flight still complete and
    /// their buffers are freed on release. Idempotent.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.pool.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Await every in-flight readback/write task. Used on shutdown and in
    /// tests that need deterministic completion.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.in_flight.lock().unwrap());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("export task join failed: {}", e);
            }
        }
    }
}
