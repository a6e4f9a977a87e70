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

// Scratch buffer pool
//
// Keeps idle GPU buffers around so the exporter does not allocate two fresh
// buffers per frame. Acquire/release are called from readback completion
// contexts; all state sits behind one mutex.

use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::RecorderError;
use crate::gpu::{GpuBuffer, GpuDevice};

struct PoolState {
    idle: Vec<Box<dyn GpuBuffer>>,
    disposed: bool,
}

/// Pool of reusable fixed-shape scratch buffers.
///
/// A buffer is owned either by the pool (idle) or by exactly one in-flight
/// export operation; it is never aliased. Released buffers whose element
/// count no longer matches the next request are discarded rather than
/// resized.
pub struct ScratchBufferPool {
    device: Arc<dyn GpuDevice>,
    state: Mutex<PoolState>,
}

impl ScratchBufferPool {
    pub fn new(device: Arc<dyn GpuDevice>) -> Self {
        Self {
            device,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                disposed: false,
            }),
        }
    }

    /// Hand out an idle buffer of `element_count` elements, allocating a
    /// fresh one when the pool is empty. A popped buffer of a stale size is
    /// freed and replaced.
    pub fn acquire(&self, element_count: usize) -> Result<Box<dyn GpuBuffer>, RecorderError> {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(buffer) = state.idle.pop() {
                if buffer.element_count() == element_count {
                    return Ok(buffer);
                }
                debug!(
                    stale = buffer.element_count(),
                    wanted = element_count,
                    "discarding stale-size pooled buffer"
                );
                // Dropping frees the stale buffer.
            }
        }
        self.device.create_buffer(element_count)
    }

    /// Return a buffer to the idle pool. After `dispose` this degrades to
    /// freeing the buffer immediately, so completions landing late are safe.
    pub fn release(&self, buffer: Box<dyn GpuBuffer>) {
        let mut state = self.state.lock().unwrap();
        if state.disposed {
            drop(buffer);
        } else {
            state.idle.push(buffer);
        }
    }

    /// Free every idle buffer. Callers must ensure no borrow is outstanding
    /// if they intend to keep using the pool afterwards.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.idle.clear();
    }

    /// Mark the pool terminal and free all idle buffers. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.state.lock().unwrap();
        state.disposed = true;
        state.idle.clear();
    }

    /// Number of idle buffers currently held.
    pub fn idle_count(&self) -> usize {
        self.state.lock().unwrap().idle.len()
    }
}
