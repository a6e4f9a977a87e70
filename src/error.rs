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

// Error taxonomy for the recorder pipeline

use thiserror::Error;

/// Errors surfaced by the recording pipeline.
///
/// Lifecycle errors (`WriterClosed`, `ExporterDisposed`) are rejections
/// returned to the caller. Validation errors mean the operation was skipped
/// with no partial output. Resource errors mean the frame's output simply
/// does not get written; the buffer involved is always reclaimed.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("csv writer is closed")]
    WriterClosed,

    #[error("exporter has been disposed")]
    ExporterDisposed,

    #[error("row has {actual} columns but header has {expected}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("expected {expected} eye descriptors, got {actual}")]
    DescriptorCountMismatch { expected: usize, actual: usize },

    #[error("source depth texture is null or not created")]
    SourceNotCreated,

    #[error("source height {0} cannot be split into two eye regions")]
    UnsplittableSource(u32),

    #[error("gpu buffer allocation failed: {0}")]
    Allocation(String),

    #[error("gpu dispatch failed: {0}")]
    Dispatch(String),

    #[error("gpu readback failed: {0}")]
    Readback(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
