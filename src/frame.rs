// Frame data model and the sensor-subsystem collaborator trait

use std::sync::Arc;

use crate::gpu::DepthTexture;

/// Per-eye metadata captured with a depth frame: pose, field-of-view edge
/// tangents and clip planes. Immutable; lives for one capture tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDescriptor {
    /// Monotonic sensor clock, nanoseconds.
    pub timestamp_ns: i64,
    pub position: [f32; 3],
    /// Orientation quaternion, x/y/z/w.
    pub rotation: [f32; 4],
    pub fov_left_tan: f32,
    pub fov_right_tan: f32,
    pub fov_top_tan: f32,
    pub fov_down_tan: f32,
    pub near_z: f32,
    pub far_z: f32,
}

/// One polled depth frame: the opaque native handle the subsystem uses to
/// identify distinct captures, the frame timestamp, per-eye descriptors and
/// the GPU texture holding both eye regions.
pub struct DepthFrame {
    pub native_handle: u64,
    pub timestamp_ns: i64,
    pub descriptors: Vec<FrameDescriptor>,
    pub texture: Arc<dyn DepthTexture>,
}

/// Sensor subsystem collaborator polled once per render tick.
///
/// `poll_latest_frame` may hand back a cached frame carrying the same native
/// handle as the previous poll; callers deduplicate on the handle.
pub trait DepthFrameSource: Send {
    fn is_running(&self) -> bool;

    fn poll_latest_frame(&mut self) -> Option<DepthFrame>;
}
