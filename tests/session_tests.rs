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

use reality_recorder::config::RecorderConfig;
use reality_recorder::error::RecorderError;
use reality_recorder::frame::{DepthFrame, FrameDescriptor};
use reality_recorder::gpu::GpuDevice;
use reality_recorder::mock::{MockDepthTexture, MockFrameSource, MockGpuDevice, MockPoseSource};
use reality_recorder::pose::{PoseSample, PoseSource};
use reality_recorder::session::CaptureSession;
use std::sync::Arc;
use tempfile::TempDir;

fn test_config(base: &std::path::Path) -> RecorderConfig {
    let mut config = RecorderConfig::default();
    config.output.base_path = base.to_string_lossy().into_owned();
    config.output.session_dir = Some("test-session".to_string());
    config
}

fn frame(handle: u64, timestamp_ns: i64) -> DepthFrame {
    DepthFrame {
        native_handle: handle,
        timestamp_ns,
        descriptors: vec![
            FrameDescriptor {
                timestamp_ns,
                position: [0.0, 1.0, 0.0],
                rotation: [0.0, 0.0, 0.0, 1.0],
                fov_left_tan: 1.0,
                fov_right_tan: 1.0,
                fov_top_tan: 1.0,
                fov_down_tan: 1.0,
                near_z: 0.25,
                far_z: 64.0,
            };
            2
        ],
        texture: Arc::new(MockDepthTexture::ramp(4, 4)),
    }
}

fn count_lines(path: &std::path::Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

#[tokio::test]
async fn test_session_records_and_tears_down() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let device = Arc::new(MockGpuDevice::new());
    let gpu: Arc<dyn GpuDevice> = device.clone();
    let source = MockFrameSource::new(vec![frame(1, 1_000_000), frame(2, 2_000_000)]);
    let pose_source: Box<dyn PoseSource> = Box::new(MockPoseSource::new(vec![PoseSample {
        timestamp_s: 0.5,
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
    }]));

    let mut session =
        CaptureSession::start(&config, source, Some(pose_source), gpu, 1_000_000).unwrap();
    let layout = session.layout().clone();
    let exporter = Arc::clone(session.exporter());

    session.tick();
    session.tick();
    session.stop().await.unwrap();

    assert_eq!(device.dispatch_count(), 2);

    // Header plus one row per eye per frame.
    assert_eq!(count_lines(&layout.left_descriptor_csv), 3);
    assert_eq!(count_lines(&layout.right_descriptor_csv), 3);
    assert_eq!(count_lines(&layout.pose_csv), 2);

    let left_raws = std::fs::read_dir(&layout.left_depth_dir).unwrap().count();
    let right_raws = std::fs::read_dir(&layout.right_depth_dir).unwrap().count();
    assert_eq!(left_raws, 2);
    assert_eq!(right_raws, 2);

    // The pool was disposed with the exporter; late exports are rejected.
    let texture = MockDepthTexture::ramp(4, 4);
    let err = exporter
        .export(
            &texture,
            layout.left_depth_dir.join("late.raw"),
            layout.right_depth_dir.join("late.raw"),
        )
        .unwrap_err();
    assert!(matches!(err, RecorderError::ExporterDisposed));
    assert_eq!(device.live_buffer_count(), 0);
}

#[tokio::test]
async fn test_session_metadata_file_is_written() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let gpu: Arc<dyn GpuDevice> = Arc::new(MockGpuDevice::new());
    let session = CaptureSession::start(
        &config,
        MockFrameSource::new(vec![]),
        None,
        gpu,
        0,
    )
    .unwrap();

    let metadata: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&session.layout().metadata_file).unwrap()).unwrap();

    assert_eq!(
        metadata["recording_id"].as_str().unwrap(),
        session.recording_id().to_string()
    );
    assert!(metadata["started_at"].is_string());
    assert_eq!(metadata["config"]["output"]["session_dir"], "test-session");

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_generated_session_dir_when_unset() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.output.session_dir = None;

    let gpu: Arc<dyn GpuDevice> = Arc::new(MockGpuDevice::new());
    let session = CaptureSession::start(&config, MockFrameSource::new(vec![]), None, gpu, 0).unwrap();

    let expected = session.started_at().format("%Y%m%d_%H%M%S").to_string();
    let name = session
        .layout()
        .session_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(name, expected);
    assert!(session.layout().session_dir.is_dir());

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pose_logging_disabled_by_config() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.capture.log_poses = false;

    let gpu: Arc<dyn GpuDevice> = Arc::new(MockGpuDevice::new());
    let pose_source: Box<dyn PoseSource> = Box::new(MockPoseSource::new(vec![PoseSample {
        timestamp_s: 0.5,
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
    }]));

    let mut session = CaptureSession::start(
        &config,
        MockFrameSource::new(vec![]),
        Some(pose_source),
        gpu,
        0,
    )
    .unwrap();
    let layout = session.layout().clone();

    session.tick();
    session.stop().await.unwrap();

    assert!(!layout.pose_csv.exists());
}

#[tokio::test]
async fn test_depth_export_disabled_by_config() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.capture.export_depth = false;

    let device = Arc::new(MockGpuDevice::new());
    let gpu: Arc<dyn GpuDevice> = device.clone();
    let source = MockFrameSource::new(vec![frame(1, 1_000_000)]);

    let mut session = CaptureSession::start(&config, source, None, gpu, 0).unwrap();
    let layout = session.layout().clone();

    session.tick();
    session.stop().await.unwrap();

    assert_eq!(device.dispatch_count(), 0);
    assert_eq!(count_lines(&layout.left_descriptor_csv), 1); // header only
}
