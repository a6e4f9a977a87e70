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

use reality_recorder::clock::ClockOffset;
use reality_recorder::csv_writer::CsvWriter;
use reality_recorder::mock::MockPoseSource;
use reality_recorder::pose::{PoseLogger, PoseSample, POSE_HEADER};
use tempfile::TempDir;

fn sample(timestamp_s: f64) -> PoseSample {
    PoseSample {
        timestamp_s,
        position: [1.0, 1.5, -2.0],
        rotation: [0.0, 0.0, 0.25, 0.5],
    }
}

fn data_rows(path: &std::path::Path) -> Vec<Vec<f64>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|line| line.split(',').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn test_pose_rows_are_logged_with_w_component() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poses.csv");

    let writer = CsvWriter::open(&path, Some(&POSE_HEADER)).unwrap();
    let source = MockPoseSource::new(vec![sample(1.5)]);
    let mut logger = PoseLogger::new(source, writer, ClockOffset::new(0, 0));

    logger.tick();
    logger.close().unwrap();

    let rows = data_rows(&path);
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.len(), POSE_HEADER.len());
    assert_eq!(row[0], 1500.0); // wall-clock ms from 1.5 s of sensor time
    assert_eq!(row[1], 1.5);
    assert_eq!(&row[2..5], &[1.0, 1.5, -2.0]);
    // Fourth rotation column is w, not a second copy of z.
    assert_eq!(&row[5..9], &[0.0, 0.0, 0.25, 0.5]);
}

#[test]
fn test_stale_timestamp_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poses.csv");

    let writer = CsvWriter::open(&path, Some(&POSE_HEADER)).unwrap();
    let source = MockPoseSource::new(vec![sample(1.0), sample(1.0), sample(0.5), sample(2.0)]);
    let mut logger = PoseLogger::new(source, writer, ClockOffset::new(0, 0));

    for _ in 0..4 {
        logger.tick();
    }
    logger.close().unwrap();

    let rows = data_rows(&path);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], 1.0);
    assert_eq!(rows[1][1], 2.0);
}

#[test]
fn test_unavailable_tracking_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poses.csv");

    let writer = CsvWriter::open(&path, Some(&POSE_HEADER)).unwrap();
    let source = MockPoseSource::new(vec![]);
    let mut logger = PoseLogger::new(source, writer, ClockOffset::new(0, 0));

    logger.tick();
    logger.close().unwrap();

    assert!(data_rows(&path).is_empty());
}
