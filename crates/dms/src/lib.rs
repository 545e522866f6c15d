//! Driver Monitoring System (DMS)
//!
//! Eye-closure drowsiness detection on top of a face-mesh landmark model:
//! - Eye height from upper/lower lid landmarks
//! - Eyes-closed baseline calibration
//! - Debounced open/closed state machine driving the alarm signal
//! - Overlay text for the monitoring view

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod detector;
pub mod eye;
pub mod landmarks;
pub mod overlay;
pub mod state;

pub use analysis::{DmsAnalysis, MONITOR_WINDOW};
pub use calibration::{calibrate, BaselineAccumulator, Calibration};
pub use config::{DmsConfig, TensorLayout};
pub use detector::{FaceMeshDetector, LandmarkDetector};
pub use landmarks::{Landmark, LandmarkSet};
pub use overlay::{FrameDisplay, Overlay, OverlayText};
pub use state::{DrowsinessMonitor, EyeState, MonitorSnapshot};

use camera_capture::frame::VideoFrame;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, trace};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Display failed: {0}")]
    Display(String),

    #[error("Landmark {index} missing (face has {available} landmarks)")]
    LandmarkMissing { index: usize, available: usize },
}

/// Driver monitoring module: detector plus calibrated state machine
pub struct DmsModule<D: LandmarkDetector> {
    detector: D,
    monitor: DrowsinessMonitor,
}

impl<D: LandmarkDetector> DmsModule<D> {
    /// Create a module using a finished calibration; monitoring starts at `now`
    pub fn new(config: &DmsConfig, detector: D, calibration: &Calibration, now: Instant) -> Self {
        let threshold = calibration.threshold(config.threshold_margin);
        info!(
            "Eyes-closed threshold {:.2} px (baseline {:.2} + margin {:.2})",
            threshold, calibration.baseline, config.threshold_margin
        );
        Self {
            detector,
            monitor: DrowsinessMonitor::new(threshold, config, now),
        }
    }

    /// Analyze a single frame.
    ///
    /// Only the first detected face is measured. Frames without a face leave the
    /// monitor untouched.
    pub fn analyze(&mut self, frame: &VideoFrame, now: Instant) -> Result<DmsAnalysis, DmsError> {
        let faces = self.detector.detect(frame)?;

        let eye_height = match faces.first() {
            Some(face) => Some(eye::average_eye_height(face, frame.width, frame.height)?),
            None => {
                trace!("No face in frame {}", frame.sequence);
                None
            }
        };

        Ok(DmsAnalysis {
            faces: faces.len(),
            eye_height,
            monitor: self.monitor.tick(eye_height, now),
        })
    }

    pub fn monitor(&self) -> &DrowsinessMonitor {
        &self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LEFT_EYE, RIGHT_EYE};
    use alerting::{AlarmEvent, AlarmSignal};
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Plays back per-frame eye heights; `None` means no face
    struct FixtureDetector {
        heights: VecDeque<Option<u32>>,
    }

    impl LandmarkDetector for FixtureDetector {
        fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DmsError> {
            let Some(height) = self.heights.pop_front().flatten() else {
                return Ok(Vec::new());
            };
            let dy = height as f32 / frame.height as f32;
            let mut face = LandmarkSet::default();
            for (eye, x) in [(RIGHT_EYE, 0.25), (LEFT_EYE, 0.75)] {
                face.set(eye.top, Landmark::new(x, 0.25, 0.0));
                face.set(eye.bottom, Landmark::new(x, 0.25 + dy, 0.0));
            }
            // A second face must be ignored
            let mut other = face.clone();
            other.set(RIGHT_EYE.bottom, Landmark::new(0.25, 0.9, 0.0));
            Ok(vec![face, other])
        }
    }

    fn module(heights: Vec<Option<u32>>, start: Instant) -> DmsModule<FixtureDetector> {
        let calibration = Calibration {
            baseline: 3.0,
            samples: 10,
            cancelled: false,
            elapsed: Duration::from_secs(3),
        };
        DmsModule::new(
            &DmsConfig::default(),
            FixtureDetector {
                heights: heights.into(),
            },
            &calibration,
            start,
        )
    }

    #[test]
    fn test_threshold_includes_margin() {
        let m = module(vec![], Instant::now());
        assert_eq!(m.monitor().threshold(), 5.0);
    }

    #[test]
    fn test_analyze_drives_alarm() {
        let start = Instant::now();
        let frame = VideoFrame::blank(64, 64);
        let script = vec![Some(8), Some(4), None, Some(4), Some(4), Some(4), Some(4)];
        let mut m = module(script, start);

        let results: Vec<_> = (0..7)
            .map(|i| m.analyze(&frame, start + Duration::from_secs(i)).unwrap())
            .collect();

        assert_eq!(results[0].eye_height, Some(8.0));
        assert_eq!(results[0].faces, 2);
        assert_eq!(results[1].monitor.state, EyeState::Closed);

        assert!(!results[2].face_detected());
        assert_eq!(results[2].eye_height, None);
        assert_eq!(results[2].monitor, results[1].monitor);

        // Closed since t=1; elapsed exceeds 3s first at t=5
        assert_eq!(results[4].monitor.alarm, AlarmSignal::Silent);
        assert_eq!(results[5].monitor.event, Some(AlarmEvent::Started));
        assert_eq!(results[6].monitor.event, None);
        assert!(results[6].monitor.alarm.is_sounding());
    }

    #[test]
    fn test_missing_landmark_is_fatal() {
        struct BrokenDetector;
        impl LandmarkDetector for BrokenDetector {
            fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DmsError> {
                Ok(vec![LandmarkSet::new(vec![Landmark::default(); 100])])
            }
        }

        let calibration = Calibration {
            baseline: 0.0,
            samples: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        };
        let mut m = DmsModule::new(&DmsConfig::default(), BrokenDetector, &calibration, Instant::now());
        let result = m.analyze(&VideoFrame::blank(8, 8), Instant::now());
        assert!(matches!(result, Err(DmsError::LandmarkMissing { index: 159, available: 100 })));
    }
}
