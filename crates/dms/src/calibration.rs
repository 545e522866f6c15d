//! Eyes-closed baseline calibration

use alerting::{CueSink, CALIBRATION_END_TONE, CALIBRATION_START_TONE};
use camera_capture::FrameSource;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::detector::LandmarkDetector;
use crate::eye::average_eye_height;
use crate::overlay::{FrameDisplay, Overlay, YELLOW};
use crate::DmsError;

/// Prompt shown while calibrating
pub const CALIBRATION_PROMPT: &str = "Now close your eyes";

/// Window title used while calibrating
pub const CALIBRATION_WINDOW: &str = "Calibrating";

/// Running mean of eye-height samples
#[derive(Debug, Clone, Default)]
pub struct BaselineAccumulator {
    sum: f64,
    count: usize,
}

impl BaselineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: f64) {
        self.sum += sample;
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Arithmetic mean of the samples, 0 when there are none
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }
}

impl Extend<f64> for BaselineAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for sample in iter {
            self.push(sample);
        }
    }
}

/// Calibration outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    /// Mean eyes-closed eye height (pixels)
    pub baseline: f64,
    /// Number of samples behind the baseline
    pub samples: usize,
    /// Whether the user ended calibration early
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl Calibration {
    /// Operating threshold: baseline plus the safety margin
    pub fn threshold(&self, margin: f64) -> f64 {
        self.baseline + margin
    }
}

/// Measure the eyes-closed baseline.
///
/// Frames are collected for `duration` (or until the user quits or the source
/// closes) and every detected face contributes one sample. Cue and display
/// failures are logged and ignored. A face with missing lid landmarks aborts
/// calibration with an error.
pub fn calibrate<S, D, V, C>(
    source: &mut S,
    detector: &mut D,
    display: &mut V,
    cues: &mut C,
    duration: Duration,
) -> Result<Calibration, DmsError>
where
    S: FrameSource + ?Sized,
    D: LandmarkDetector + ?Sized,
    V: FrameDisplay + ?Sized,
    C: CueSink + ?Sized,
{
    info!("Calibrating eyes-closed baseline for {:.1}s", duration.as_secs_f64());
    if let Err(e) = cues.beep(CALIBRATION_START_TONE) {
        warn!("Calibration start cue failed: {}", e);
    }

    let mut overlay = Overlay::new();
    overlay.text(CALIBRATION_PROMPT, (10, 40), YELLOW, 1.0, 2);

    let mut samples = BaselineAccumulator::new();
    let mut cancelled = false;
    let start = Instant::now();

    while start.elapsed() < duration && source.is_open() {
        let Some(frame) = source.read_frame() else {
            debug!("No frame available during calibration");
            continue;
        };

        for face in detector.detect(&frame)? {
            samples.push(average_eye_height(&face, frame.width, frame.height)?);
        }

        if let Err(e) = display.show(CALIBRATION_WINDOW, &frame, &overlay) {
            warn!("Calibration preview failed: {}", e);
        }
        if display.quit_requested() {
            info!("Calibration cancelled by user");
            cancelled = true;
            break;
        }
    }

    if let Err(e) = cues.beep(CALIBRATION_END_TONE) {
        warn!("Calibration end cue failed: {}", e);
    }

    let calibration = Calibration {
        baseline: samples.mean(),
        samples: samples.len(),
        cancelled,
        elapsed: start.elapsed(),
    };

    if samples.is_empty() {
        warn!("No face seen during calibration, baseline defaults to 0");
    } else {
        info!(
            "Calibrated baseline {:.2} px from {} samples",
            calibration.baseline, calibration.samples
        );
    }

    Ok(calibration)
}
