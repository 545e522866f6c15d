//! DMS configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Memory layout of the face-mesh model input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// 1 x H x W x 3
    #[default]
    Nhwc,
    /// 1 x 3 x H x W
    Nchw,
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eyes closed duration before the alarm starts (milliseconds)
    pub closed_alarm_ms: u64,

    /// Eyes open duration before a sounding alarm stops (milliseconds)
    pub open_grace_ms: u64,

    /// Length of the eyes-closed calibration window (milliseconds)
    pub calibration_ms: u64,

    /// Added to the calibrated baseline to get the closed-eye threshold (pixels)
    pub threshold_margin: f64,

    /// Face-mesh ONNX model path
    pub model_path: Option<PathBuf>,

    /// Square input resolution of the face-mesh model
    pub model_input_size: u32,

    /// Input tensor layout of the face-mesh model
    pub model_layout: TensorLayout,

    /// Minimum face presence score for a detection to count
    pub face_presence_threshold: f32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            closed_alarm_ms: 3000,
            open_grace_ms: 5000,
            calibration_ms: 3000,
            threshold_margin: 2.0,
            model_path: None,
            model_input_size: 192,
            model_layout: TensorLayout::Nhwc,
            face_presence_threshold: 0.5,
        }
    }
}

impl DmsConfig {
    pub fn closed_alarm_after(&self) -> Duration {
        Duration::from_millis(self.closed_alarm_ms)
    }

    pub fn open_grace(&self) -> Duration {
        Duration::from_millis(self.open_grace_ms)
    }

    pub fn calibration_duration(&self) -> Duration {
        Duration::from_millis(self.calibration_ms)
    }
}
