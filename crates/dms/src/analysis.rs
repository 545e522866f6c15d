//! DMS analysis results and overlay text

use serde::Serialize;

use crate::overlay::{Overlay, CYAN, GREEN, RED, WHITE, YELLOW};
use crate::state::{EyeState, MonitorSnapshot};

/// Window title of the monitoring view
pub const MONITOR_WINDOW: &str = "Face Mesh";

/// Quit hint shown on every frame
pub const QUIT_HINT: &str = "Press \"q\" to quit";

/// Banner shown while the eyes are closed
pub const EYES_CLOSED_BANNER: &str = "ALERT: EYES CLOSED!";

/// Complete result for one frame
#[derive(Debug, Clone, Serialize)]
pub struct DmsAnalysis {
    /// Number of faces found in the frame
    pub faces: usize,

    /// Mean eye height of the first face (pixels)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_height: Option<f64>,

    /// Monitor state after this frame
    #[serde(skip)]
    pub monitor: MonitorSnapshot,
}

impl DmsAnalysis {
    pub fn face_detected(&self) -> bool {
        self.faces > 0
    }

    /// Overlay text for this frame.
    ///
    /// Measurements are only drawn on frames with a face; the quit hint is always drawn.
    pub fn overlay(&self) -> Overlay {
        let mut overlay = Overlay::new();

        if let Some(height) = self.eye_height {
            if self.monitor.state == EyeState::Closed {
                overlay.text(EYES_CLOSED_BANNER, (10, 60), RED, 0.8, 3);
            }
            overlay
                .text(format!("Eye height: {:.2} px", height), (10, 30), GREEN, 0.7, 2)
                .text(
                    format!("Eyes Open: {:.2} s", self.monitor.open_for.as_secs_f64()),
                    (10, 120),
                    CYAN,
                    0.7,
                    2,
                )
                .text(
                    format!("Eyes Closed: {:.2} s", self.monitor.closed_for.as_secs_f64()),
                    (10, 150),
                    YELLOW,
                    0.7,
                    2,
                );
        }

        overlay.text(QUIT_HINT, (10, 180), WHITE, 0.7, 2);
        overlay
    }
}
