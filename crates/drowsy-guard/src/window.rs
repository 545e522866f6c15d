//! On-screen display through OpenCV `highgui`

use camera_capture::VideoFrame;
use dms::overlay::Color;
use dms::{DmsError, FrameDisplay, Overlay};
use opencv::{
    core::{self, Mat, Point, Scalar},
    highgui, imgproc,
    prelude::*,
};
use tracing::{debug, warn};

use crate::input::{is_quit_key, QuitSignal};

/// Key poll delay per frame, in milliseconds
const KEY_WAIT_MS: i32 = 1;

/// Shows frames in a `highgui` window and polls the keyboard once per frame.
///
/// Switching to a different window name closes the previous window, so the
/// calibration window disappears once monitoring starts.
pub struct HighGuiDisplay {
    quit: QuitSignal,
    current_window: Option<String>,
}

impl HighGuiDisplay {
    pub fn new(quit: QuitSignal) -> Self {
        Self {
            quit,
            current_window: None,
        }
    }

    fn switch_window(&mut self, window: &str) -> opencv::Result<()> {
        if self.current_window.as_deref() == Some(window) {
            return Ok(());
        }
        if let Some(previous) = self.current_window.take() {
            debug!("Closing window {}", previous);
            highgui::destroy_window(&previous)?;
        }
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
        self.current_window = Some(window.to_string());
        Ok(())
    }

    fn render(&mut self, window: &str, frame: &VideoFrame, overlay: &Overlay) -> opencv::Result<()> {
        let mut rgb = Mat::new_rows_cols_with_default(
            frame.height as i32,
            frame.width as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        let bytes = rgb.data_bytes_mut()?;
        if bytes.len() != frame.data.len() {
            return Err(opencv::Error::new(
                core::StsUnmatchedSizes,
                format!("frame holds {} bytes, expected {}", frame.data.len(), bytes.len()),
            ));
        }
        bytes.copy_from_slice(&frame.data);

        let mut bgr = Mat::default();
        imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;

        for line in overlay.lines() {
            imgproc::put_text(
                &mut bgr,
                &line.text,
                Point::new(line.origin.0, line.origin.1),
                imgproc::FONT_HERSHEY_SIMPLEX,
                line.scale as f64,
                bgr_scalar(line.color),
                line.thickness as i32,
                imgproc::LINE_AA,
                false,
            )?;
        }

        self.switch_window(window)?;
        highgui::imshow(window, &bgr)
    }
}

impl FrameDisplay for HighGuiDisplay {
    fn show(&mut self, window: &str, frame: &VideoFrame, overlay: &Overlay) -> Result<(), DmsError> {
        self.render(window, frame, overlay)
            .map_err(|e| DmsError::Display(format!("{}: {}", window, e)))
    }

    fn quit_requested(&mut self) -> bool {
        match highgui::wait_key(KEY_WAIT_MS) {
            Ok(key) if is_quit_key(key) => self.quit.request(),
            Ok(_) => {}
            Err(e) => warn!("Key poll failed: {}", e),
        }
        self.quit.is_requested()
    }
}

impl Drop for HighGuiDisplay {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!("Failed to close windows: {}", e);
        }
    }
}

/// Overlay colors are RGB; OpenCV draws in BGR
fn bgr_scalar(color: Color) -> Scalar {
    Scalar::new(color[2] as f64, color[1] as f64, color[0] as f64, 0.0)
}
