//! Live capture through OpenCV `videoio`

use opencv::{core::Mat, imgproc, prelude::*, videoio};
use std::time::Instant;
use tracing::{info, warn};

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};

/// Webcam source backed by `cv::VideoCapture`.
///
/// A failed or empty grab yields `None` for that call; the device stays open.
pub struct WebcamSource {
    capture: videoio::VideoCapture,
    bgr: Mat,
    opened_at: Instant,
    sequence: u32,
    released: bool,
}

impl WebcamSource {
    /// Open the capture device named by `config.device`
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let capture = videoio::VideoCapture::new(config.device, videoio::CAP_ANY)
            .map_err(|e| CameraError::Open(format!("device {}: {}", config.device, e)))?;

        let opened = capture
            .is_opened()
            .map_err(|e| CameraError::Open(format!("device {}: {}", config.device, e)))?;
        if !opened {
            return Err(CameraError::Open(format!(
                "device {} could not be opened",
                config.device
            )));
        }

        info!("Opened webcam device {}", config.device);
        Ok(Self {
            capture,
            bgr: Mat::default(),
            opened_at: Instant::now(),
            sequence: 0,
            released: false,
        })
    }

    fn grab(&mut self) -> opencv::Result<Option<VideoFrame>> {
        if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let frame = VideoFrame::new(
            rgb.data_bytes()?.to_vec(),
            rgb.cols() as u32,
            rgb.rows() as u32,
            self.opened_at.elapsed().as_nanos() as u64,
            self.sequence,
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }
}

impl FrameSource for WebcamSource {
    fn read_frame(&mut self) -> Option<VideoFrame> {
        if self.released {
            return None;
        }
        match self.grab() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to grab webcam frame: {}", e);
                None
            }
        }
    }

    fn is_open(&self) -> bool {
        !self.released && self.capture.is_opened().unwrap_or(false)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.capture.release() {
            warn!("Failed to release webcam: {}", e);
        }
        info!("Released webcam after {} frames", self.sequence);
    }
}
