//! Camera Capture Library for the Drowsiness Monitor
//!
//! Provides the frame types and video sources consumed by the DMS loop.
//! Supports:
//! - Decoded RGB frames with pixel access and `image` interop
//! - The `FrameSource` trait every capture backend implements
//! - Live webcam capture through OpenCV (`webcam` feature)
//! - Image-sequence playback from a directory (recorded sessions, tests)

pub mod frame;
pub mod sequence;
#[cfg(feature = "webcam")]
pub mod webcam;

pub use frame::VideoFrame;
pub use sequence::ImageSequenceSource;
#[cfg(feature = "webcam")]
pub use webcam::WebcamSource;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("No frames found in {0}")]
    Empty(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A producer of video frames.
///
/// `read_frame` returning `None` means no frame was available on this call; the
/// caller skips the tick and asks again. A source that can never produce another
/// frame reports it through `is_open`.
pub trait FrameSource {
    /// Acquire the next frame (blocking)
    fn read_frame(&mut self) -> Option<VideoFrame>;

    /// Whether the source can still produce frames
    fn is_open(&self) -> bool;

    /// Release the underlying device
    fn release(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Option<VideoFrame> {
        (**self).read_frame()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Which backend produces frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live capture device
    Webcam,
    /// Recorded frames in `frames_dir`
    Frames,
}

impl Default for SourceKind {
    /// The webcam when capture support is compiled in
    fn default() -> Self {
        if cfg!(feature = "webcam") {
            SourceKind::Webcam
        } else {
            SourceKind::Frames
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub source: SourceKind,
    /// Capture device index for the webcam source
    pub device: i32,
    /// Directory holding the recorded frames, played back in file-name order
    pub frames_dir: PathBuf,
    /// Target FPS (0 disables pacing)
    pub fps: u32,
    /// Restart from the first frame once the sequence is exhausted
    pub loop_playback: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            device: 0,
            frames_dir: PathBuf::from("frames"),
            fps: 15,
            loop_playback: false,
        }
    }
}
