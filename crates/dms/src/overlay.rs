//! Overlay text model and the display interface

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};

use crate::DmsError;

/// RGB color
pub type Color = [u8; 3];

pub const GREEN: Color = [0, 255, 0];
pub const RED: Color = [255, 0, 0];
pub const CYAN: Color = [0, 255, 255];
pub const YELLOW: Color = [255, 255, 0];
pub const WHITE: Color = [255, 255, 255];

/// A line of text drawn at a fixed position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayText {
    pub text: String,
    /// Baseline origin in pixels (x, y)
    pub origin: (i32, i32),
    pub color: Color,
    /// Font scale relative to a 30 px glyph height
    pub scale: f32,
    /// Stroke thickness in pixels
    pub thickness: u32,
}

/// Text drawn over one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    lines: Vec<OverlayText>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line of text
    pub fn text(
        &mut self,
        text: impl Into<String>,
        origin: (i32, i32),
        color: Color,
        scale: f32,
        thickness: u32,
    ) -> &mut Self {
        self.lines.push(OverlayText {
            text: text.into(),
            origin,
            color,
            scale,
            thickness,
        });
        self
    }

    pub fn lines(&self) -> &[OverlayText] {
        &self.lines
    }

    /// Find a line by its exact text
    pub fn find(&self, text: &str) -> Option<&OverlayText> {
        self.lines.iter().find(|line| line.text == text)
    }
}

/// Renders overlays onto frames and polls for user input.
pub trait FrameDisplay {
    /// Draw `overlay` on `frame` and present it in the named window
    fn show(&mut self, window: &str, frame: &VideoFrame, overlay: &Overlay) -> Result<(), DmsError>;

    /// Per-iteration input poll: whether the user asked to quit
    fn quit_requested(&mut self) -> bool;
}

impl<V: FrameDisplay + ?Sized> FrameDisplay for Box<V> {
    fn show(&mut self, window: &str, frame: &VideoFrame, overlay: &Overlay) -> Result<(), DmsError> {
        (**self).show(window, frame, overlay)
    }

    fn quit_requested(&mut self) -> bool {
        (**self).quit_requested()
    }
}

impl<V: FrameDisplay + ?Sized> FrameDisplay for &mut V {
    fn show(&mut self, window: &str, frame: &VideoFrame, overlay: &Overlay) -> Result<(), DmsError> {
        (**self).show(window, frame, overlay)
    }

    fn quit_requested(&mut self) -> bool {
        (**self).quit_requested()
    }
}
