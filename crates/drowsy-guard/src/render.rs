//! Overlay rendering and frame output

use ab_glyph::{FontVec, PxScale};
use camera_capture::VideoFrame;
use dms::{DmsError, FrameDisplay, Overlay};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::input::QuitSignal;
use crate::settings::DisplayConfig;

/// Glyph height in pixels at overlay scale 1.0
const BASE_GLYPH_PX: f32 = 30.0;

/// Draws overlays onto frames and writes them out as PNG files.
///
/// Without a font each line is drawn as a solid bar in its color, sized to the
/// text. Without an output directory frames are only logged.
pub struct ImageDisplay {
    output_dir: Option<PathBuf>,
    font: Option<FontVec>,
    quit: QuitSignal,
    frames_written: u64,
}

impl ImageDisplay {
    pub fn new(config: &DisplayConfig, quit: QuitSignal) -> Result<Self, DmsError> {
        let font = config.font_path.as_deref().map(load_font).transpose()?;

        if let Some(dir) = &config.output_dir {
            std::fs::create_dir_all(dir)
                .map_err(|e| DmsError::Display(format!("{}: {}", dir.display(), e)))?;
            info!("Writing annotated frames to {}", dir.display());
        }

        Ok(Self {
            output_dir: config.output_dir.clone(),
            font,
            quit,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn draw(&self, image: &mut RgbImage, overlay: &Overlay) {
        for line in overlay.lines() {
            let color = Rgb(line.color);
            let glyph_px = BASE_GLYPH_PX * line.scale;
            let top = line.origin.1 - glyph_px.round() as i32;

            match &self.font {
                Some(font) => {
                    for (dx, dy) in stroke_offsets(line.thickness) {
                        draw_text_mut(
                            image,
                            color,
                            line.origin.0 + dx,
                            top + dy,
                            PxScale::from(glyph_px),
                            font,
                            &line.text,
                        );
                    }
                }
                None => {
                    let width = (line.text.chars().count() as f32 * glyph_px * 0.5).max(1.0) as u32;
                    let height = (glyph_px * 0.6).max(1.0) as u32;
                    let bar = Rect::at(line.origin.0, top + (glyph_px * 0.4) as i32).of_size(width, height);
                    draw_filled_rect_mut(image, bar, color);
                }
            }
        }
    }
}

impl FrameDisplay for ImageDisplay {
    fn show(&mut self, window: &str, frame: &VideoFrame, overlay: &Overlay) -> Result<(), DmsError> {
        let text: Vec<&str> = overlay.lines().iter().map(|l| l.text.as_str()).collect();
        debug!("[{}] frame {}: {}", window, frame.sequence, text.join(" | "));

        let Some(dir) = &self.output_dir else {
            return Ok(());
        };

        let mut image = frame
            .to_image()
            .ok_or_else(|| DmsError::ImageProcessing("Failed to create image buffer".into()))?;
        self.draw(&mut image, overlay);

        let path = dir.join(frame_file_name(window, self.frames_written));
        image
            .save(&path)
            .map_err(|e| DmsError::Display(format!("{}: {}", path.display(), e)))?;
        self.frames_written += 1;
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        self.quit.is_requested()
    }
}

/// Offsets that stamp a glyph into a square pen of roughly `thickness` pixels.
///
/// Thickness 1 and 2 draw once; the pen grows by one pixel in both axes for
/// every two thickness steps above that.
fn stroke_offsets(thickness: u32) -> Vec<(i32, i32)> {
    let pen = (thickness.max(1) as i32 + 1) / 2;
    (0..pen)
        .flat_map(|dy| (0..pen).map(move |dx| (dx, dy)))
        .collect()
}

fn load_font(path: &Path) -> Result<FontVec, DmsError> {
    let bytes = std::fs::read(path)
        .map_err(|e| DmsError::Display(format!("{}: {}", path.display(), e)))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| DmsError::Display(format!("{}: {}", path.display(), e)))
}

/// File name for the n-th written frame, e.g. `face_mesh_000042.png`
fn frame_file_name(window: &str, index: u64) -> String {
    let slug: String = window
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{:06}.png", slug, index)
}
