//! Image-sequence playback source

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// Plays back a directory of still images as a video stream.
///
/// Files are ordered by name. A file that fails to decode yields `None` for that
/// call (the caller retries on the next tick), it does not close the stream.
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    cursor: usize,
    loop_playback: bool,
    frame_interval: Option<Duration>,
    last_read: Option<Instant>,
    opened_at: Instant,
    sequence: u32,
    released: bool,
}

impl ImageSequenceSource {
    /// Open a frame directory
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let frames = list_frames(&config.frames_dir)?;
        if frames.is_empty() {
            return Err(CameraError::Empty(config.frames_dir.clone()));
        }

        info!(
            "Opened image sequence {} ({} frames, {} fps, loop={})",
            config.frames_dir.display(),
            frames.len(),
            config.fps,
            config.loop_playback
        );

        Ok(Self::from_paths(frames, config.fps, config.loop_playback))
    }

    /// Build a source from an explicit, already ordered list of files
    pub fn from_paths(frames: Vec<PathBuf>, fps: u32, loop_playback: bool) -> Self {
        let frame_interval = (fps > 0).then(|| Duration::from_micros(1_000_000 / fps as u64));
        Self {
            frames,
            cursor: 0,
            loop_playback,
            frame_interval,
            last_read: None,
            opened_at: Instant::now(),
            sequence: 0,
            released: false,
        }
    }

    /// Number of frames in the sequence
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the sequence holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn pace(&mut self) {
        if let (Some(interval), Some(last)) = (self.frame_interval, self.last_read) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_read = Some(Instant::now());
    }
}

impl FrameSource for ImageSequenceSource {
    fn read_frame(&mut self) -> Option<VideoFrame> {
        if !self.is_open() {
            return None;
        }
        if self.cursor >= self.frames.len() {
            // is_open guarantees loop playback here
            debug!("Image sequence wrapped around");
            self.cursor = 0;
        }

        self.pace();

        let path = &self.frames[self.cursor];
        self.cursor += 1;

        match image::open(path) {
            Ok(img) => {
                let timestamp_ns = self.opened_at.elapsed().as_nanos() as u64;
                let frame = VideoFrame::from_image(img.to_rgb8(), timestamp_ns, self.sequence);
                self.sequence = self.sequence.wrapping_add(1);
                Some(frame)
            }
            Err(e) => {
                warn!("Failed to decode frame {}: {}", path.display(), e);
                None
            }
        }
    }

    fn is_open(&self) -> bool {
        !self.released
            && !self.frames.is_empty()
            && (self.loop_playback || self.cursor < self.frames.len())
    }

    fn release(&mut self) {
        if !self.released {
            info!("Releasing image sequence after {} frames", self.sequence);
            self.released = true;
        }
    }
}

/// List frame files in a directory, sorted by file name
fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    if !dir.is_dir() {
        return Err(CameraError::Open(format!("{} is not a directory", dir.display())));
    }

    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_frame {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;
    use image::{Rgb, RgbImage};

    fn dir_config(frames_dir: impl Into<PathBuf>) -> CameraConfig {
        CameraConfig {
            source: SourceKind::Frames,
            frames_dir: frames_dir.into(),
            ..Default::default()
        }
    }

    fn write_frames(dir: &Path, count: u8) {
        for i in 0..count {
            let img = RgbImage::from_pixel(4, 3, Rgb([i, i, i]));
            img.save(dir.join(format!("frame_{:03}.png", i))).unwrap();
        }
    }

    #[test]
    fn test_plays_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let config = CameraConfig {
            fps: 0,
            ..dir_config(dir.path())
        };
        let mut source = ImageSequenceSource::open(&config).unwrap();
        assert_eq!(source.len(), 3);

        for expected in 0..3u8 {
            assert!(source.is_open());
            let frame = source.read_frame().unwrap();
            assert_eq!(frame.dimensions(), (4, 3));
            assert_eq!(frame.get_pixel(0, 0), Some([expected; 3]));
            assert_eq!(frame.sequence, expected as u32);
        }

        assert!(!source.is_open());
        assert!(source.read_frame().is_none());
    }

    #[test]
    fn test_loop_playback_wraps() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 2);

        let config = CameraConfig {
            fps: 0,
            loop_playback: true,
            ..dir_config(dir.path())
        };
        let mut source = ImageSequenceSource::open(&config).unwrap();

        let pixels: Vec<_> = (0..5)
            .map(|_| source.read_frame().unwrap().get_pixel(0, 0).unwrap()[0])
            .collect();
        assert_eq!(pixels, vec![0, 1, 0, 1, 0]);
        assert!(source.is_open());

        source.release();
        assert!(!source.is_open());
    }

    #[test]
    fn test_undecodable_frame_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 1);
        std::fs::write(dir.path().join("frame_999.png"), b"not a png").unwrap();

        let config = CameraConfig {
            fps: 0,
            ..dir_config(dir.path())
        };
        let mut source = ImageSequenceSource::open(&config).unwrap();

        assert!(source.read_frame().is_some());
        assert!(source.is_open());
        assert!(source.read_frame().is_none());
        assert!(!source.is_open());
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageSequenceSource::open(&dir_config(dir.path()));
        assert!(matches!(result, Err(CameraError::Empty(_))));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageSequenceSource::open(&dir_config(dir.path().join("nope")));
        assert!(matches!(result, Err(CameraError::Open(_))));
    }
}
